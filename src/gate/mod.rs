//! Session gate and per-user rate limiter.
//!
//! Every inbound text message passes through [`SessionGate::evaluate`], which
//! decides whether the sender is muted, still has to present a credential,
//! or may continue to keyword routing. All state lives in a [`SessionStore`]
//! keyed by Telegram user id.

mod credentials;
mod session;
mod store;

pub use credentials::{CredentialSet, ResolvedCredential, UNKNOWN_NAME, normalize_credential};
pub use session::{
    DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW_MS, Decision, GateSettings, Identity, MAX_RATE_WINDOW_MS,
    SessionGate,
};
pub use store::{AuthState, MemorySessionStore, SessionRecord, SessionStore, UserId};

//! External collaborators: the hosted assistant, spreadsheet webhooks and
//! the email store.

mod chatbase;
mod email_store;
mod sheets;

use thiserror::Error;

pub use chatbase::ChatbaseClient;
pub use email_store::EmailStore;
pub use sheets::{EmailRecord, InteractionLog, SheetLogger};

/// Errors raised while talking to external services or storage.
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{service} returned HTTP {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

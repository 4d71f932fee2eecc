//! Message routing for authenticated students.
//!
//! Provides language detection, the localized reply catalog and the
//! priority-ordered keyword rules that decide how a message is answered.

mod language;
pub mod messages;
mod rules;

pub use language::{Language, detect_language};
pub use messages::Template;
pub use rules::{Reply, Route, RouteContext, Router};

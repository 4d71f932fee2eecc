//! Telegram bot front end.
//!
//! Wires the session gate, command handler, router and integrations into a
//! teloxide dispatcher and handles every inbound message.

mod bot;
mod handlers;

pub use bot::{BotServices, StudentBot, TelegramError};
pub use handlers::schema;

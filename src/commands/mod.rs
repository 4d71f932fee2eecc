//! Command handling module.
//!
//! Processes `/start`, `/help`, `/language` and the language keyboard
//! buttons sent to the bot via Telegram messages.

mod handler;
mod types;

pub use handler::CommandHandler;
pub use types::{BotCommand, CommandResult};

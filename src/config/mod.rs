//! Configuration module for the student bot.
//!
//! Handles environment settings (Telegram, gate limits, external services)
//! and loading of the static JSON data the bot answers from.

mod data;
mod settings;

pub use data::{
    CERTIFICATES_FILE, DataBundle, DataError, DateEntry, DateTopic, FAQ_FILE, FaqData,
    ResourceLink, STUDENTS_FILE,
};
pub use settings::{
    BotSettings, ChatbaseConfig, ConfigError, DEFAULT_CHATBASE_URL, SheetsConfig, TelegramConfig,
};

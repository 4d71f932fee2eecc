//! Application settings read from the environment.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::gate::{DEFAULT_RATE_LIMIT, DEFAULT_RATE_WINDOW_MS, GateSettings, MAX_RATE_WINDOW_MS};

/// Default Chatbase API root.
pub const DEFAULT_CHATBASE_URL: &str = "https://www.chatbase.co";

/// Telegram bot configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from `@BotFather`.
    pub bot_token: String,

    /// Chat that receives login, email and file notifications.
    #[serde(default)]
    pub admin_chat_id: Option<i64>,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &"<redacted>")
            .field("admin_chat_id", &self.admin_chat_id)
            .finish()
    }
}

impl TelegramConfig {
    /// Creates configuration from environment variables.
    ///
    /// Expects `BOT_TOKEN`; `ADMIN_TELEGRAM_ID` is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is missing or the admin id is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(env_var)
    }

    /// Creates configuration from an arbitrary variable lookup.
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_token = get("BOT_TOKEN")
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingEnvVar("BOT_TOKEN"))?;

        let admin_chat_id = match get("ADMIN_TELEGRAM_ID") {
            Some(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber("ADMIN_TELEGRAM_ID"))?,
            ),
            _ => None,
        };

        Ok(Self {
            bot_token,
            admin_chat_id,
        })
    }
}

/// Gate and storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    /// Trailing window for rate accounting, in milliseconds.
    #[serde(default = "default_rate_window_ms")]
    pub rate_window_ms: u64,

    /// Messages allowed per window.
    #[serde(default = "default_rate_limit")]
    pub rate_limit: usize,

    /// Shared passcode. When set, the student directory is not used for login.
    #[serde(default)]
    pub access_passcode: Option<String>,

    /// Where captured emails are persisted.
    #[serde(default)]
    pub email_store_path: Option<PathBuf>,
}

const fn default_rate_window_ms() -> u64 {
    DEFAULT_RATE_WINDOW_MS
}

const fn default_rate_limit() -> usize {
    DEFAULT_RATE_LIMIT
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            rate_window_ms: default_rate_window_ms(),
            rate_limit: default_rate_limit(),
            access_passcode: None,
            email_store_path: None,
        }
    }
}

impl BotSettings {
    /// Creates bot settings from environment variables with defaults.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self::from_vars(env_var)
    }

    /// Creates bot settings from an arbitrary variable lookup.
    ///
    /// Unparseable numbers fall back to their defaults, as do windows longer
    /// than [`MAX_RATE_WINDOW_MS`].
    #[must_use]
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            rate_window_ms: get("RATE_WINDOW_MS")
                .and_then(|s| s.trim().parse::<u64>().ok())
                .filter(|ms| (1..=MAX_RATE_WINDOW_MS).contains(ms))
                .unwrap_or_else(default_rate_window_ms),
            rate_limit: get("RATE_LIMIT")
                .and_then(|s| s.trim().parse::<usize>().ok())
                .filter(|limit| *limit > 0)
                .unwrap_or_else(default_rate_limit),
            access_passcode: get("ACCESS_PASSCODE").filter(|code| !code.trim().is_empty()),
            email_store_path: get("EMAIL_STORE_PATH")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Returns the gate parameters.
    #[must_use]
    pub fn gate_settings(&self) -> GateSettings {
        GateSettings::from_millis(self.rate_window_ms, self.rate_limit)
    }

    /// Returns true when logins use a shared passcode.
    #[must_use]
    pub const fn uses_passcode(&self) -> bool {
        self.access_passcode.is_some()
    }
}

/// Chatbase (hosted chatbot) settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct ChatbaseConfig {
    /// API root, without the `/api/v1/chat` path.
    #[serde(default = "default_chatbase_url")]
    pub api_url: String,

    /// Chatbot identifier.
    pub bot_id: Option<String>,

    /// API key sent as a bearer token.
    pub api_key: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_chatbase_timeout")]
    pub timeout_secs: u64,
}

impl std::fmt::Debug for ChatbaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatbaseConfig")
            .field("api_url", &self.api_url)
            .field("bot_id", &self.bot_id)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_chatbase_url() -> String {
    DEFAULT_CHATBASE_URL.to_owned()
}

const fn default_chatbase_timeout() -> u64 {
    30
}

impl ChatbaseConfig {
    /// Creates Chatbase settings from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env_var)
    }

    /// Creates Chatbase settings from an arbitrary variable lookup.
    #[must_use]
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api_url: get("CHATBASE_API_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(default_chatbase_url),
            bot_id: get("CHATBASE_BOT_ID").filter(|id| !id.trim().is_empty()),
            api_key: get("CHATBASE_API_KEY").filter(|key| !key.trim().is_empty()),
            timeout_secs: get("CHATBASE_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or_else(default_chatbase_timeout),
        }
    }

    /// Returns true if both the bot id and the key are present.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.bot_id.is_some() && self.api_key.is_some()
    }
}

/// Spreadsheet webhook endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetsConfig {
    /// Receives `{telegramId, email}` when a student registers an email.
    pub email_url: Option<String>,

    /// Receives one record per forwarded question.
    pub log_url: Option<String>,
}

impl SheetsConfig {
    /// Creates webhook settings from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(env_var)
    }

    /// Creates webhook settings from an arbitrary variable lookup.
    #[must_use]
    pub fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            email_url: get("SHEET_URL").filter(|url| !url.trim().is_empty()),
            log_url: get("LOG_SHEET_URL").filter(|url| !url.trim().is_empty()),
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid value for {0} (must be an integer)")]
    InvalidNumber(&'static str),
}

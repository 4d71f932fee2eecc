//! Command types and definitions.

use std::fmt;

use crate::routing::Language;

/// Commands and keyboard buttons handled outside the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    /// Restart the session and ask for a student ID.
    Start,

    /// Show the help menu.
    Help,

    /// Show the language selection keyboard.
    Language,

    /// A language keyboard button was pressed.
    ChooseLanguage(Language),
}

impl BotCommand {
    /// Parses a command or language button from message text.
    ///
    /// Returns `None` if the message should go through the gate instead.
    /// Accepts the `/cmd@BotName` form Telegram uses in groups.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();

        if let Some(lang) = Language::from_button_label(text) {
            return Some(Self::ChooseLanguage(lang));
        }

        let after_slash = text.strip_prefix('/')?;
        let word = after_slash.split_whitespace().next()?;
        let name = word.split_once('@').map_or(word, |(name, _bot)| name);

        match name.to_lowercase().as_str() {
            "start" => Some(Self::Start),
            "help" => Some(Self::Help),
            "language" | "lang" | "langue" => Some(Self::Language),
            _ => None,
        }
    }

    /// Returns the command name as it appears in help.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Language => "language",
            Self::ChooseLanguage(_) => "choose_language",
        }
    }

    /// Returns the command description for the bot menu.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Start => "Restart the session",
            Self::Help => "Show the help menu",
            Self::Language => "Choose your language",
            Self::ChooseLanguage(_) => "Set the reply language",
        }
    }

    /// Commands listed in the Telegram command menu.
    #[must_use]
    pub const fn menu() -> [Self; 3] {
        [Self::Start, Self::Help, Self::Language]
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChooseLanguage(lang) => write!(f, "choose_language {lang}"),
            _ => write!(f, "/{}", self.name()),
        }
    }
}

/// Result of command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Response message to show the user.
    pub message: String,

    /// Whether `message` is HTML.
    pub html: bool,

    /// Whether to attach the language selection keyboard.
    pub language_keyboard: bool,
}

impl CommandResult {
    /// Creates a plain-text result.
    #[must_use]
    pub fn text(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            html: false,
            language_keyboard: false,
        }
    }

    /// Creates an HTML result.
    #[must_use]
    pub fn html(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            html: true,
            language_keyboard: false,
        }
    }

    /// Creates a result that shows the language keyboard.
    #[must_use]
    pub fn with_language_keyboard(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            html: false,
            language_keyboard: true,
        }
    }
}

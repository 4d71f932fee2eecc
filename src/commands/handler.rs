//! Command handler implementation.

use std::sync::Arc;

use tracing::{debug, info};

use super::types::{BotCommand, CommandResult};
use crate::gate::{SessionGate, UserId};
use crate::routing::{Template, messages};

/// Handles commands and language buttons.
///
/// Commands bypass the session gate: they neither count toward the rate
/// limit nor require authentication.
#[derive(Debug)]
pub struct CommandHandler {
    /// Shared session gate (holds language preferences).
    gate: Arc<SessionGate>,
}

impl CommandHandler {
    /// Creates a new command handler.
    #[must_use]
    pub const fn new(gate: Arc<SessionGate>) -> Self {
        Self { gate }
    }

    /// Tries to parse and execute a command from a message.
    ///
    /// Returns `None` if the message is not a command.
    pub fn try_handle(&self, user: UserId, message_text: &str) -> Option<CommandResult> {
        let command = BotCommand::parse(message_text)?;
        debug!("Handling command: {}", command);

        let result = self.execute(user, command);
        info!(user, command = command.name(), "Command handled");
        Some(result)
    }

    /// Executes a parsed command.
    ///
    /// Commands read the stored language but never fix it, so detection
    /// still runs on the first free-text message.
    fn execute(&self, user: UserId, command: BotCommand) -> CommandResult {
        let lang = self.gate.language_of(user).unwrap_or_default();

        match command {
            BotCommand::Start => CommandResult::text(Template::Welcome.text(lang)),
            BotCommand::Help => CommandResult::html(Template::Help.text(lang)),
            BotCommand::Language => {
                CommandResult::with_language_keyboard(Template::LanguagePrompt.text(lang))
            }
            BotCommand::ChooseLanguage(lang) => {
                self.gate.set_language(user, lang);
                CommandResult::text(messages::language_set(lang))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::{CredentialSet, Decision, GateSettings};
    use crate::routing::Language;

    fn handler() -> (CommandHandler, Arc<SessionGate>) {
        let gate = Arc::new(SessionGate::in_memory(
            CredentialSet::passcode("open"),
            GateSettings::default(),
        ));
        (CommandHandler::new(Arc::clone(&gate)), gate)
    }

    #[test]
    fn test_non_command_is_ignored() {
        let (handler, gate) = handler();
        assert!(handler.try_handle(1, "hello").is_none());
        assert_eq!(gate.known_users(), 0);
    }

    #[test]
    fn test_start_sends_welcome() {
        let (handler, _) = handler();
        let result = handler.try_handle(1, "/start").unwrap();
        assert_eq!(result.message, Template::Welcome.text(Language::En));
        assert!(!result.html);
    }

    #[test]
    fn test_help_is_html_in_user_language() {
        let (handler, gate) = handler();
        gate.set_language(1, Language::Ht);
        let result = handler.try_handle(1, "/help").unwrap();
        assert!(result.html);
        assert_eq!(result.message, Template::Help.text(Language::Ht));
    }

    #[test]
    fn test_start_does_not_fix_language() {
        let (handler, gate) = handler();
        handler.try_handle(3, "/start");
        assert_eq!(gate.language_of(3), None);
        assert_eq!(gate.language_for(3, "Bonjou, mwen bezwen èd"), Language::Ht);
    }

    #[test]
    fn test_language_command_shows_keyboard() {
        let (handler, _) = handler();
        let result = handler.try_handle(1, "/language").unwrap();
        assert!(result.language_keyboard);
    }

    #[test]
    fn test_language_button_sets_preference() {
        let (handler, gate) = handler();
        gate.set_language(5, Language::En);

        let result = handler.try_handle(5, "Français").unwrap();
        assert_eq!(result.message, messages::language_set(Language::Fr));
        assert_eq!(gate.language_of(5), Some(Language::Fr));
        assert_eq!(gate.language_for(5, "hello"), Language::Fr);
    }

    #[test]
    fn test_commands_do_not_count_toward_rate_limit() {
        let (handler, gate) = handler();
        for _ in 0..20 {
            handler.try_handle(9, "/help");
        }
        assert_eq!(
            gate.evaluate(9, "open", chrono::Utc::now()),
            Decision::AuthSucceeded {
                credential_id: "OPEN".to_owned(),
                display_name: crate::gate::UNKNOWN_NAME.to_owned(),
            }
        );
    }
}

//! Telegram bot wrapper: shared services, dispatcher setup and outbound helpers.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{
    BotCommand as MenuCommand, KeyboardButton, KeyboardMarkup, ParseMode,
};
use teloxide::utils::html;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::handlers;
use crate::commands::{BotCommand, CommandHandler, CommandResult};
use crate::config::TelegramConfig;
use crate::gate::{SessionGate, UserId};
use crate::integrations::{ChatbaseClient, EmailStore, SheetLogger};
use crate::routing::{Language, Reply, Router, Template};

/// Errors that can occur during Telegram operations.
#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),
}

/// Everything a message handler needs, shared across all updates.
pub struct BotServices {
    /// Session gate and rate limiter.
    pub gate: Arc<SessionGate>,

    /// Command and language-button handler.
    pub commands: CommandHandler,

    /// Keyword router for authenticated students.
    pub router: Router,

    /// Captured emails.
    pub emails: EmailStore,

    /// Hosted assistant; `None` answers every unmatched question with the fallback.
    pub chatbase: Option<ChatbaseClient>,

    /// Spreadsheet webhooks.
    pub sheets: SheetLogger,

    /// Chat receiving staff notifications.
    pub admin_chat: Option<ChatId>,

    /// Needed to build file download links.
    bot_token: String,
}

impl BotServices {
    /// Bundles the services for the dispatcher.
    #[must_use]
    pub fn new(
        config: &TelegramConfig,
        gate: Arc<SessionGate>,
        router: Router,
        emails: EmailStore,
        chatbase: Option<ChatbaseClient>,
        sheets: SheetLogger,
    ) -> Self {
        Self {
            commands: CommandHandler::new(Arc::clone(&gate)),
            gate,
            router,
            emails,
            chatbase,
            sheets,
            admin_chat: config.admin_chat_id.map(ChatId),
            bot_token: config.bot_token.clone(),
        }
    }

    /// Download link for a file path returned by `getFile`.
    #[must_use]
    pub fn file_url(&self, file_path: &str) -> String {
        format!(
            "https://api.telegram.org/file/bot{}/{}",
            self.bot_token,
            file_path.trim_start_matches('/')
        )
    }
}

impl std::fmt::Debug for BotServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotServices")
            .field("gate", &self.gate)
            .field("chatbase", &self.chatbase)
            .field("admin_chat", &self.admin_chat)
            .finish_non_exhaustive()
    }
}

/// High-level Telegram bot.
pub struct StudentBot {
    bot: Bot,
    services: Arc<BotServices>,
}

impl StudentBot {
    /// Creates the bot client.
    #[must_use]
    pub fn new(config: &TelegramConfig, services: BotServices) -> Self {
        Self {
            bot: Bot::new(config.bot_token.clone()),
            services: Arc::new(services),
        }
    }

    /// Publishes the command menu shown by Telegram clients.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    pub async fn register_commands(&self) -> Result<(), TelegramError> {
        let menu: Vec<MenuCommand> = BotCommand::menu()
            .iter()
            .map(|cmd| MenuCommand::new(cmd.name(), cmd.description()))
            .collect();

        self.bot.set_my_commands(menu).await?;
        debug!("Command menu registered");
        Ok(())
    }

    /// Runs the dispatcher until Ctrl+C.
    pub async fn run(self) {
        info!("Starting update dispatcher...");

        Dispatcher::builder(self.bot, handlers::schema())
            .dependencies(dptree::deps![self.services])
            .default_handler(|update| async move {
                debug!("Ignoring update {:?}", update.id);
            })
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        info!("Dispatcher stopped");
    }
}

impl std::fmt::Debug for StudentBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudentBot")
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}

/// Sends a reply, using HTML parse mode when the reply asks for it.
pub(crate) async fn send_reply(bot: &Bot, chat: ChatId, reply: &Reply) -> Result<(), TelegramError> {
    let mut request = bot.send_message(chat, reply.text.clone());
    if reply.html {
        request = request.parse_mode(ParseMode::Html);
    }
    request.await?;
    Ok(())
}

/// Sends a catalog template.
pub(crate) async fn send_template(
    bot: &Bot,
    chat: ChatId,
    template: Template,
    lang: Language,
) -> Result<(), TelegramError> {
    send_reply(bot, chat, &Reply::template(template, lang)).await
}

/// Sends a command result, attaching the language keyboard if requested.
pub(crate) async fn send_command_result(
    bot: &Bot,
    chat: ChatId,
    result: &CommandResult,
) -> Result<(), TelegramError> {
    let mut request = bot.send_message(chat, result.message.clone());
    if result.html {
        request = request.parse_mode(ParseMode::Html);
    }
    if result.language_keyboard {
        request = request.reply_markup(language_keyboard());
    }
    request.await?;
    Ok(())
}

/// Posts an HTML notice to the staff chat. Failures are only logged.
pub(crate) async fn notify_admin(bot: &Bot, services: &BotServices, notice: String) {
    let Some(chat) = services.admin_chat else {
        return;
    };

    if let Err(e) = bot
        .send_message(chat, notice)
        .parse_mode(ParseMode::Html)
        .await
    {
        warn!("Failed to notify admin: {}", e);
    }
}

/// One-row keyboard with the supported languages.
fn language_keyboard() -> KeyboardMarkup {
    let row: Vec<KeyboardButton> = Language::ALL
        .iter()
        .map(|lang| KeyboardButton::new(lang.button_label()))
        .collect();

    KeyboardMarkup::new(vec![row])
        .one_time_keyboard()
        .resize_keyboard()
}

/// Staff notice for a successful login.
pub(crate) fn login_notice(display_name: &str, id_label: &str) -> String {
    format!(
        "🟢 <b>Login approved</b>\n👤 {}\n🆔 {}",
        html::escape(display_name),
        html::escape(id_label)
    )
}

/// Staff notice for a newly registered email.
pub(crate) fn email_notice(user: UserId, email: &str) -> String {
    format!("📩 <b>New email</b>\nID: {user}\n📧 {}", html::escape(email))
}

/// Staff notice for an uploaded document.
pub(crate) fn file_notice(first_name: &str, user: UserId, url: &str) -> String {
    format!(
        "📄 <b>New file from {}</b>\nID: {user}\n📎 {}",
        html::escape(first_name),
        html::escape(url)
    )
}

/// Masks an email for logging (keeps the first character and the domain).
pub(crate) fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first: String = local.chars().take(1).collect();
            format!("{first}***@{domain}")
        }
        None => "***".to_owned(),
    }
}

/// Truncates a string for logging purposes.
pub(crate) fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_owned()
    } else {
        format!("{}...", s.chars().take(max_len).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChatbaseConfig, FaqData, SheetsConfig};
    use crate::gate::{CredentialSet, GateSettings};

    fn services() -> BotServices {
        let config = TelegramConfig {
            bot_token: "123:secret".to_owned(),
            admin_chat_id: Some(-100),
        };
        let gate = Arc::new(SessionGate::in_memory(
            CredentialSet::passcode("open"),
            GateSettings::default(),
        ));
        assert!(!ChatbaseConfig::from_vars(|_| None).is_configured());

        BotServices::new(
            &config,
            gate,
            Router::new(std::collections::HashMap::new(), FaqData::default()),
            EmailStore::in_memory(),
            None,
            SheetLogger::new(&SheetsConfig::default()).unwrap(),
        )
    }

    #[test]
    fn test_file_url() {
        let services = services();
        assert_eq!(
            services.file_url("documents/file_1.pdf"),
            "https://api.telegram.org/file/bot123:secret/documents/file_1.pdf"
        );
        assert_eq!(services.admin_chat, Some(ChatId(-100)));
    }

    #[test]
    fn test_debug_hides_token() {
        assert!(!format!("{:?}", services()).contains("secret"));
    }

    #[test]
    fn test_notices_escape_html() {
        assert_eq!(
            login_notice("<Marie>", "ASU-1"),
            "🟢 <b>Login approved</b>\n👤 &lt;Marie&gt;\n🆔 ASU-1"
        );
        assert!(email_notice(5, "a&b@c.org").contains("a&amp;b@c.org"));
        assert!(file_notice("Jo", 5, "https://x/y").contains("New file from Jo"));
    }

    #[test]
    fn test_mask_email() {
        assert_eq!(mask_email("marie@school.org"), "m***@school.org");
        assert_eq!(mask_email("nope"), "***");
    }

    #[test]
    fn test_truncate_for_log() {
        assert_eq!(truncate_for_log("Hello", 10), "Hello");
        assert_eq!(truncate_for_log("Hello, World!", 5), "Hello...");
    }
}

//! Update handlers: commands, the session gate, routing and forwarding.

use std::sync::Arc;

use chrono::{Local, Utc};
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::ChatAction;
use tracing::{debug, error, info, warn};

use super::bot::{
    BotServices, TelegramError, email_notice, file_notice, login_notice, mask_email,
    notify_admin, send_command_result, send_reply, send_template, truncate_for_log,
};
use crate::gate::{CredentialSet, Decision, Identity, UNKNOWN_NAME, UserId};
use crate::integrations::{EmailRecord, InteractionLog};
use crate::routing::{Language, Reply, Route, RouteContext, Template, messages};

type HandlerResult = Result<(), TelegramError>;

/// Builds the dispatcher tree: documents first, then text messages.
pub fn schema() -> UpdateHandler<TelegramError> {
    Update::filter_message()
        .branch(dptree::filter(|msg: Message| msg.document().is_some()).endpoint(handle_document))
        .branch(
            dptree::filter_map(|msg: Message| msg.text().map(ToOwned::to_owned))
                .endpoint(handle_text),
        )
}

async fn handle_text(
    bot: Bot,
    msg: Message,
    text: String,
    services: Arc<BotServices>,
) -> HandlerResult {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0;
    let chat = msg.chat.id;

    debug!(user = user_id, "Message: {}", truncate_for_log(&text, 50));

    if let Some(result) = services.commands.try_handle(user_id, &text) {
        return send_command_result(&bot, chat, &result).await;
    }

    let input = text.trim();
    let lang = services.gate.language_for(user_id, input);
    let decision = services.gate.evaluate(user_id, input, Utc::now());

    match gate_reply(decision, lang, services.gate.credentials(), user_id) {
        GateReply::Respond {
            replies,
            admin_notice,
        } => {
            if let Some(notice) = admin_notice {
                notify_admin(&bot, &services, notice).await;
            }
            for reply in &replies {
                send_reply(&bot, chat, reply).await?;
            }
            Ok(())
        }
        GateReply::Route => route_message(&bot, chat, user_id, input, lang, &services).await,
    }
}

/// What to send back for a gate decision.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GateReply {
    /// Send these replies in order, notifying staff first if a notice is set.
    Respond {
        replies: Vec<Reply>,
        admin_notice: Option<String>,
    },
    /// The message passed the gate and goes to the router.
    Route,
}

/// Maps a gate decision to the replies it produces.
fn gate_reply(
    decision: Decision,
    lang: Language,
    credentials: &CredentialSet,
    user: UserId,
) -> GateReply {
    let single = |template: Template| GateReply::Respond {
        replies: vec![Reply::template(template, lang)],
        admin_notice: None,
    };

    match decision {
        Decision::Muted { .. } => single(Template::Muted),
        Decision::RateLimited { .. } => single(Template::RateLimited),
        Decision::AuthFailed => single(Template::AuthFailed),
        Decision::AuthSucceeded {
            credential_id,
            display_name,
        } => {
            // Never show the shared passcode to staff.
            let id_label = match credentials {
                CredentialSet::Passcode(_) => user.to_string(),
                CredentialSet::StudentIds(_) => credential_id,
            };
            GateReply::Respond {
                replies: vec![
                    Reply::plain(messages::greeting(&display_name, lang)),
                    Reply::template(Template::AskEmail, lang),
                ],
                admin_notice: Some(login_notice(&display_name, &id_label)),
            }
        }
        Decision::Proceed => GateReply::Route,
    }
}

async fn route_message(
    bot: &Bot,
    chat: ChatId,
    user: UserId,
    input: &str,
    lang: Language,
    services: &BotServices,
) -> HandlerResult {
    let identity = services.gate.identity(user);

    match plan_route(services, user, input, lang, identity.as_ref()).await {
        Route::CaptureEmail(email) => {
            send_template(bot, chat, Template::EmailSaved, lang).await?;
            notify_admin(bot, services, email_notice(user, &email)).await;
            services.sheets.spawn_email(EmailRecord {
                telegram_id: user,
                email,
            });
            Ok(())
        }
        Route::Reply(reply) => send_reply(bot, chat, &reply).await,
        Route::Forward => forward_to_assistant(bot, chat, input, lang, identity, services).await,
    }
}

/// Routes a message that passed the gate, storing a first email on the way.
///
/// Returns [`Route::CaptureEmail`] only when the email was newly recorded. If
/// another message already registered one, the text is routed normally.
async fn plan_route(
    services: &BotServices,
    user: UserId,
    input: &str,
    lang: Language,
    identity: Option<&Identity>,
) -> Route {
    let ctx = RouteContext {
        language: lang,
        student_id: identity.map(|id| id.credential_id.as_str()),
        has_email: services.emails.contains(user).await,
    };

    let email = match services.router.route(input, &ctx) {
        Route::CaptureEmail(email) => email,
        route => return route,
    };

    match services.emails.record(user, &email).await {
        Ok(true) => info!(user, email = %mask_email(&email), "Email registered"),
        Ok(false) => {
            debug!(user, "Email already on file");
            let ctx = RouteContext {
                has_email: true,
                ..ctx
            };
            return services.router.route(input, &ctx);
        }
        Err(e) => warn!("Failed to persist email: {}", e),
    }
    Route::CaptureEmail(email)
}

async fn forward_to_assistant(
    bot: &Bot,
    chat: ChatId,
    input: &str,
    lang: Language,
    identity: Option<Identity>,
    services: &BotServices,
) -> HandlerResult {
    let Some(chatbase) = &services.chatbase else {
        return send_template(bot, chat, Template::Fallback, lang).await;
    };

    if let Err(e) = bot.send_chat_action(chat, ChatAction::Typing).await {
        debug!("Typing indicator failed: {}", e);
    }

    match chatbase.ask(input).await {
        Ok(answer) => {
            let text = answer
                .clone()
                .unwrap_or_else(|| Template::Fallback.text(lang).to_owned());
            send_reply(bot, chat, &Reply::plain(text)).await?;

            let (student_id, student_name) = identity.map_or_else(
                || (UNKNOWN_NAME.to_owned(), UNKNOWN_NAME.to_owned()),
                |id| (id.credential_id, id.display_name),
            );
            services.sheets.spawn_interaction(InteractionLog {
                student_id,
                student_name,
                user_message: input.to_owned(),
                bot_reply: answer,
                timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            });
            Ok(())
        }
        Err(e) => {
            error!("Chatbase error: {}", e);
            send_template(bot, chat, Template::TechnicalError, lang).await
        }
    }
}

async fn handle_document(bot: Bot, msg: Message, services: Arc<BotServices>) -> HandlerResult {
    let Some(document) = msg.document() else {
        return Ok(());
    };
    let chat = msg.chat.id;
    let (user_id, first_name) = msg
        .from
        .as_ref()
        .map_or((0, UNKNOWN_NAME), |u| (u.id.0, u.first_name.as_str()));
    let lang = services.gate.language_of(user_id).unwrap_or_default();

    match bot.get_file(document.file.id.clone()).await {
        Ok(file) => {
            let url = services.file_url(&file.path);
            info!(user = user_id, "Document received");
            notify_admin(&bot, &services, file_notice(first_name, user_id, &url)).await;
            send_template(&bot, chat, Template::FileReceived, lang).await
        }
        Err(e) => {
            error!("File link error: {}", e);
            send_template(&bot, chat, Template::FileFailed, lang).await
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::config::{FaqData, SheetsConfig, TelegramConfig};
    use crate::gate::{GateSettings, SessionGate};
    use crate::integrations::{EmailStore, SheetLogger};
    use crate::routing::Router;

    const USER: UserId = 4242;

    fn services() -> BotServices {
        let config = TelegramConfig {
            bot_token: "1:token".to_owned(),
            admin_chat_id: None,
        };
        let gate = Arc::new(SessionGate::in_memory(
            CredentialSet::passcode("open"),
            GateSettings::default(),
        ));
        BotServices::new(
            &config,
            gate,
            Router::new(HashMap::new(), FaqData::default()),
            EmailStore::in_memory(),
            None,
            SheetLogger::new(&SheetsConfig::default()).unwrap(),
        )
    }

    fn students() -> CredentialSet {
        CredentialSet::student_ids([("ASU-1".to_owned(), "Marie".to_owned())])
    }

    fn single(template: Template, lang: Language) -> GateReply {
        GateReply::Respond {
            replies: vec![Reply::template(template, lang)],
            admin_notice: None,
        }
    }

    #[test]
    fn test_gate_reply_for_refusals() {
        let until = Utc::now();
        let creds = students();

        assert_eq!(
            gate_reply(Decision::Muted { until }, Language::Fr, &creds, USER),
            single(Template::Muted, Language::Fr)
        );
        assert_eq!(
            gate_reply(Decision::RateLimited { until }, Language::Ht, &creds, USER),
            single(Template::RateLimited, Language::Ht)
        );
        assert_eq!(
            gate_reply(Decision::AuthFailed, Language::En, &creds, USER),
            single(Template::AuthFailed, Language::En)
        );
    }

    #[test]
    fn test_gate_reply_proceed_goes_to_router() {
        assert_eq!(
            gate_reply(Decision::Proceed, Language::En, &students(), USER),
            GateReply::Route
        );
    }

    #[test]
    fn test_login_with_student_id_greets_and_asks_for_email() {
        let decision = Decision::AuthSucceeded {
            credential_id: "ASU-1".to_owned(),
            display_name: "Marie".to_owned(),
        };
        assert_eq!(
            gate_reply(decision, Language::En, &students(), USER),
            GateReply::Respond {
                replies: vec![
                    Reply::plain(messages::greeting("Marie", Language::En)),
                    Reply::template(Template::AskEmail, Language::En),
                ],
                admin_notice: Some(login_notice("Marie", "ASU-1")),
            }
        );
    }

    #[test]
    fn test_passcode_login_notice_shows_telegram_id() {
        let decision = Decision::AuthSucceeded {
            credential_id: "OPEN".to_owned(),
            display_name: UNKNOWN_NAME.to_owned(),
        };
        let GateReply::Respond { admin_notice, .. } =
            gate_reply(decision, Language::En, &CredentialSet::passcode("open"), USER)
        else {
            panic!("expected a reply");
        };

        let notice = admin_notice.unwrap();
        assert!(notice.contains("4242"));
        assert!(!notice.contains("OPEN"));
    }

    #[tokio::test]
    async fn test_first_email_is_captured() {
        let services = services();
        let route = plan_route(&services, USER, "me@school.org", Language::En, None).await;

        assert_eq!(route, Route::CaptureEmail("me@school.org".to_owned()));
        assert!(services.emails.contains(USER).await);
    }

    #[tokio::test]
    async fn test_email_already_on_file_routes_normally() {
        let services = services();
        assert!(services.emails.record(USER, "first@school.org").await.unwrap());

        let route = plan_route(&services, USER, "second@school.org", Language::En, None).await;
        assert_eq!(route, Route::Forward);
        assert_eq!(services.emails.get(USER).await.as_deref(), Some("first@school.org"));
    }
}

//! Client for the hosted Chatbase assistant.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::IntegrationError;
use crate::config::ChatbaseConfig;

const CHAT_PATH: &str = "/api/v1/chat";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    chatbot_id: &'a str,
    stream: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    messages: Vec<ResponseMessage>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    /// First message content, else the top-level `text`. Blank replies count as none.
    fn into_reply(self) -> Option<String> {
        self.messages
            .into_iter()
            .next()
            .and_then(|m| m.content)
            .or(self.text)
            .filter(|reply| !reply.trim().is_empty())
    }
}

/// Forwards unmatched questions to Chatbase.
#[derive(Clone)]
pub struct ChatbaseClient {
    http: reqwest::Client,
    endpoint: String,
    bot_id: String,
    api_key: String,
}

impl std::fmt::Debug for ChatbaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatbaseClient")
            .field("endpoint", &self.endpoint)
            .field("bot_id", &self.bot_id)
            .finish_non_exhaustive()
    }
}

impl ChatbaseClient {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrationError::NotConfigured`] if the bot id or key is
    /// missing, or an HTTP error if the client cannot be built.
    pub fn from_config(config: &ChatbaseConfig) -> Result<Self, IntegrationError> {
        let bot_id = config
            .bot_id
            .clone()
            .ok_or(IntegrationError::NotConfigured("CHATBASE_BOT_ID"))?;
        let api_key = config
            .api_key
            .clone()
            .ok_or(IntegrationError::NotConfigured("CHATBASE_API_KEY"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            http,
            endpoint: chat_endpoint(&config.api_url),
            bot_id,
            api_key,
        })
    }

    /// Sends a single user message and returns the assistant's reply.
    ///
    /// `Ok(None)` means the assistant answered with nothing usable.
    pub async fn ask(&self, question: &str) -> Result<Option<String>, IntegrationError> {
        let request = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: question,
            }],
            chatbot_id: &self.bot_id,
            stream: false,
        };

        debug!("Forwarding question to Chatbase ({} chars)", question.chars().count());

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntegrationError::Status {
                service: "chatbase",
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        Ok(parsed.into_reply())
    }
}

fn chat_endpoint(api_url: &str) -> String {
    format!("{}{CHAT_PATH}", api_url.trim_end_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Option<String> {
        serde_json::from_str::<ChatResponse>(json).unwrap().into_reply()
    }

    #[test]
    fn test_request_shape() {
        let request = ChatRequest {
            messages: vec![ChatMessage {
                role: "user",
                content: "When do classes start?",
            }],
            chatbot_id: "bot-123",
            stream: false,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "messages": [{"role": "user", "content": "When do classes start?"}],
                "chatbotId": "bot-123",
                "stream": false
            })
        );
    }

    #[test]
    fn test_reply_prefers_first_message() {
        assert_eq!(
            parse(r#"{"messages": [{"content": "First"}, {"content": "Second"}], "text": "T"}"#),
            Some("First".to_owned())
        );
    }

    #[test]
    fn test_reply_falls_back_to_text() {
        assert_eq!(parse(r#"{"text": "Classes start Monday."}"#), Some("Classes start Monday.".to_owned()));
        assert_eq!(parse(r#"{"messages": [{}], "text": "T"}"#), Some("T".to_owned()));
    }

    #[test]
    fn test_empty_reply_is_none() {
        assert_eq!(parse("{}"), None);
        assert_eq!(parse(r#"{"text": "   "}"#), None);
    }

    #[test]
    fn test_endpoint_join() {
        assert_eq!(chat_endpoint("https://www.chatbase.co/"), "https://www.chatbase.co/api/v1/chat");
        assert_eq!(chat_endpoint("http://localhost:9000"), "http://localhost:9000/api/v1/chat");
    }

    #[test]
    fn test_requires_credentials() {
        let config = ChatbaseConfig::from_vars(|_| None);
        assert!(matches!(
            ChatbaseClient::from_config(&config),
            Err(IntegrationError::NotConfigured("CHATBASE_BOT_ID"))
        ));
    }
}

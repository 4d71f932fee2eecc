//! Spreadsheet webhook logging.
//!
//! Posts are fire-and-forget: failures are logged and never reach the user.

use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::IntegrationError;
use crate::config::SheetsConfig;
use crate::gate::UserId;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(15);

/// One forwarded question and the assistant's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionLog {
    #[serde(rename = "studentID")]
    pub student_id: String,
    pub student_name: String,
    pub user_message: String,
    pub bot_reply: Option<String>,
    pub timestamp: String,
}

/// Email registration record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    pub telegram_id: UserId,
    pub email: String,
}

/// Posts JSON records to the configured spreadsheet webhooks.
#[derive(Debug, Clone)]
pub struct SheetLogger {
    http: reqwest::Client,
    email_url: Option<String>,
    log_url: Option<String>,
}

impl SheetLogger {
    /// Creates a logger. Endpoints left unset are skipped silently.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &SheetsConfig) -> Result<Self, IntegrationError> {
        let http = reqwest::Client::builder().timeout(WEBHOOK_TIMEOUT).build()?;
        Ok(Self {
            http,
            email_url: config.email_url.clone(),
            log_url: config.log_url.clone(),
        })
    }

    /// Posts an interaction record and waits for the result.
    pub async fn post_interaction(&self, log: &InteractionLog) -> Result<(), IntegrationError> {
        match &self.log_url {
            Some(url) => self.post(url, log).await,
            None => Ok(()),
        }
    }

    /// Posts an email record and waits for the result.
    pub async fn post_email(&self, record: &EmailRecord) -> Result<(), IntegrationError> {
        match &self.email_url {
            Some(url) => self.post(url, record).await,
            None => Ok(()),
        }
    }

    /// Logs an interaction in the background.
    pub fn spawn_interaction(&self, log: InteractionLog) -> Option<JoinHandle<()>> {
        if self.log_url.is_none() {
            debug!("LOG_SHEET_URL not set, skipping interaction log");
            return None;
        }
        let logger = self.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = logger.post_interaction(&log).await {
                warn!("Log error: {}", e);
            }
        }))
    }

    /// Records an email in the background.
    pub fn spawn_email(&self, record: EmailRecord) -> Option<JoinHandle<()>> {
        if self.email_url.is_none() {
            debug!("SHEET_URL not set, skipping email record");
            return None;
        }
        let logger = self.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = logger.post_email(&record).await {
                warn!("Sheet error: {}", e);
            }
        }))
    }

    async fn post<T: Serialize + Sync>(&self, url: &str, body: &T) -> Result<(), IntegrationError> {
        let response = self.http.post(url).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(IntegrationError::Status {
                service: "sheet",
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            })
        }
    }
}

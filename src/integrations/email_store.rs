//! Captured student emails, optionally persisted to a JSON file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::RwLock;
use tracing::debug;

use super::IntegrationError;
use crate::gate::UserId;

/// Emails keyed by Telegram user id.
#[derive(Debug, Default)]
pub struct EmailStore {
    path: Option<PathBuf>,
    emails: RwLock<BTreeMap<UserId, String>>,
}

impl EmailStore {
    /// Creates a store that lives only in memory.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a file-backed store. A missing file starts empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IntegrationError> {
        let path = path.as_ref().to_path_buf();
        let emails = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No email store at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: Some(path),
            emails: RwLock::new(emails),
        })
    }

    /// Returns true if the user already registered an email.
    pub async fn contains(&self, user: UserId) -> bool {
        self.emails.read().await.contains_key(&user)
    }

    /// Returns the user's email.
    #[cfg(test)]
    pub(crate) async fn get(&self, user: UserId) -> Option<String> {
        self.emails.read().await.get(&user).cloned()
    }

    /// Number of stored emails.
    pub async fn len(&self) -> usize {
        self.emails.read().await.len()
    }

    /// Returns true if no email has been stored.
    pub async fn is_empty(&self) -> bool {
        self.emails.read().await.is_empty()
    }

    /// Stores the user's first email. Later emails are ignored.
    ///
    /// Returns `false` if the user already had one. The in-memory record is
    /// kept even when writing the file fails.
    pub async fn record(&self, user: UserId, email: &str) -> Result<bool, IntegrationError> {
        let mut emails = self.emails.write().await;
        if emails.contains_key(&user) {
            return Ok(false);
        }
        emails.insert(user, email.trim().to_owned());

        if let Some(path) = &self.path {
            let json = serde_json::to_string_pretty(&*emails)?;
            tokio::fs::write(path, json).await?;
        }
        Ok(true)
    }
}

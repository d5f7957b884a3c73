//! Contact-form intake.
//!
//! Accepted submissions are appended as JSON lines under the data directory;
//! there is no further processing, the sales team reads the file.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactMessage {
    /// First field failing validation, if any, named for the error message.
    pub fn first_invalid_field(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("name");
        }
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Some("email");
        }
        if self.subject.trim().is_empty() {
            return Some("subject");
        }
        if self.message.trim().is_empty() {
            return Some("message");
        }
        None
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredContactMessage {
    received_at: DateTime<Utc>,
    #[serde(flatten)]
    message: ContactMessage,
}

#[derive(Debug, Clone)]
pub struct ContactInbox {
    path: PathBuf,
}

impl ContactInbox {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    #[tracing::instrument(level = "info", skip_all)]
    pub async fn record(&self, message: &ContactMessage) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| anyhow::anyhow!("create data dir {}: {e}", parent.display()))?;
        }

        let stored = StoredContactMessage {
            received_at: Utc::now(),
            message: message.clone(),
        };
        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| anyhow::anyhow!("open contact inbox {}: {e}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| anyhow::anyhow!("append contact inbox {}: {e}", self.path.display()))?;

        tracing::info!(sender = %message.email, "contact message recorded");
        Ok(())
    }
}

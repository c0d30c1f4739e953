//! Notification sink boundary and message formatting.
//!
//! Notifications are best-effort: a failed webhook POST never unwinds
//! transfer bookkeeping. The orchestrator logs the failure and moves on.

use async_trait::async_trait;

use crate::error::{Result, SyncError};

/// External sink for human-readable transfer notifications
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Slack-style incoming webhook: POSTs `{"text": "<message>"}` as JSON
pub struct SlackWebhook {
    url: String,
    client: reqwest::Client,
}

impl SlackWebhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl NotificationSink for SlackWebhook {
    async fn notify(&self, message: &str) -> Result<()> {
        let payload = serde_json::json!({ "text": message });
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SyncError::Notification(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SyncError::Notification(format!(
                "webhook returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Message for one successfully transferred file
pub fn single_file_message(name: &str, size: u64) -> String {
    format!("Transferred {name} ({size} bytes)")
}

/// Message for a delivered zip bundle, listing every member with its size
pub fn batch_message(zip_name: &str, members: &[(String, u64)]) -> String {
    let mut message = format!("Transferred {zip_name}\nContains:");
    for (name, size) in members {
        message.push_str(&format!("\n  - {name} ({size} bytes)"));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file_message_format() {
        assert_eq!(
            single_file_message("report.csv", 1024),
            "Transferred report.csv (1024 bytes)"
        );
    }

    #[test]
    fn batch_message_lists_members_with_sizes() {
        let members = vec![("a.csv".to_string(), 10), ("b.csv".to_string(), 20)];
        let message = batch_message("myrun-2024-01-01.zip", &members);

        assert!(message.starts_with("Transferred myrun-2024-01-01.zip"));
        assert_eq!(
            message,
            "Transferred myrun-2024-01-01.zip\nContains:\n  - a.csv (10 bytes)\n  - b.csv (20 bytes)"
        );
    }
}

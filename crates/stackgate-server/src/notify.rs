//! Notification delivery backends.
//!
//! Delivery is fire-and-forget from the engine's point of view; both
//! backends bound their own latency so a slow receiver can never hold up
//! the scan response.

use std::time::Duration;

use serde_json::json;
use stackgate_core::notify::{Notification, Notifier};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("webhook delivery failed: {0}")]
  Http(#[from] reqwest::Error),
}

/// POSTs each alert as JSON to a configured webhook URL. The receiving end
/// (typically a mail relay) owns the actual email delivery.
pub struct WebhookNotifier {
  client: reqwest::Client,
  url:    String,
}

impl WebhookNotifier {
  pub fn new(url: String, timeout: Duration) -> Result<Self, NotifyError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self { client, url })
  }
}

/// The notifier selected by configuration. With no `notify_url` configured,
/// alerts are logged and dropped.
pub enum ScanNotifier {
  Webhook(WebhookNotifier),
  Log,
}

impl Notifier for ScanNotifier {
  type Error = NotifyError;

  async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
    match self {
      ScanNotifier::Webhook(webhook) => {
        webhook
          .client
          .post(&webhook.url)
          .json(&json!({
            "to_name":  notification.to_name,
            "to_email": notification.to_email,
            "subject":  notification.subject_line,
            "body":     notification.body,
          }))
          .send()
          .await?
          .error_for_status()?;
        Ok(())
      }
      ScanNotifier::Log => {
        tracing::info!(
          to = %notification.to_email,
          subject = %notification.subject_line,
          "alert delivery disabled; logging instead"
        );
        Ok(())
      }
    }
  }
}

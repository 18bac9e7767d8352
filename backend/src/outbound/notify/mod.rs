//! Brevo transactional mail adapter.

use async_trait::async_trait;
use serde_json::json;

use crate::domain::ports::{MailMessage, Notifier, NotifyError};

/// Brevo-backed implementation of the `Notifier` port.
pub struct BrevoNotifier {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    sender_name: String,
    sender_email: String,
}

impl BrevoNotifier {
    /// Build a client against the production endpoint.
    pub fn new(
        http: reqwest::Client,
        api_key: String,
        sender_name: String,
        sender_email: String,
    ) -> Self {
        Self::with_base_url(
            http,
            "https://api.brevo.com".to_owned(),
            api_key,
            sender_name,
            sender_email,
        )
    }

    /// Build a client against a custom endpoint (used in tests).
    pub fn with_base_url(
        http: reqwest::Client,
        base_url: String,
        api_key: String,
        sender_name: String,
        sender_email: String,
    ) -> Self {
        Self {
            http,
            base_url,
            api_key,
            sender_name,
            sender_email,
        }
    }
}

#[async_trait]
impl Notifier for BrevoNotifier {
    async fn send(&self, message: &MailMessage) -> Result<(), NotifyError> {
        let response = self
            .http
            .post(format!("{}/v3/smtp/email", self.base_url))
            .header("api-key", &self.api_key)
            .json(&json!({
                "sender": { "name": self.sender_name, "email": self.sender_email },
                "to": [{ "email": message.to }],
                "subject": message.subject,
                "htmlContent": message.html_body,
            }))
            .send()
            .await
            .map_err(|err| NotifyError::send(err.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::send(format!(
                "mail service returned {status}: {body}"
            )));
        }
        Ok(())
    }
}

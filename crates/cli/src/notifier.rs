//! Verifier notifications through a WhatsApp gateway webhook.
//!
//! Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking` so a slow
//! gateway never blocks the runtime.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use monalisa_storage::{Notifier, NotifyError, VerifierNotification};

use crate::config::NotifierSettings;

/// JSON body posted to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebhookMessage {
    pub phone: String,
    pub message: String,
    pub litmas_id: i64,
}

impl WebhookMessage {
    pub fn for_notification(notification: &VerifierNotification) -> Result<Self, NotifyError> {
        let phone = notification
            .anev_no_hp
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| NotifyError::NoRecipient(notification.anev_id.clone()))?;
        Ok(WebhookMessage {
            phone: phone.to_string(),
            message: notification.message(),
            litmas_id: notification.litmas_id,
        })
    }
}

pub struct WebhookNotifier {
    url: Option<String>,
    auth_token: Option<String>,
    timeout: Duration,
}

impl WebhookNotifier {
    pub fn new(settings: &NotifierSettings) -> Self {
        WebhookNotifier {
            url: settings.webhook_url.clone().filter(|u| !u.trim().is_empty()),
            auth_token: settings.auth_token.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &VerifierNotification) -> Result<(), NotifyError> {
        let url = self.url.clone().ok_or(NotifyError::NotConfigured)?;
        let body = WebhookMessage::for_notification(notification)?;
        let auth_token = self.auth_token.clone();
        let timeout = self.timeout;

        tokio::task::spawn_blocking(move || {
            let agent: ureq::Agent = ureq::Agent::config_builder()
                .timeout_global(Some(timeout))
                .build()
                .into();
            let mut request = agent.post(&url);
            if let Some(ref token) = auth_token {
                request = request.header("Authorization", &format!("Bearer {}", token));
            }
            request
                .send_json(&body)
                .map(|_| ())
                .map_err(|e| NotifyError::Failed(e.to_string()))
        })
        .await
        .map_err(|e| NotifyError::Failed(format!("task join error: {}", e)))?
    }
}

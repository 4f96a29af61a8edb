//! Mail API notifier (Resend-compatible `POST /emails`).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use authgate_core::domain::{PasswordChangeNotice, mask_email};
use authgate_core::ports::{NotifyError, PasswordChangeNotifier};

use super::template::{NoticeTemplate, SUBJECT};

const DEFAULT_API_URL: &str = "https://api.resend.com/emails";

/// Mail API configuration.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
    pub reply_to: Option<String>,
    pub cc: Vec<String>,
    pub timeout: Duration,
}

impl MailConfig {
    /// Load from `NOTIFY_*` variables. Returns `None` without an API key.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("NOTIFY_API_KEY").ok()?;

        Some(Self {
            api_url: std::env::var("NOTIFY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_key,
            from: std::env::var("NOTIFY_FROM")
                .unwrap_or_else(|_| "Security <no-reply@example.com>".to_string()),
            reply_to: std::env::var("NOTIFY_REPLY_TO").ok(),
            cc: std::env::var("NOTIFY_CC")
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            timeout: Duration::from_secs(10),
        })
    }
}

#[derive(Debug, Serialize)]
struct OutgoingEmail<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    cc: Vec<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to: Option<&'a str>,
    subject: &'a str,
    html: String,
}

/// Sends the notice through a transactional mail API.
pub struct MailApiNotifier {
    client: Client,
    config: MailConfig,
    template: NoticeTemplate,
}

impl MailApiNotifier {
    pub fn new(config: MailConfig) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            config,
            template: NoticeTemplate::new()?,
        })
    }

    fn build_email<'a>(
        &'a self,
        notice: &'a PasswordChangeNotice,
    ) -> Result<OutgoingEmail<'a>, NotifyError> {
        Ok(OutgoingEmail {
            from: &self.config.from,
            to: vec![notice.email.as_str()],
            cc: self.config.cc.iter().map(String::as_str).collect(),
            reply_to: self.config.reply_to.as_deref(),
            subject: SUBJECT,
            html: self.template.render(notice)?,
        })
    }
}

#[async_trait]
impl PasswordChangeNotifier for MailApiNotifier {
    async fn notify(&self, notice: &PasswordChangeNotice) -> Result<(), NotifyError> {
        let email = self.build_email(notice)?;

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&email)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected(format!("{status}: {body}")));
        }

        tracing::info!(
            email = %mask_email(&notice.email),
            "Password change notification sent"
        );
        Ok(())
    }
}

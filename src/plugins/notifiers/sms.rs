use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::SmsConfig;
use crate::plugins::traits::{AvailabilityEvent, NotificationResult, NotifierPlugin};
use crate::utils::error::{AppError, Result};

const DEFAULT_API_BASE: &str = "https://api.twilio.com";

/// Sends alert texts through the Twilio Messages API: a basic-auth form
/// POST per message, answered with a JSON resource whose `sid` we keep
/// as the message id.
#[derive(Debug)]
pub struct SmsNotifier {
    client: Client,
    api_base: String,
    account_sid: String,
    auth_token: String,
    from_number: String,
    to_number: String,
    burst_delay: Duration,
}

impl SmsNotifier {
    pub fn from_config(config: &SmsConfig) -> Result<Self> {
        let missing = || AppError::Notification {
            channel: "sms".to_string(),
            message: "Twilio credentials not fully configured".to_string(),
        };

        Ok(Self {
            client: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            account_sid: config.account_sid.clone().ok_or_else(missing)?,
            auth_token: config.auth_token.clone().ok_or_else(missing)?,
            from_number: config.from_number.clone().ok_or_else(missing)?,
            to_number: config.to_number.clone().ok_or_else(missing)?,
            burst_delay: Duration::from_millis(config.burst_delay_ms),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.account_sid
        )
    }

    fn account_url(&self) -> String {
        format!("{}/2010-04-01/Accounts/{}.json", self.api_base, self.account_sid)
    }
}

#[async_trait]
impl NotifierPlugin for SmsNotifier {
    fn name(&self) -> &str {
        "Twilio SMS Notifier"
    }

    fn channel(&self) -> &str {
        "sms"
    }

    fn burst_delay(&self) -> Duration {
        self.burst_delay
    }

    async fn notify(&self, event: &AvailabilityEvent) -> Result<NotificationResult> {
        let params = [
            ("To", self.to_number.as_str()),
            ("From", self.from_number.as_str()),
            ("Body", &event.message()),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(NotificationResult::failed(format!("status {}", status)));
        }

        // The message sid is informational; a malformed body is still a
        // delivered message
        let message_id = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("sid").and_then(|v| v.as_str()).map(String::from));

        Ok(NotificationResult::delivered(message_id))
    }

    async fn test_connection(&self) -> Result<bool> {
        let response = self
            .client
            .get(self.account_url())
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}

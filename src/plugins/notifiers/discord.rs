use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::config::DiscordConfig;
use crate::plugins::traits::{AvailabilityEvent, NotificationResult, NotifierPlugin};
use crate::utils::error::{AppError, Result};

/// Sends plain-content webhook messages. Discord answers a bare webhook
/// POST with 204 No Content on success.
#[derive(Debug)]
pub struct DiscordNotifier {
    client: Client,
    webhook_url: String,
    username: String,
    burst_delay: Duration,
}

impl DiscordNotifier {
    pub fn from_config(config: &DiscordConfig) -> Result<Self> {
        let webhook_url = config.webhook_url.clone().ok_or_else(|| AppError::Notification {
            channel: "discord".to_string(),
            message: "webhook_url not configured".to_string(),
        })?;

        Ok(Self {
            client: Client::new(),
            webhook_url,
            username: config.username.clone(),
            burst_delay: Duration::from_millis(config.burst_delay_ms),
        })
    }

    fn payload(&self, content: &str) -> serde_json::Value {
        json!({
            "content": content,
            "username": self.username,
        })
    }

    async fn post(&self, payload: &serde_json::Value) -> Result<NotificationResult> {
        let response = self.client.post(&self.webhook_url).json(payload).send().await?;

        let status = response.status();
        if status.is_success() {
            Ok(NotificationResult::delivered(None))
        } else {
            Ok(NotificationResult::failed(format!("status {}", status)))
        }
    }
}

#[async_trait]
impl NotifierPlugin for DiscordNotifier {
    fn name(&self) -> &str {
        "Discord Notifier"
    }

    fn channel(&self) -> &str {
        "discord"
    }

    fn burst_delay(&self) -> Duration {
        self.burst_delay
    }

    async fn notify(&self, event: &AvailabilityEvent) -> Result<NotificationResult> {
        self.post(&self.payload(&event.message())).await
    }

    async fn test_connection(&self) -> Result<bool> {
        let result = self
            .post(&self.payload("🧪 Restock Watcher connection test"))
            .await?;
        Ok(result.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_event() -> AvailabilityEvent {
        AvailabilityEvent::new(
            "Canvas Tote",
            "https://shop.example.com/products/canvas-tote",
            Utc::now(),
        )
    }

    fn notifier_for(server: &MockServer) -> DiscordNotifier {
        DiscordNotifier {
            client: Client::new(),
            webhook_url: format!("{}/api/webhooks/123/token", server.uri()),
            username: "Restock Watcher".to_string(),
            burst_delay: Duration::from_millis(0),
        }
    }

    #[test]
    fn test_from_config_requires_webhook() {
        let config = DiscordConfig {
            webhook_url: None,
            username: "Restock Watcher".to_string(),
            burst_delay_ms: 500,
        };

        let result = DiscordNotifier::from_config(&config);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("webhook_url not configured"));
    }

    #[test]
    fn test_metadata_and_payload() {
        let config = DiscordConfig {
            webhook_url: Some("https://discord.com/api/webhooks/123/token".to_string()),
            username: "Price Bot".to_string(),
            burst_delay_ms: 500,
        };
        let notifier = DiscordNotifier::from_config(&config).unwrap();

        assert_eq!(notifier.channel(), "discord");
        assert_eq!(notifier.burst_delay(), Duration::from_millis(500));

        let payload = notifier.payload("hello");
        assert_eq!(payload["content"].as_str().unwrap(), "hello");
        assert_eq!(payload["username"].as_str().unwrap(), "Price Bot");
    }

    #[tokio::test]
    async fn test_notify_posts_alert_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/webhooks/123/token"))
            .and(body_partial_json(json!({"username": "Restock Watcher"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let result = notifier_for(&server).notify(&test_event()).await.unwrap();
        assert!(result.success);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_notify_reports_webhook_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = notifier_for(&server).notify(&test_event()).await.unwrap();
        assert!(!result.success);
        assert!(result.error.unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_connection_sends_test_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(
                json!({"content": "🧪 Restock Watcher connection test"}),
            ))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        assert!(notifier_for(&server).test_connection().await.unwrap());
    }
}

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::error::Result;

/// Boundary value handed to notifiers when availability is detected.
/// The core decides *whether* to notify; formatting and delivery live
/// out here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityEvent {
    pub product_name: String,
    pub product_url: String,
    pub detected_at: DateTime<Utc>,
}

impl AvailabilityEvent {
    pub fn new(product_name: &str, product_url: &str, detected_at: DateTime<Utc>) -> Self {
        Self {
            product_name: product_name.to_string(),
            product_url: product_url.to_string(),
            detected_at,
        }
    }

    /// Human-readable alert text shared by every channel.
    pub fn message(&self) -> String {
        format!(
            "🚨 ALERT: {} is NOW AVAILABLE!\n\n🔗 {}\n\n⏰ Time: {}",
            self.product_name,
            self.product_url,
            self.detected_at.format("%Y-%m-%d %H:%M:%S")
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl NotificationResult {
    pub fn delivered(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }

    pub fn failed(error: String) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error),
        }
    }
}

/// Trait for implementing notification channels (Discord, SMS, etc.)
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn channel(&self) -> &str;

    /// Pause between the messages of one alert burst, so a storm of
    /// repeats stays under the channel's rate limits.
    fn burst_delay(&self) -> Duration;

    /// Send a single alert message.
    async fn notify(&self, event: &AvailabilityEvent) -> Result<NotificationResult>;

    /// Verify credentials/endpoint without sending a real alert.
    async fn test_connection(&self) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_message_format() {
        let event = AvailabilityEvent::new(
            "Canvas Tote",
            "https://shop.example.com/products/canvas-tote",
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        );

        let message = event.message();
        assert!(message.contains("Canvas Tote is NOW AVAILABLE!"));
        assert!(message.contains("https://shop.example.com/products/canvas-tote"));
        assert!(message.contains("2024-03-01 09:30:00"));
    }

    #[test]
    fn test_result_constructors() {
        let ok = NotificationResult::delivered(Some("SM123".to_string()));
        assert!(ok.success);
        assert_eq!(ok.message_id.as_deref(), Some("SM123"));
        assert!(ok.error.is_none());

        let failed = NotificationResult::failed("status 404".to_string());
        assert!(!failed.success);
        assert_eq!(failed.error.as_deref(), Some("status 404"));
    }
}

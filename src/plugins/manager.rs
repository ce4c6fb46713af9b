use futures::future::join_all;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::NotificationsConfig;
use crate::plugins::notifiers::{DiscordNotifier, SmsNotifier};
use crate::plugins::traits::{AvailabilityEvent, NotifierPlugin};
use crate::utils::error::Result;

pub type NotifierPluginBox = Box<dyn NotifierPlugin>;

/// Totals across one alert burst, over every registered channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BurstSummary {
    pub attempted: usize,
    pub delivered: usize,
}

/// Registry of notification channels. An availability sighting fires a
/// burst of repeat messages per channel (hard to miss on a muted phone),
/// paced by each channel's own delay.
pub struct NotifierManager {
    notifiers: Vec<NotifierPluginBox>,
    burst_count: u32,
}

impl NotifierManager {
    pub fn new(burst_count: u32) -> Self {
        Self {
            notifiers: Vec::new(),
            burst_count,
        }
    }

    /// Build a manager with every channel the configuration enables.
    pub fn from_config(config: &NotificationsConfig) -> Result<Self> {
        let mut manager = Self::new(config.burst_count);

        if config.discord.is_configured() {
            manager.register(Box::new(DiscordNotifier::from_config(&config.discord)?));
        }
        if config.sms.is_configured() {
            manager.register(Box::new(SmsNotifier::from_config(&config.sms)?));
        }

        Ok(manager)
    }

    pub fn register(&mut self, notifier: NotifierPluginBox) {
        info!(channel = notifier.channel(), "registered notifier");
        self.notifiers.push(notifier);
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }

    pub fn channels(&self) -> Vec<&str> {
        self.notifiers.iter().map(|n| n.channel()).collect()
    }

    /// Fire the configured burst on every channel. Channels run
    /// concurrently; messages within a channel stay sequential so the
    /// pacing delay holds. Per-message failures are logged and never
    /// abort the rest of the burst.
    pub async fn send_burst(&self, event: &AvailabilityEvent) -> BurstSummary {
        let bursts = self
            .notifiers
            .iter()
            .map(|notifier| self.channel_burst(notifier.as_ref(), event));

        let summaries = join_all(bursts).await;
        summaries
            .into_iter()
            .fold(BurstSummary::default(), |acc, s| BurstSummary {
                attempted: acc.attempted + s.attempted,
                delivered: acc.delivered + s.delivered,
            })
    }

    async fn channel_burst(
        &self,
        notifier: &dyn NotifierPlugin,
        event: &AvailabilityEvent,
    ) -> BurstSummary {
        let channel = notifier.channel();
        info!(channel, count = self.burst_count, "sending notification burst");

        let mut summary = BurstSummary::default();
        for i in 0..self.burst_count {
            summary.attempted += 1;
            match notifier.notify(event).await {
                Ok(result) if result.success => summary.delivered += 1,
                Ok(result) => {
                    warn!(
                        channel,
                        attempt = i + 1,
                        error = result.error.as_deref().unwrap_or("unknown"),
                        "notification rejected"
                    );
                }
                Err(e) => {
                    warn!(channel, attempt = i + 1, error = %e, "notification failed");
                }
            }

            if i + 1 < self.burst_count {
                sleep(notifier.burst_delay()).await;
            }
        }

        info!(
            channel,
            delivered = summary.delivered,
            attempted = summary.attempted,
            "notification burst complete"
        );
        summary
    }

    /// Probe every channel's credentials/endpoint.
    pub async fn test_all(&self) -> Vec<(String, bool)> {
        let mut results = Vec::new();
        for notifier in &self.notifiers {
            let ok = match notifier.test_connection().await {
                Ok(ok) => ok,
                Err(e) => {
                    warn!(channel = notifier.channel(), error = %e, "connection test failed");
                    false
                }
            };
            results.push((notifier.channel().to_string(), ok));
        }
        results
    }
}

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub monitor: MonitorConfig,
    pub classifier: ClassifierConfig,
    pub fetcher: FetcherConfig,
    pub state: StateConfig,
    pub notifications: NotificationsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub product_url: String,
    /// Override for the polling cadence; 60 seconds when unset.
    pub poll_interval_secs: Option<u64>,
    pub active_window_minutes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Max distance (bytes) between a purchase phrase and "disabled"
    /// before the occurrence counts as inactive.
    pub proximity_threshold: usize,
    /// Bytes scanned before and after each phrase occurrence.
    pub context_window: usize,
    #[serde(default = "default_purchase_phrases")]
    pub purchase_phrases: Vec<String>,
    #[serde(default = "default_unavailable_phrases")]
    pub unavailable_phrases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    pub user_agent: String,
    pub request_timeout: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Messages sent per channel when availability is detected.
    pub burst_count: u32,
    pub discord: DiscordConfig,
    pub sms: SmsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    pub webhook_url: Option<String>,
    pub username: String,
    pub burst_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub to_number: Option<String>,
    pub burst_delay_ms: u64,
}

/// Ranked most-specific-first; the weaker general phrases come last.
fn default_purchase_phrases() -> Vec<String> {
    [
        "add to shopping bag",
        "add to cart",
        "add to bag",
        "buy now",
        "purchase",
        "add to",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_unavailable_phrases() -> Vec<String> {
    ["sold out", "join the waitlist", "out of stock", "unavailable"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 50,
            context_window: 150,
            purchase_phrases: default_purchase_phrases(),
            unavailable_phrases: default_unavailable_phrases(),
        }
    }
}

impl MonitorConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.unwrap_or(60))
    }

    pub fn active_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.active_window_minutes)
    }
}

impl DiscordConfig {
    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }
}

impl SmsConfig {
    pub fn is_configured(&self) -> bool {
        self.account_sid.is_some()
            && self.auth_token.is_some()
            && self.from_number.is_some()
            && self.to_number.is_some()
    }

    fn is_partially_configured(&self) -> bool {
        let set = [
            self.account_sid.is_some(),
            self.auth_token.is_some(),
            self.from_number.is_some(),
            self.to_number.is_some(),
        ];
        set.iter().any(|s| *s) && !set.iter().all(|s| *s)
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(File::with_name("config/default"))
            // Add environment-specific config
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local config (ignored by git)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix "RESTOCK_"
            .add_source(Environment::with_prefix("RESTOCK").separator("__"))
            .build()?;

        let config: AppConfig = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate monitor configuration
        if Url::parse(&self.monitor.product_url).is_err() {
            return Err(ConfigError::Message("Invalid product URL format".into()));
        }

        if self.monitor.poll_interval_secs == Some(0) {
            return Err(ConfigError::Message(
                "Monitor poll_interval_secs must be greater than 0".into(),
            ));
        }

        if self.monitor.active_window_minutes <= 0 {
            return Err(ConfigError::Message(
                "Monitor active_window_minutes must be greater than 0".into(),
            ));
        }

        // Validate classifier configuration
        if self.classifier.context_window == 0 {
            return Err(ConfigError::Message(
                "Classifier context_window must be greater than 0".into(),
            ));
        }

        if self.classifier.proximity_threshold > self.classifier.context_window {
            return Err(ConfigError::Message(
                "Classifier proximity_threshold cannot exceed context_window".into(),
            ));
        }

        if self.classifier.purchase_phrases.is_empty()
            || self.classifier.unavailable_phrases.is_empty()
        {
            return Err(ConfigError::Message(
                "Classifier phrase lists must not be empty".into(),
            ));
        }

        // Validate fetcher configuration
        if self.fetcher.request_timeout == 0 {
            return Err(ConfigError::Message(
                "Fetcher request_timeout must be greater than 0".into(),
            ));
        }

        if self.fetcher.user_agent.is_empty() {
            return Err(ConfigError::Message(
                "Fetcher user_agent must not be empty".into(),
            ));
        }

        // Validate state configuration
        if self.state.path.is_empty() {
            return Err(ConfigError::Message("State path must not be empty".into()));
        }

        // Validate notification configuration
        if self.notifications.burst_count == 0 {
            return Err(ConfigError::Message(
                "Notifications burst_count must be greater than 0".into(),
            ));
        }

        if let Some(webhook_url) = &self.notifications.discord.webhook_url {
            if !webhook_url.starts_with("https://discord.com/api/webhooks/") {
                return Err(ConfigError::Message(
                    "Invalid Discord webhook URL format".into(),
                ));
            }
        }

        if self.notifications.sms.is_partially_configured() {
            return Err(ConfigError::Message(
                "SMS notifications need account_sid, auth_token, from_number and to_number".into(),
            ));
        }

        Ok(())
    }
}

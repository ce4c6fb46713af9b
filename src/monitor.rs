use chrono::Utc;
use serde::Serialize;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::classifier::Classifier;
use crate::config::AppConfig;
use crate::debouncer::{self, Decision};
use crate::fetcher::PageFetcher;
use crate::models::{NotificationWindowState, Verdict};
use crate::plugins::manager::{BurstSummary, NotifierManager};
use crate::plugins::traits::AvailabilityEvent;
use crate::state::{FileStateStore, StateStore};
use crate::utils::error::Result;

/// Typed result of one polling cycle. The caller decides how to surface
/// it; the monitor never signals through the process exit status.
#[derive(Debug, Clone, Serialize)]
pub struct CheckOutcome {
    pub verdict: Verdict,
    pub should_notify: bool,
    pub state: NotificationWindowState,
    pub notifications_attempted: usize,
    pub notifications_delivered: usize,
    pub fetch_time_ms: u64,
}

/// Orchestrates one classify-then-decide pass per cycle:
/// fetch → classify → load state → decide → persist → notify.
pub struct ProductMonitor {
    config: AppConfig,
    fetcher: PageFetcher,
    classifier: Classifier,
    store: Box<dyn StateStore>,
    notifiers: NotifierManager,
}

impl ProductMonitor {
    pub fn new(
        config: AppConfig,
        fetcher: PageFetcher,
        classifier: Classifier,
        store: Box<dyn StateStore>,
        notifiers: NotifierManager,
    ) -> Self {
        Self {
            config,
            fetcher,
            classifier,
            store,
            notifiers,
        }
    }

    /// Wire up the default components from configuration.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let fetcher = PageFetcher::new(config.fetcher.clone())?;
        let classifier = Classifier::new(config.classifier.clone());
        let store = Box::new(FileStateStore::new(&config.state.path));
        let notifiers = NotifierManager::from_config(&config.notifications)?;
        Ok(Self::new(config, fetcher, classifier, store, notifiers))
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn fetcher(&self) -> &PageFetcher {
        &self.fetcher
    }

    pub fn notifiers(&self) -> &NotifierManager {
        &self.notifiers
    }

    pub fn product_url(&self) -> &str {
        &self.config.monitor.product_url
    }

    /// Run one polling cycle.
    pub async fn check_once(&self) -> Result<CheckOutcome> {
        let url = &self.config.monitor.product_url;

        let fetch_start = tokio::time::Instant::now();
        let page = self.fetcher.fetch(url).await?;
        let fetch_time_ms = fetch_start.elapsed().as_millis() as u64;

        let verdict = self.classifier.classify(&page);
        info!(%verdict, fetch_time_ms, "page classified");

        let state = self.store.load().await;
        let now = Utc::now();
        let Decision {
            should_notify,
            new_state,
        } = debouncer::decide(verdict, &state, now, self.config.monitor.active_window());

        // Best-effort write: the decision already happened in memory, a
        // failed save only risks a redundant notification next cycle
        if new_state != state {
            if let Err(e) = self.store.save(&new_state).await {
                warn!(error = %e, "failed to persist window state");
            }
        }

        let mut summary = BurstSummary::default();
        if should_notify {
            let event = AvailabilityEvent::new(&product_name_from_url(url), url, now);
            info!(product = %event.product_name, "PRODUCT IS NOW AVAILABLE");
            summary = self.notifiers.send_burst(&event).await;
        }

        Ok(CheckOutcome {
            verdict,
            should_notify,
            state: new_state,
            notifications_attempted: summary.attempted,
            notifications_delivered: summary.delivered,
            fetch_time_ms,
        })
    }

    /// Poll until ctrl-c. Cycles run strictly one at a time, which keeps
    /// the read-decide-write sequence around the state record serialized.
    /// A failed cycle is logged and the loop waits for the next tick.
    pub async fn run(&self) -> Result<()> {
        let poll = self.config.monitor.poll_interval();
        info!(
            url = %self.config.monitor.product_url,
            interval_secs = poll.as_secs(),
            "starting product monitor"
        );

        let mut ticker = interval(poll);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.check_once().await {
                        Ok(outcome) => {
                            info!(
                                verdict = %outcome.verdict,
                                notified = outcome.should_notify,
                                "check complete"
                            );
                        }
                        Err(e) => error!(error = %e, "check failed"),
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("shutting down");
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Derive a display name from a storefront product URL:
/// `/products/canvas-tote` becomes "Canvas Tote". Falls back to the URL
/// itself when there is no recognizable slug.
pub fn product_name_from_url(url: &str) -> String {
    let Some((_, rest)) = url.rsplit_once("/products/") else {
        return url.to_string();
    };
    let slug = rest.split(['/', '?', '#']).next().unwrap_or("");
    if slug.is_empty() {
        return url.to_string();
    }

    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ClassifierConfig, DiscordConfig, FetcherConfig, MonitorConfig, NotificationsConfig,
        SmsConfig, StateConfig,
    };
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(product_url: String, state_path: String) -> AppConfig {
        AppConfig {
            monitor: MonitorConfig {
                product_url,
                poll_interval_secs: Some(60),
                active_window_minutes: 15,
            },
            classifier: ClassifierConfig::default(),
            fetcher: FetcherConfig {
                user_agent: "TestAgent/1.0".to_string(),
                request_timeout: 5,
                retry_attempts: 0,
                retry_delay_ms: 10,
            },
            state: StateConfig { path: state_path },
            notifications: NotificationsConfig {
                burst_count: 1,
                discord: DiscordConfig {
                    webhook_url: None,
                    username: "Restock Watcher".to_string(),
                    burst_delay_ms: 0,
                },
                sms: SmsConfig {
                    account_sid: None,
                    auth_token: None,
                    from_number: None,
                    to_number: None,
                    burst_delay_ms: 0,
                },
            },
        }
    }

    fn monitor_for(server: &MockServer, dir: &tempfile::TempDir) -> ProductMonitor {
        let config = test_config(
            format!("{}/products/canvas-tote", server.uri()),
            dir.path()
                .join("window_state.json")
                .to_string_lossy()
                .into_owned(),
        );
        ProductMonitor::from_config(config).unwrap()
    }

    #[test]
    fn test_product_name_from_url() {
        assert_eq!(
            product_name_from_url("https://shop.example.com/products/canvas-tote"),
            "Canvas Tote"
        );
        assert_eq!(
            product_name_from_url("https://shop.example.com/products/mug?variant=2"),
            "Mug"
        );
        assert_eq!(
            product_name_from_url("https://shop.example.com/products/big-red-mug/"),
            "Big Red Mug"
        );
        // No slug: fall back to the URL itself
        assert_eq!(
            product_name_from_url("https://shop.example.com/"),
            "https://shop.example.com/"
        );
    }

    #[tokio::test]
    async fn test_available_page_notifies_and_persists_streak() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<button>Add to Cart</button>"),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor_for(&server, &dir);

        let outcome = monitor.check_once().await.unwrap();
        assert_eq!(outcome.verdict, Verdict::Available);
        assert!(outcome.should_notify);
        assert!(outcome.state.first_seen_at.is_some());

        // No channels configured, so nothing was attempted
        assert_eq!(outcome.notifications_attempted, 0);

        // The streak survived to disk
        let persisted = FileStateStore::new(dir.path().join("window_state.json"))
            .load()
            .await;
        assert_eq!(persisted, outcome.state);
    }

    #[tokio::test]
    async fn test_sold_out_page_clears_persisted_streak() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Sold Out"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = FileStateStore::new(dir.path().join("window_state.json"));
        store
            .save(&NotificationWindowState::active_since(Utc::now()))
            .await
            .unwrap();

        let monitor = monitor_for(&server, &dir);
        let outcome = monitor.check_once().await.unwrap();

        assert_eq!(outcome.verdict, Verdict::SoldOut);
        assert!(!outcome.should_notify);
        assert!(outcome.state.is_idle());
        assert!(store.load().await.is_idle());
    }

    #[tokio::test]
    async fn test_repeat_available_keeps_first_seen_fixed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("buy now"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor_for(&server, &dir);

        let first = monitor.check_once().await.unwrap();
        let second = monitor.check_once().await.unwrap();

        assert!(first.should_notify);
        assert!(second.should_notify);
        assert_eq!(first.state.first_seen_at, second.state.first_seen_at);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_an_error_not_a_verdict() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor_for(&server, &dir);

        assert!(monitor.check_once().await.is_err());
        // State untouched by a failed cycle
        assert!(
            FileStateStore::new(dir.path().join("window_state.json"))
                .load()
                .await
                .is_idle()
        );
    }
}

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The only persisted record: when the current unbroken streak of
/// `Available` verdicts began, or `None` while no streak is active.
///
/// Invariant: `first_seen_at` is present iff the most recent run of
/// verdicts began with `Available` and has not since been interrupted by
/// `SoldOut`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationWindowState {
    pub first_seen_at: Option<DateTime<Utc>>,
}

/// Conceptual phase of the notification window, derived from the record
/// and the caller's clock. Used for logging and tests; the debouncer
/// works off the same arithmetic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WindowPhase {
    Idle,
    Active,
    Cooldown,
}

impl NotificationWindowState {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn active_since(first_seen_at: DateTime<Utc>) -> Self {
        Self {
            first_seen_at: Some(first_seen_at),
        }
    }

    pub fn is_idle(&self) -> bool {
        self.first_seen_at.is_none()
    }

    pub fn phase(&self, now: DateTime<Utc>, active_window: Duration) -> WindowPhase {
        match self.first_seen_at {
            None => WindowPhase::Idle,
            Some(first_seen) if now - first_seen < active_window => WindowPhase::Active,
            Some(_) => WindowPhase::Cooldown,
        }
    }
}

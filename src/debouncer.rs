use chrono::{DateTime, Duration, Utc};
use tracing::debug;

use crate::models::{NotificationWindowState, Verdict, WindowPhase};

/// Outcome of one debounce decision: whether to fire notifications this
/// cycle, and the state to persist for the next one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub should_notify: bool,
    pub new_state: NotificationWindowState,
}

/// Decide whether an availability verdict warrants a new round of
/// notifications, given the persisted streak state.
///
/// The machine has three phases. Idle: first `Available` starts a streak
/// at `now` and notifies. Active: repeat `Available` keeps notifying
/// while `now - first_seen_at < active_window`, state untouched.
/// Cooldown: once the window has elapsed, repeat `Available` is
/// suppressed until the streak breaks. Any `SoldOut` clears the streak
/// silently, so the next `Available` counts as a fresh first detection.
pub fn decide(
    verdict: Verdict,
    state: &NotificationWindowState,
    now: DateTime<Utc>,
    active_window: Duration,
) -> Decision {
    match verdict {
        Verdict::SoldOut => {
            if !state.is_idle() {
                debug!("availability streak broken, clearing window state");
            }
            Decision {
                should_notify: false,
                new_state: NotificationWindowState::idle(),
            }
        }
        Verdict::Available => match state.phase(now, active_window) {
            WindowPhase::Idle => {
                debug!(%now, "first availability sighting, opening notification window");
                Decision {
                    should_notify: true,
                    new_state: NotificationWindowState::active_since(now),
                }
            }
            WindowPhase::Active => Decision {
                should_notify: true,
                new_state: state.clone(),
            },
            WindowPhase::Cooldown => {
                debug!("notification window elapsed, suppressing repeat alert");
                Decision {
                    should_notify: false,
                    new_state: state.clone(),
                }
            }
        },
    }
}

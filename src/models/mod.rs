use serde::{Deserialize, Serialize};

pub mod snapshot;
pub mod window_state;

// Re-exports for convenience
pub use snapshot::*;
pub use window_state::*;

/// Classifier output for one polling cycle. Anything the classifier cannot
/// positively confirm as purchasable is folded into `SoldOut`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Available,
    SoldOut,
}

impl Verdict {
    pub fn is_available(&self) -> bool {
        matches!(self, Verdict::Available)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Available => write!(f, "available"),
            Verdict::SoldOut => write!(f, "sold_out"),
        }
    }
}

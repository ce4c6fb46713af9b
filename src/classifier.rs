use std::fmt;

use tracing::debug;

use crate::config::ClassifierConfig;
use crate::models::{PageSnapshot, Verdict};

const DISABLED_MARKER: &str = "disabled";

/// Availability heuristic over the raw lower-cased text of a product page.
///
/// Page markup is untrusted and heterogeneous, so the classifier trades
/// precision for a conservative bias: anything it cannot positively
/// confirm as an enabled purchase affordance classifies as `SoldOut`.
/// A missed availability costs one polling interval; a false positive
/// costs a notification storm.
pub struct Classifier {
    config: ClassifierConfig,
}

/// Per-phrase occurrence counts plus the verdict the page would get.
/// Produced for the `debug` subcommand so a user can see why detection
/// failed on a page that uses unexpected wording.
#[derive(Debug, Clone)]
pub struct DetectionReport {
    pub verdict: Verdict,
    pub purchase_hits: Vec<PhraseHit>,
    pub unavailable_hits: Vec<PhraseHit>,
}

#[derive(Debug, Clone)]
pub struct PhraseHit {
    pub phrase: String,
    pub count: usize,
}

impl Classifier {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classify one page snapshot. Pure text scan; never errors, and
    /// malformed or empty input resolves to `SoldOut`.
    ///
    /// Precedence is deterministic: purchase phrases are walked in
    /// most-specific-first order, and the first occurrence that is not
    /// marked disabled and has no unavailable phrase inside its context
    /// window decides the whole page. Unrelated "sold out" text elsewhere
    /// (other variants, marketing copy) cannot override a confirmed
    /// enabled affordance.
    pub fn classify(&self, page: &PageSnapshot) -> Verdict {
        let text = page.text();
        if text.is_empty() {
            return Verdict::SoldOut;
        }

        for phrase in &self.config.purchase_phrases {
            for start in occurrences(text, phrase) {
                let end = start + phrase.len();
                let (win_start, win_end) = self.window_bounds(text, start, end);

                if self.disabled_nearby(text, start, end, win_start, win_end) {
                    debug!(phrase = %phrase, position = start, "purchase phrase marked disabled");
                    continue;
                }

                let window = &text[win_start..win_end];
                if let Some(blocker) = self
                    .config
                    .unavailable_phrases
                    .iter()
                    .find(|p| window.contains(p.as_str()))
                {
                    debug!(
                        phrase = %phrase,
                        position = start,
                        blocker = blocker.as_str(),
                        "unavailable phrase inside context window"
                    );
                    continue;
                }

                debug!(phrase = %phrase, position = start, "enabled purchase affordance found");
                return Verdict::Available;
            }
        }

        if self
            .config
            .unavailable_phrases
            .iter()
            .any(|p| text.contains(p.as_str()))
        {
            debug!("no enabled purchase affordance, explicit unavailable phrase present");
        } else {
            debug!("no recognized phrase on page, defaulting to sold out");
        }
        Verdict::SoldOut
    }

    /// Diagnostic phrase counts for a page, without window filtering.
    pub fn detection_report(&self, page: &PageSnapshot) -> DetectionReport {
        let text = page.text();
        let count_all = |phrases: &[String]| {
            phrases
                .iter()
                .map(|phrase| PhraseHit {
                    phrase: phrase.clone(),
                    count: occurrences(text, phrase).len(),
                })
                .collect()
        };

        DetectionReport {
            verdict: self.classify(page),
            purchase_hits: count_all(&self.config.purchase_phrases),
            unavailable_hits: count_all(&self.config.unavailable_phrases),
        }
    }

    /// Context window around a phrase span, clamped to char boundaries so
    /// multi-byte pages cannot split a code point.
    fn window_bounds(&self, text: &str, start: usize, end: usize) -> (usize, usize) {
        let mut lo = start.saturating_sub(self.config.context_window);
        while !text.is_char_boundary(lo) {
            lo -= 1;
        }
        let mut hi = end.saturating_add(self.config.context_window).min(text.len());
        while !text.is_char_boundary(hi) {
            hi += 1;
        }
        (lo, hi)
    }

    /// True when "disabled" occurs inside the window within
    /// `proximity_threshold` bytes of either edge of the phrase span.
    /// Absence of the marker means the occurrence is presumptively
    /// enabled; it is never treated as "disabled, but far away".
    fn disabled_nearby(
        &self,
        text: &str,
        start: usize,
        end: usize,
        win_start: usize,
        win_end: usize,
    ) -> bool {
        let window = &text[win_start..win_end];
        for rel in occurrences(window, DISABLED_MARKER) {
            let marker_start = win_start + rel;
            let marker_end = marker_start + DISABLED_MARKER.len();
            let distance = if marker_start >= end {
                marker_start - end
            } else if marker_end <= start {
                start - marker_end
            } else {
                // Marker overlaps the phrase span itself
                0
            };
            if distance <= self.config.proximity_threshold {
                return true;
            }
        }
        false
    }
}

/// Byte offsets of every occurrence of `phrase` in `text`, overlapping
/// occurrences included: the scan restarts one character past each hit
/// rather than past the whole match.
fn occurrences(text: &str, phrase: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    if phrase.is_empty() {
        return positions;
    }

    let mut from = 0;
    while let Some(rel) = text[from..].find(phrase) {
        let abs = from + rel;
        positions.push(abs);
        from = abs + 1;
        while from < text.len() && !text.is_char_boundary(from) {
            from += 1;
        }
        if from >= text.len() {
            break;
        }
    }
    positions
}

impl fmt::Display for DetectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Unavailable indicators:")?;
        for hit in &self.unavailable_hits {
            if hit.count > 0 {
                writeln!(f, "  found '{}' ({} times)", hit.phrase, hit.count)?;
            } else {
                writeln!(f, "  not found: '{}'", hit.phrase)?;
            }
        }
        writeln!(f, "Purchase indicators:")?;
        for hit in &self.purchase_hits {
            if hit.count > 0 {
                writeln!(f, "  found '{}' ({} times)", hit.phrase, hit.count)?;
            } else {
                writeln!(f, "  not found: '{}'", hit.phrase)?;
            }
        }
        write!(f, "Verdict: {}", self.verdict)
    }
}

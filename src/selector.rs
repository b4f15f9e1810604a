//! # Priority Selector
//! Pure, testable logic that maps `(poll batch, history snapshot)` → the
//! single insight to surface plus the ids to mark notified. No I/O.
//!
//! Policy: qualifying means `critical_stock` type or priority >= 8; already
//! surfaced ids are skipped; the highest priority wins, ties broken by
//! source order (the backend sorts by recency/relevance, first wins).

use crate::dedup::NotifiedHistory;
use crate::insight::Insight;

/// Outcome of one selection pass.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// At most one insight gets the notification slot per cycle.
    pub dispatch: Option<Insight>,
    /// Every qualifying-and-unseen id from this batch, winner included.
    /// Recording the whole batch keeps the next cycle from re-evaluating
    /// it, at the cost of never surfacing the losers (kept as-is pending
    /// product clarification).
    pub newly_notified: Vec<String>,
}

/// Same logic the poll cycle runs, purely functional for testing.
pub fn select_for_notification(insights: &[Insight], history: &NotifiedHistory) -> Selection {
    let fresh: Vec<&Insight> = insights
        .iter()
        .filter(|i| i.is_critical() && !history.contains(&i.id))
        .collect();

    // Strict `>` keeps the earliest of equal-priority candidates.
    let mut winner: Option<&Insight> = None;
    for &candidate in &fresh {
        match winner {
            Some(best) if candidate.priority <= best.priority => {}
            _ => winner = Some(candidate),
        }
    }

    Selection {
        dispatch: winner.cloned(),
        newly_notified: fresh.iter().map(|i| i.id.clone()).collect(),
    }
}

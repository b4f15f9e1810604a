//! counts.rs — UI badge counts over the same insight feed.
//!
//! Independent of the critical-alert cycle: its own (faster) cadence, no
//! dedup history, no notifications. A failed tick keeps the last good
//! counts instead of flashing the badge back to zero.

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::insight::{Insight, InsightType};
use crate::source::InsightSource;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BadgeCounts {
    pub critical_stock: usize,
    pub low_stock: usize,
    pub overdue_debt: usize,
}

impl BadgeCounts {
    pub fn total(&self) -> usize {
        self.critical_stock + self.low_stock + self.overdue_debt
    }
}

/// Count insights per badge bucket; trend insights carry no badge.
pub fn classify(insights: &[Insight]) -> BadgeCounts {
    let mut counts = BadgeCounts::default();
    for insight in insights {
        match insight.kind {
            InsightType::CriticalStock => counts.critical_stock += 1,
            InsightType::LowStock => counts.low_stock += 1,
            InsightType::OverdueDebt => counts.overdue_debt += 1,
            InsightType::SalesTrend => {}
        }
    }
    counts
}

pub struct CountAggregator {
    source: Arc<dyn InsightSource>,
    tx: watch::Sender<BadgeCounts>,
}

impl CountAggregator {
    pub fn new(source: Arc<dyn InsightSource>) -> Self {
        let (tx, _) = watch::channel(BadgeCounts::default());
        Self { source, tx }
    }

    /// Badge subscribers keep the last published value across failed ticks.
    pub fn subscribe(&self) -> watch::Receiver<BadgeCounts> {
        self.tx.subscribe()
    }

    /// One tick: fetch, classify, publish. Failure publishes nothing.
    pub async fn refresh_once(&self) {
        crate::metrics::ensure_metrics_described();
        match self.source.fetch_insights().await {
            Ok(insights) => {
                let counts = classify(&insights);
                gauge!("badge_counts_total").set(counts.total() as f64);
                debug!(
                    critical = counts.critical_stock,
                    low = counts.low_stock,
                    debt = counts.overdue_debt,
                    "badge counts refreshed"
                );
                self.tx.send_replace(counts);
            }
            Err(e) => {
                counter!("badge_poll_errors_total").increment(1);
                warn!("badge count tick failed, keeping last counts: {e:#}");
            }
        }
    }

    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.refresh_once().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::insight::Insight;

    #[test]
    fn classify_buckets_by_type() {
        let insights = vec![
            Insight::new("a", InsightType::CriticalStock, 9, "m"),
            Insight::new("b", InsightType::LowStock, 4, "m"),
            Insight::new("c", InsightType::LowStock, 5, "m"),
            Insight::new("d", InsightType::OverdueDebt, 8, "m"),
            Insight::new("e", InsightType::SalesTrend, 2, "m"),
        ];
        let counts = classify(&insights);
        assert_eq!(counts.critical_stock, 1);
        assert_eq!(counts.low_stock, 2);
        assert_eq!(counts.overdue_debt, 1);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn empty_feed_counts_zero() {
        assert_eq!(classify(&[]), BadgeCounts::default());
    }
}

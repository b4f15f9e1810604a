//! One-time metric registration so series show up with help text on
//! whatever exporter the host process installs.

use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("insight_poll_runs_total", "Completed poll cycles (success or failure).");
        describe_counter!("insight_poll_errors_total", "Poll cycles that failed to fetch.");
        describe_counter!(
            "insight_poll_triggers_dropped_total",
            "Triggers dropped because a cycle was already in flight."
        );
        describe_counter!("insight_notifications_total", "Notifications handed to the platform.");
        describe_counter!("insight_notify_errors_total", "Platform dispatch failures.");
        describe_counter!("badge_poll_errors_total", "Badge-count ticks that failed to fetch.");
        describe_gauge!("insight_poll_last_run_ts", "Unix ts of the last completed poll cycle.");
        describe_gauge!("badge_counts_total", "Current total badge count.");
    });
}

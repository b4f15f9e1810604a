//! poller.rs — orchestrates source → dedup → selector → dispatcher.
//!
//! Three triggers share one entry point: the fixed interval, the app-phase
//! transition into `Active`, and a one-shot boot check shortly after start.
//! `trigger` is guarded so at most one cycle is in flight; an overlapping
//! trigger is dropped, not queued (no catch-up poll). A failed cycle only
//! logs; the next scheduled trigger is the sole retry mechanism.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use metrics::{counter, gauge};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::dedup::DedupStore;
use crate::lifecycle::{AppLifecycle, AppPhase};
use crate::notify::Dispatcher;
use crate::selector::select_for_notification;
use crate::source::InsightSource;

#[derive(Clone, Copy, Debug)]
pub struct PollerCfg {
    pub interval: Duration,
    pub boot_delay: Duration,
}

impl Default for PollerCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            boot_delay: Duration::from_secs(10),
        }
    }
}

/// What asked for the cycle; logged per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollTrigger {
    Interval,
    Foreground,
    Boot,
}

struct CycleOutcome {
    fetched: usize,
    dispatched: bool,
    recorded: usize,
}

pub struct InsightPoller {
    source: Arc<dyn InsightSource>,
    dispatcher: Dispatcher,
    dedup: DedupStore,
    in_flight: AtomicBool,
}

impl InsightPoller {
    pub fn new(source: Arc<dyn InsightSource>, dispatcher: Dispatcher, dedup: DedupStore) -> Arc<Self> {
        Arc::new(Self {
            source,
            dispatcher,
            dedup,
            in_flight: AtomicBool::new(false),
        })
    }

    /// Run one poll cycle unless one is already in flight. Returns whether
    /// the cycle ran; a dropped trigger is a no-op, not an error.
    pub async fn trigger(&self, reason: PollTrigger) -> bool {
        crate::metrics::ensure_metrics_described();

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            counter!("insight_poll_triggers_dropped_total").increment(1);
            debug!(?reason, "poll already in flight, trigger dropped");
            return false;
        }

        let res = self.run_cycle().await;
        self.in_flight.store(false, Ordering::SeqCst);

        counter!("insight_poll_runs_total").increment(1);
        gauge!("insight_poll_last_run_ts").set(chrono::Utc::now().timestamp().max(0) as f64);

        match res {
            Ok(outcome) => info!(
                ?reason,
                fetched = outcome.fetched,
                dispatched = outcome.dispatched,
                recorded = outcome.recorded,
                "poll cycle finished"
            ),
            Err(e) => {
                counter!("insight_poll_errors_total").increment(1);
                warn!(?reason, "poll cycle failed: {e:#}");
            }
        }
        true
    }

    /// History is read once at cycle start and written once at the end;
    /// safe only under the single-flight guard.
    async fn run_cycle(&self) -> Result<CycleOutcome> {
        let mut history = self.dedup.load().await;
        let insights = self.source.fetch_insights().await.context("fetch insights")?;

        let selection = select_for_notification(&insights, &history);
        let dispatched = selection.dispatch.is_some();
        if let Some(insight) = &selection.dispatch {
            self.dispatcher.dispatch(insight).await;
        }

        let recorded = selection.newly_notified.len();
        if recorded > 0 {
            history.add_all(selection.newly_notified);
            self.dedup.persist(&history).await;
        }

        Ok(CycleOutcome {
            fetched: insights.len(),
            dispatched,
            recorded,
        })
    }

    /// Spawn the interval loop, the one-shot boot check, and the
    /// foreground-transition listener. Each firing detaches onto its own
    /// task: `shutdown` stops future firings without tearing a dispatched-
    /// but-not-yet-recorded cycle in half.
    pub fn spawn(self: Arc<Self>, cfg: PollerCfg, lifecycle: &AppLifecycle) -> PollerHandles {
        let boot = {
            let poller = Arc::clone(&self);
            tokio::spawn(async move {
                tokio::time::sleep(cfg.boot_delay).await;
                let poller = Arc::clone(&poller);
                tokio::spawn(async move {
                    poller.trigger(PollTrigger::Boot).await;
                });
            })
        };

        let timer = {
            let poller = Arc::clone(&self);
            tokio::spawn(async move {
                // First firing one full period in; the boot check covers startup.
                let mut ticker = tokio::time::interval_at(Instant::now() + cfg.interval, cfg.interval);
                loop {
                    ticker.tick().await;
                    let poller = Arc::clone(&poller);
                    tokio::spawn(async move {
                        poller.trigger(PollTrigger::Interval).await;
                    });
                }
            })
        };

        let foreground = {
            let poller = Arc::clone(&self);
            let mut phases = lifecycle.subscribe();
            tokio::spawn(async move {
                loop {
                    match phases.recv().await {
                        Ok(AppPhase::Active) => {
                            let poller = Arc::clone(&poller);
                            tokio::spawn(async move {
                                poller.trigger(PollTrigger::Foreground).await;
                            });
                        }
                        Ok(_) => {}
                        Err(RecvError::Lagged(skipped)) => {
                            debug!(skipped, "lifecycle events lagged");
                        }
                        Err(RecvError::Closed) => break,
                    }
                }
            })
        };

        PollerHandles {
            boot,
            timer,
            foreground,
        }
    }
}

/// Background loop handles; dropping without `shutdown` leaves the loops
/// running for the process lifetime, which is the normal mode.
pub struct PollerHandles {
    boot: JoinHandle<()>,
    timer: JoinHandle<()>,
    foreground: JoinHandle<()>,
}

impl PollerHandles {
    /// Tear the loops down (the unmount path). A cycle already in flight
    /// runs to completion on its detached task; cycles are short-lived.
    pub fn shutdown(&self) {
        self.boot.abort();
        self.timer.abort();
        self.foreground.abort();
    }
}

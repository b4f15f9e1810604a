// tests/poller_cycle.rs
// Poll-cycle behavior against fake collaborators: selection, dedup
// bookkeeping, the single-flight guard, and the timer/lifecycle triggers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use insight_notifier::dedup::DedupStore;
use insight_notifier::insight::{Insight, InsightType};
use insight_notifier::lifecycle::{AppLifecycle, AppPhase};
use insight_notifier::notify::{Dispatcher, NotificationRequest, Notifier};
use insight_notifier::poller::{InsightPoller, PollTrigger, PollerCfg};
use insight_notifier::source::InsightSource;
use insight_notifier::store::StateStore;

#[derive(Default)]
struct FakeSource {
    calls: AtomicUsize,
    insights: Mutex<Vec<Insight>>,
    // When set, fetches block until the test releases them.
    gate: Mutex<Option<Arc<Notify>>>,
}

impl FakeSource {
    fn with_insights(insights: Vec<Insight>) -> Arc<Self> {
        let source = Self::default();
        *source.insights.lock() = insights;
        Arc::new(source)
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InsightSource for FakeSource {
    async fn fetch_insights(&self) -> anyhow::Result<Vec<Insight>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.insights.lock().clone())
    }
}

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<NotificationRequest>>,
    fail: AtomicBool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn schedule(&self, req: &NotificationRequest) -> anyhow::Result<String> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("display layer unavailable");
        }
        self.sent.lock().push(req.clone());
        Ok(format!("n-{}", self.sent.lock().len()))
    }
}

#[derive(Default)]
struct MemStore(Mutex<HashMap<String, String>>);

#[async_trait]
impl StateStore for MemStore {
    async fn read(&self, key: &str) -> Option<String> {
        self.0.lock().get(key).cloned()
    }

    async fn write(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.0.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn mk(id: &str, kind: InsightType, priority: u8) -> Insight {
    Insight::new(id, kind, priority, format!("msg {id}"))
}

struct Rig {
    source: Arc<FakeSource>,
    notifier: Arc<RecordingNotifier>,
    store: Arc<MemStore>,
    poller: Arc<InsightPoller>,
}

fn rig(insights: Vec<Insight>) -> Rig {
    let source = FakeSource::with_insights(insights);
    let notifier = Arc::new(RecordingNotifier::default());
    let store = Arc::new(MemStore::default());
    let poller = InsightPoller::new(
        source.clone(),
        Dispatcher::new(notifier.clone()),
        DedupStore::new(store.clone()),
    );
    Rig {
        source,
        notifier,
        store,
        poller,
    }
}

async fn persisted_ids(store: &MemStore) -> Option<Vec<String>> {
    let raw = store.read("notified_insights.json").await?;
    Some(serde_json::from_str(&raw).unwrap())
}

// Let detached cycle tasks run to completion under the paused clock.
async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn top_priority_wins_and_whole_batch_is_recorded() {
    let r = rig(vec![
        mk("y", InsightType::OverdueDebt, 8),
        mk("x", InsightType::CriticalStock, 10),
    ]);

    assert!(r.poller.trigger(PollTrigger::Boot).await);

    let sent = r.notifier.sent.lock();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].data.insight_id, "x");
    assert_eq!(sent[0].title, "Out of stock");
    drop(sent);

    assert_eq!(
        persisted_ids(&r.store).await.unwrap(),
        vec!["y".to_string(), "x".to_string()]
    );
}

#[tokio::test]
async fn an_id_is_dispatched_at_most_once() {
    let r = rig(vec![mk("x", InsightType::CriticalStock, 10)]);

    r.poller.trigger(PollTrigger::Boot).await;
    let after_first = persisted_ids(&r.store).await;
    r.poller.trigger(PollTrigger::Interval).await;

    assert_eq!(r.source.calls(), 2);
    assert_eq!(r.notifier.sent.lock().len(), 1);
    // Second cycle saw nothing new; history untouched.
    assert_eq!(persisted_ids(&r.store).await, after_first);
}

#[tokio::test]
async fn nothing_qualifying_dispatches_nothing() {
    let r = rig(vec![
        mk("a", InsightType::LowStock, 7),
        mk("b", InsightType::SalesTrend, 3),
    ]);

    r.poller.trigger(PollTrigger::Boot).await;

    assert!(r.notifier.sent.lock().is_empty());
    assert_eq!(persisted_ids(&r.store).await, None);
}

#[tokio::test]
async fn display_failure_does_not_roll_back_history() {
    let r = rig(vec![mk("x", InsightType::CriticalStock, 10)]);
    r.notifier.fail.store(true, Ordering::SeqCst);

    r.poller.trigger(PollTrigger::Boot).await;

    // The alert counts as shown; the next cycle must not re-spam it.
    assert!(r.notifier.sent.lock().is_empty());
    assert_eq!(persisted_ids(&r.store).await.unwrap(), vec!["x".to_string()]);
}

#[tokio::test]
async fn concurrent_trigger_is_dropped_not_queued() {
    let r = rig(vec![mk("x", InsightType::CriticalStock, 10)]);
    let gate = Arc::new(Notify::new());
    *r.source.gate.lock() = Some(gate.clone());

    let in_flight = {
        let poller = r.poller.clone();
        tokio::spawn(async move { poller.trigger(PollTrigger::Interval).await })
    };
    while r.source.calls() == 0 {
        tokio::task::yield_now().await;
    }

    // A foreground trigger while the fetch is blocked must not start a
    // second fetch.
    assert!(!r.poller.trigger(PollTrigger::Foreground).await);
    assert_eq!(r.source.calls(), 1);

    gate.notify_one();
    assert!(in_flight.await.unwrap());

    // Guard cleared: the next trigger runs normally.
    *r.source.gate.lock() = None;
    assert!(r.poller.trigger(PollTrigger::Interval).await);
    assert_eq!(r.source.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn boot_check_then_interval_cadence() {
    let r = rig(Vec::new());
    let lifecycle = AppLifecycle::new();
    let handles = r.poller.clone().spawn(
        PollerCfg {
            interval: Duration::from_secs(300),
            boot_delay: Duration::from_secs(10),
        },
        &lifecycle,
    );

    tokio::time::sleep(Duration::from_secs(9)).await;
    settle().await;
    assert_eq!(r.source.calls(), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    settle().await;
    assert_eq!(r.source.calls(), 1);

    tokio::time::sleep(Duration::from_secs(300)).await;
    settle().await;
    assert_eq!(r.source.calls(), 2);

    handles.shutdown();
}

#[tokio::test(start_paused = true)]
async fn foreground_transition_triggers_a_poll() {
    let r = rig(Vec::new());
    let lifecycle = AppLifecycle::new();
    let handles = r.poller.clone().spawn(
        PollerCfg {
            interval: Duration::from_secs(3600),
            boot_delay: Duration::from_secs(3600),
        },
        &lifecycle,
    );
    settle().await;
    assert_eq!(r.source.calls(), 0);

    lifecycle.set_phase(AppPhase::Background);
    lifecycle.set_phase(AppPhase::Active);
    settle().await;
    assert_eq!(r.source.calls(), 1);

    // Going to background alone never polls.
    lifecycle.set_phase(AppPhase::Background);
    settle().await;
    assert_eq!(r.source.calls(), 1);

    handles.shutdown();
}

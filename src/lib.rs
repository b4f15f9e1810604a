// src/lib.rs
// Public library surface for integration tests (and host-app embedding).

pub mod config;
pub mod counts;
pub mod dedup;
pub mod insight;
pub mod lifecycle;
pub mod metrics;
pub mod router;
pub mod selector;
pub mod source;
pub mod store;

// Notification pipeline (dispatch, polling, push registration)
pub mod notify;
pub mod poller;
pub mod push;

// ---- Re-exports for stable public API ----
pub use crate::counts::{BadgeCounts, CountAggregator};
pub use crate::dedup::{DedupStore, NotifiedHistory, HISTORY_CAP};
pub use crate::insight::{EntityType, Insight, InsightType};
pub use crate::lifecycle::{AppLifecycle, AppPhase};
pub use crate::notify::{Dispatcher, NotificationData, NotificationRequest, Notifier, Screen};
pub use crate::poller::{InsightPoller, PollTrigger, PollerCfg};
pub use crate::push::{PushRegistrar, RegistrationOutcome};
pub use crate::selector::{select_for_notification, Selection};
pub use crate::source::InsightSource;
pub use crate::store::{FsStateStore, StateStore};

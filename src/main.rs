//! Insight Notifier — Binary Entrypoint
//! Wires the poller, badge aggregator, and push registration, then runs
//! until interrupted.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use insight_notifier::config::EngineConfig;
use insight_notifier::counts::CountAggregator;
use insight_notifier::dedup::DedupStore;
use insight_notifier::lifecycle::AppLifecycle;
use insight_notifier::notify::{webhook::WebhookNotifier, Dispatcher};
use insight_notifier::poller::{InsightPoller, PollerCfg};
use insight_notifier::push::{EnvPushPlatform, HttpTokenRegistry, PushRegistrar};
use insight_notifier::source::{HttpInsightSource, InsightSource};
use insight_notifier::store::{FsStateStore, StateStore};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("insight_notifier=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = EngineConfig::load();
    tracing::info!(
        poll_secs = cfg.poll_interval_secs,
        count_secs = cfg.count_interval_secs,
        "starting insight notifier"
    );

    let http = reqwest::Client::new();
    let store: Arc<dyn StateStore> = Arc::new(FsStateStore::new(&cfg.state_dir));
    let source: Arc<dyn InsightSource> = Arc::new(
        HttpInsightSource::new(http.clone(), &cfg.insights_endpoint)
            .with_timeout(cfg.http_timeout_secs),
    );

    // Push registration is best-effort and must not block startup.
    let registrar = PushRegistrar::new(
        Arc::new(EnvPushPlatform::from_env()),
        Arc::new(HttpTokenRegistry::new(http.clone(), &cfg.token_endpoint)),
        store.clone(),
    );
    if let Err(e) = registrar.register().await {
        tracing::warn!("push registration skipped: {e:#}");
    }

    let dispatcher = Dispatcher::new(Arc::new(
        WebhookNotifier::new(http, cfg.webhook_url.clone()).with_timeout(cfg.http_timeout_secs),
    ));
    let poller = InsightPoller::new(source.clone(), dispatcher, DedupStore::new(store));

    let lifecycle = AppLifecycle::new();
    let handles = poller.spawn(
        PollerCfg {
            interval: cfg.poll_interval(),
            boot_delay: cfg.boot_delay(),
        },
        &lifecycle,
    );

    let aggregator = Arc::new(CountAggregator::new(source));
    let mut badge = aggregator.subscribe();
    let counts_handle = Arc::clone(&aggregator).spawn(cfg.count_interval());
    tokio::spawn(async move {
        while badge.changed().await.is_ok() {
            let counts = *badge.borrow();
            tracing::info!(total = counts.total(), "badge counts updated");
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    handles.shutdown();
    counts_handle.abort();
    Ok(())
}

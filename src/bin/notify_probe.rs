//! The "test notification" user action: register the device token, then
//! push one synthetic insight through the dispatcher.

use std::sync::Arc;

use insight_notifier::config::EngineConfig;
use insight_notifier::insight::{EntityType, Insight, InsightType};
use insight_notifier::notify::{webhook::WebhookNotifier, Dispatcher};
use insight_notifier::push::{EnvPushPlatform, HttpTokenRegistry, PushRegistrar};
use insight_notifier::store::FsStateStore;
use insight_notifier::RegistrationOutcome;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let cfg = EngineConfig::load();
    let http = reqwest::Client::new();

    let registrar = PushRegistrar::new(
        Arc::new(EnvPushPlatform::from_env()),
        Arc::new(HttpTokenRegistry::new(http.clone(), &cfg.token_endpoint)),
        Arc::new(FsStateStore::new(&cfg.state_dir)),
    );

    match registrar.register().await {
        Ok(RegistrationOutcome::Registered(token)) => {
            println!("registered push token for platform {}", token.platform);
        }
        Ok(RegistrationOutcome::PermissionDenied) => {
            // Recoverable: the user can grant permission and try again.
            println!("notifications are disabled, enable them in system settings and retry");
            return;
        }
        Ok(RegistrationOutcome::Unsupported) => {
            println!("push is unavailable here (simulator); sending local test only");
        }
        Err(e) => {
            eprintln!("registration failed: {e:#}");
        }
    }

    let dispatcher = Dispatcher::new(Arc::new(
        WebhookNotifier::new(http, cfg.webhook_url.clone()).with_timeout(cfg.http_timeout_secs),
    ));
    let probe = Insight::new(
        "probe-1",
        InsightType::CriticalStock,
        10,
        "Test notification: everything is wired up",
    )
    .with_entity(EntityType::Product, "0");

    dispatcher.dispatch(&probe).await;
    println!("notify-probe done");
}

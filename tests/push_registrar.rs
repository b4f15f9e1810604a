// tests/push_registrar.rs
// Registration paths: simulator no-op, recoverable permission denial,
// token rotation, and best-effort backend upsert.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use insight_notifier::push::{
    DeviceToken, PushPlatform, PushRegistrar, RegistrationOutcome, TokenRegistry,
};
use insight_notifier::store::StateStore;

struct FakePlatform {
    physical: bool,
    permission: bool,
    token: Option<String>,
}

#[async_trait]
impl PushPlatform for FakePlatform {
    fn is_physical_device(&self) -> bool {
        self.physical
    }

    async fn request_permission(&self) -> anyhow::Result<bool> {
        Ok(self.permission)
    }

    async fn push_token(&self) -> anyhow::Result<String> {
        self.token.clone().ok_or_else(|| anyhow::anyhow!("token service unavailable"))
    }

    fn platform(&self) -> &str {
        "android"
    }
}

#[derive(Default)]
struct FakeRegistry {
    fail: bool,
    upserts: Mutex<Vec<DeviceToken>>,
}

#[async_trait]
impl TokenRegistry for FakeRegistry {
    async fn upsert(&self, token: &DeviceToken) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("backend rejected registration");
        }
        self.upserts.lock().push(token.clone());
        Ok(())
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

fn registrar(
    platform: FakePlatform,
    registry: Arc<FakeRegistry>,
    store: Arc<MemStore>,
) -> PushRegistrar {
    PushRegistrar::new(Arc::new(platform), registry, store)
}

#[tokio::test]
async fn simulator_is_a_no_op() {
    let registry = Arc::new(FakeRegistry::default());
    let store = Arc::new(MemStore::default());
    let r = registrar(
        FakePlatform {
            physical: false,
            permission: true,
            token: Some("t-1".into()),
        },
        registry.clone(),
        store.clone(),
    );

    assert_eq!(r.register().await.unwrap(), RegistrationOutcome::Unsupported);
    assert!(registry.upserts.lock().is_empty());
    assert!(store.read("device_token.json").await.is_none());
}

#[tokio::test]
async fn permission_denied_is_recoverable_not_an_error() {
    let registry = Arc::new(FakeRegistry::default());
    let r = registrar(
        FakePlatform {
            physical: true,
            permission: false,
            token: Some("t-1".into()),
        },
        registry.clone(),
        Arc::new(MemStore::default()),
    );

    assert_eq!(
        r.register().await.unwrap(),
        RegistrationOutcome::PermissionDenied
    );
    assert!(registry.upserts.lock().is_empty());
}

#[tokio::test]
async fn grant_registers_and_caches_locally() {
    let registry = Arc::new(FakeRegistry::default());
    let store = Arc::new(MemStore::default());
    let r = registrar(
        FakePlatform {
            physical: true,
            permission: true,
            token: Some("t-1".into()),
        },
        registry.clone(),
        store.clone(),
    );

    let outcome = r.register().await.unwrap();
    let RegistrationOutcome::Registered(token) = outcome else {
        panic!("expected registration, got {outcome:?}");
    };
    assert_eq!(token.token, "t-1");
    assert_eq!(token.platform, "android");

    assert_eq!(registry.upserts.lock().len(), 1);
    assert_eq!(r.cached_token().await.unwrap().token, "t-1");
}

#[tokio::test]
async fn backend_failure_keeps_local_cache_for_next_start() {
    let store = Arc::new(MemStore::default());
    let r = registrar(
        FakePlatform {
            physical: true,
            permission: true,
            token: Some("t-1".into()),
        },
        Arc::new(FakeRegistry {
            fail: true,
            ..Default::default()
        }),
        store.clone(),
    );

    // Upsert failure is logged, not surfaced.
    assert!(matches!(
        r.register().await.unwrap(),
        RegistrationOutcome::Registered(_)
    ));
    assert_eq!(r.cached_token().await.unwrap().token, "t-1");
}

#[tokio::test]
async fn rotation_replaces_the_cached_token() {
    let store = Arc::new(MemStore::default());
    let stale = DeviceToken {
        platform: "android".into(),
        token: "t-old".into(),
        registered_at: Utc::now(),
    };
    store
        .write("device_token.json", &serde_json::to_string(&stale).unwrap())
        .await
        .unwrap();

    let r = registrar(
        FakePlatform {
            physical: true,
            permission: true,
            token: Some("t-new".into()),
        },
        Arc::new(FakeRegistry::default()),
        store.clone(),
    );

    r.register().await.unwrap();
    assert_eq!(r.cached_token().await.unwrap().token, "t-new");
}

#[tokio::test]
async fn token_service_failure_is_a_hard_error() {
    let r = registrar(
        FakePlatform {
            physical: true,
            permission: true,
            token: None,
        },
        Arc::new(FakeRegistry::default()),
        Arc::new(MemStore::default()),
    );

    assert!(r.register().await.is_err());
}

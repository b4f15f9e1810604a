//! push.rs — device push-token registration.
//!
//! Independent of the poll cycle: runs once at process start and again when
//! the user fires a test notification. Backend registration is best-effort;
//! the locally cached token survives a failed upsert and is retried
//! opportunistically on the next start. The backend owns revocation; the
//! client never deletes its local copy.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::store::StateStore;

/// Persisted key for the cached token.
const TOKEN_KEY: &str = "device_token.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceToken {
    pub platform: String,
    pub token: String,
    pub registered_at: DateTime<Utc>,
}

/// What the OS layer provides: device check, permission, token.
#[async_trait]
pub trait PushPlatform: Send + Sync {
    /// Emulators and simulators get no token.
    fn is_physical_device(&self) -> bool;
    /// `Ok(false)` means the user declined, a recoverable outcome.
    async fn request_permission(&self) -> Result<bool>;
    async fn push_token(&self) -> Result<String>;
    fn platform(&self) -> &str;
}

/// Backend upsert seam, idempotent and keyed by token.
#[async_trait]
pub trait TokenRegistry: Send + Sync {
    async fn upsert(&self, token: &DeviceToken) -> Result<()>;
}

/// POST `{endpoint}` with `{ "push_token": ..., "platform": ... }`.
pub struct HttpTokenRegistry {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpTokenRegistry {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            timeout: Duration::from_secs(5),
        }
    }
}

#[async_trait]
impl TokenRegistry for HttpTokenRegistry {
    async fn upsert(&self, token: &DeviceToken) -> Result<()> {
        let body = json!({
            "push_token": token.token,
            "platform": token.platform,
        });
        self.client
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .context("token upsert post")?
            .error_for_status()
            .context("token upsert non-2xx")?;
        Ok(())
    }
}

/// Headless adapter: platform facts come from the environment. Real mobile
/// hosts plug their own [`PushPlatform`] in.
pub struct EnvPushPlatform {
    platform: String,
}

impl EnvPushPlatform {
    pub fn from_env() -> Self {
        Self {
            platform: std::env::var("PUSH_PLATFORM").unwrap_or_else(|_| "desktop".to_string()),
        }
    }
}

#[async_trait]
impl PushPlatform for EnvPushPlatform {
    fn is_physical_device(&self) -> bool {
        std::env::var("PUSH_SIMULATOR").map(|v| v != "1").unwrap_or(true)
    }

    async fn request_permission(&self) -> Result<bool> {
        Ok(std::env::var("PUSH_PERMISSION")
            .map(|v| v != "denied")
            .unwrap_or(true))
    }

    async fn push_token(&self) -> Result<String> {
        std::env::var("PUSH_TOKEN").context("PUSH_TOKEN not set")
    }

    fn platform(&self) -> &str {
        &self.platform
    }
}

/// Result of one registration attempt. The non-registered variants are
/// expected states, not errors; user-triggered callers turn
/// `PermissionDenied` into a prompt.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistrationOutcome {
    Registered(DeviceToken),
    PermissionDenied,
    Unsupported,
}

pub struct PushRegistrar {
    platform: Arc<dyn PushPlatform>,
    registry: Arc<dyn TokenRegistry>,
    store: Arc<dyn StateStore>,
}

impl PushRegistrar {
    pub fn new(
        platform: Arc<dyn PushPlatform>,
        registry: Arc<dyn TokenRegistry>,
        store: Arc<dyn StateStore>,
    ) -> Self {
        Self {
            platform,
            registry,
            store,
        }
    }

    /// Device check → permission → token fetch → local persist → backend
    /// upsert. Only the token fetch itself is a hard error.
    pub async fn register(&self) -> Result<RegistrationOutcome> {
        if !self.platform.is_physical_device() {
            debug!("not a physical device, skipping push registration");
            return Ok(RegistrationOutcome::Unsupported);
        }

        if !self.platform.request_permission().await.context("request permission")? {
            info!("notification permission denied");
            return Ok(RegistrationOutcome::PermissionDenied);
        }

        let token = self.platform.push_token().await.context("obtain push token")?;
        let device = DeviceToken {
            platform: self.platform.platform().to_string(),
            token,
            registered_at: Utc::now(),
        };

        if let Some(cached) = self.cached_token().await {
            if cached.token != device.token {
                info!("push token rotated, replacing cached token");
            }
        }

        // Local cache first so a failed upsert still leaves a token to
        // retry with on the next start.
        match serde_json::to_string(&device) {
            Ok(raw) => {
                if let Err(e) = self.store.write(TOKEN_KEY, &raw).await {
                    warn!("cache device token: {e:#}");
                }
            }
            Err(e) => warn!("encode device token: {e:#}"),
        }

        if let Err(e) = self.registry.upsert(&device).await {
            warn!("token registration failed, will retry on next start: {e:#}");
        }

        Ok(RegistrationOutcome::Registered(device))
    }

    /// Fail-open read of the locally cached token.
    pub async fn cached_token(&self) -> Option<DeviceToken> {
        let raw = self.store.read(TOKEN_KEY).await?;
        match serde_json::from_str(&raw) {
            Ok(token) => Some(token),
            Err(e) => {
                warn!("corrupt cached device token, ignoring: {e:#}");
                None
            }
        }
    }
}

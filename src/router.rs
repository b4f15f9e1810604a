//! router.rs — resolves "notification tapped" payloads to in-app routes.
//!
//! The destination screen owns the highlight animation; this module only
//! guarantees the query contract: `from=notification` always, plus
//! `highlight=<entityId>` when the payload names a record.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::notify::NotificationData;

/// An in-app navigation target, rendered as `path?query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: String,
    pub query: Vec<(String, String)>,
}

impl Route {
    pub fn to_uri(&self) -> String {
        let mut uri = self.path.clone();
        for (i, (k, v)) in self.query.iter().enumerate() {
            uri.push(if i == 0 { '?' } else { '&' });
            uri.push_str(k);
            uri.push('=');
            uri.push_str(v);
        }
        uri
    }
}

/// The host app's navigation layer.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

pub fn resolve(data: &NotificationData) -> Route {
    let mut query = vec![("from".to_string(), "notification".to_string())];
    if let Some(entity_id) = &data.entity_id {
        query.push(("highlight".to_string(), entity_id.clone()));
    }
    Route {
        path: data.screen.path().to_string(),
        query,
    }
}

/// Consume tap payloads until the sender side closes, forwarding resolved
/// routes to the navigator.
pub fn spawn_tap_router(
    mut taps: mpsc::Receiver<NotificationData>,
    navigator: Arc<dyn Navigator>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(data) = taps.recv().await {
            let route = resolve(&data);
            debug!(uri = %route.to_uri(), insight_id = %data.insight_id, "notification tap routed");
            navigator.navigate(route);
        }
    })
}

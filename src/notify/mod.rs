//! Notification rendering and dispatch.
//!
//! `template_for` is a total match over the closed [`InsightType`] set, so a
//! new insight type fails to compile until it gets a template. Dispatch is
//! fire-and-forget: a platform failure is logged and counted, never retried,
//! and never rolls back the dedup bookkeeping (the alert counts as shown).

pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::insight::{Insight, InsightType};

/// In-app destination a notification deep-links to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Customers,
    Inventory,
    Insights,
}

impl Screen {
    pub fn path(&self) -> &'static str {
        match self {
            Screen::Customers => "/customers",
            Screen::Inventory => "/inventory",
            Screen::Insights => "/insights",
        }
    }
}

/// Deep-link payload carried by the platform notification and handed back
/// on tap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationData {
    pub screen: Screen,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    pub insight_id: String,
}

/// What the platform is asked to display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationRequest {
    pub title: String,
    pub body: String,
    /// Hint for platforms with channel priority; everything that reaches
    /// the dispatcher already passed the criticality filter.
    pub high_priority: bool,
    pub data: NotificationData,
}

/// Platform-local notification port: `schedule` returns the platform's
/// notification id.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn schedule(&self, req: &NotificationRequest) -> anyhow::Result<String>;
}

pub struct NotificationTemplate {
    pub title: &'static str,
    pub screen: Screen,
}

/// Total over the closed insight-type set; the compiler flags any new type
/// that lacks a template.
pub fn template_for(kind: InsightType) -> NotificationTemplate {
    match kind {
        InsightType::CriticalStock => NotificationTemplate {
            title: "Out of stock",
            screen: Screen::Inventory,
        },
        InsightType::LowStock => NotificationTemplate {
            title: "Stock running low",
            screen: Screen::Inventory,
        },
        InsightType::OverdueDebt => NotificationTemplate {
            title: "Overdue debt",
            screen: Screen::Customers,
        },
        InsightType::SalesTrend => NotificationTemplate {
            title: "Business insight",
            screen: Screen::Insights,
        },
    }
}

pub fn build_request(insight: &Insight) -> NotificationRequest {
    let template = template_for(insight.kind);
    NotificationRequest {
        title: template.title.to_string(),
        body: insight.message.clone(),
        high_priority: true,
        data: NotificationData {
            screen: template.screen,
            entity_id: insight.entity_id.clone(),
            insight_id: insight.id.clone(),
        },
    }
}

/// Fire-and-forget dispatcher over a [`Notifier`] port.
pub struct Dispatcher {
    port: Arc<dyn Notifier>,
}

impl Dispatcher {
    pub fn new(port: Arc<dyn Notifier>) -> Self {
        Self { port }
    }

    pub async fn dispatch(&self, insight: &Insight) {
        let req = build_request(insight);
        match self.port.schedule(&req).await {
            Ok(notification_id) => {
                counter!("insight_notifications_total").increment(1);
                info!(
                    insight_id = %insight.id,
                    notification_id = %notification_id,
                    "notification dispatched"
                );
            }
            Err(e) => {
                // A duplicate on the next cycle is worse than one silently
                // dropped display, so no retry and no history rollback.
                counter!("insight_notify_errors_total").increment(1);
                warn!(insight_id = %insight.id, "notification dispatch failed: {e:#}");
            }
        }
    }
}

//! insight.rs — wire model for backend-computed business alerts.
//!
//! The backend owns insight generation; this crate only consumes the feed.
//! `id` is stable across polls for the same underlying condition (same
//! stock-out ⇒ same id), which is what makes deduplication meaningful.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of alert categories the backend emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    CriticalStock,
    LowStock,
    OverdueDebt,
    SalesTrend,
}

/// Which record an insight points at, when it points at one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Product,
    Customer,
}

/// Any insight at or above this priority qualifies for a notification,
/// regardless of type.
pub const CRITICAL_PRIORITY_FLOOR: u8 = 8;

/// One backend-computed business alert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    /// Stable across polls for the same underlying condition.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InsightType,
    /// Ranking key, 0–10.
    pub priority: u8,
    /// Human-readable alert text, used verbatim as the notification body.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<EntityType>,
    pub created_at: DateTime<Utc>,
}

impl Insight {
    pub fn new(
        id: impl Into<String>,
        kind: InsightType,
        priority: u8,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            priority: priority.min(10),
            message: message.into(),
            entity_id: None,
            entity_type: None,
            created_at: Utc::now(),
        }
    }

    /// Attach the record this insight is about (builder style).
    pub fn with_entity(mut self, entity_type: EntityType, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self.entity_type = Some(entity_type);
        self
    }

    /// Qualifies for the notification slot: critical stock-outs always,
    /// anything else by priority.
    pub fn is_critical(&self) -> bool {
        matches!(self.kind, InsightType::CriticalStock) || self.priority >= CRITICAL_PRIORITY_FLOOR
    }
}

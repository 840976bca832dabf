//! Alert data structures

use crate::types::assessment::RiskLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Alert category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertType {
    Fraud,
    Security,
    System,
    Performance,
}

/// Alert severity.
///
/// Unlike risk levels, `Critical` is a normal value here: external callers
/// assign it directly when filing alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::Low => "low",
            AlertSeverity::Medium => "medium",
            AlertSeverity::High => "high",
            AlertSeverity::Critical => "critical",
        }
    }
}

impl From<RiskLevel> for AlertSeverity {
    fn from(level: RiskLevel) -> Self {
        match level {
            RiskLevel::Low => AlertSeverity::Low,
            RiskLevel::Medium => AlertSeverity::Medium,
            RiskLevel::High => AlertSeverity::High,
            RiskLevel::Critical => AlertSeverity::Critical,
        }
    }
}

/// An alert entry in the ledger.
///
/// Created by the analysis pipeline for high-risk results or filed directly
/// by an external caller. The only mutation after creation is the one-way
/// resolve transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub alert_id: String,
    #[serde(rename = "type")]
    pub alert_type: AlertType,
    pub severity: AlertSeverity,
    pub message: String,

    /// Order or customer id the alert originated from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_entity_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,

    pub created_at: DateTime<Utc>,
    pub resolved: bool,
}

impl Alert {
    /// Create a new unresolved alert.
    pub fn new(alert_type: AlertType, severity: AlertSeverity, message: impl Into<String>) -> Self {
        Self {
            alert_id: uuid::Uuid::new_v4().to_string(),
            alert_type,
            severity,
            message: message.into(),
            source_entity_id: None,
            store_id: None,
            created_at: Utc::now(),
            resolved: false,
        }
    }

    /// Attach the originating entity id.
    pub fn with_source_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.source_entity_id = Some(entity_id.into());
        self
    }

    /// Attach the store the alert belongs to.
    pub fn with_store(mut self, store_id: impl Into<String>) -> Self {
        self.store_id = Some(store_id.into());
        self
    }
}

/// Alert counts by severity, recomputed from the ledger on every read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub low: u64,
    pub medium: u64,
    pub high: u64,
    pub critical: u64,
}

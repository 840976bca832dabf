//! Risk assessment data structures

use crate::config::ClassifyConfig;
use crate::types::request::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk level classification
///
/// `Critical` is reserved for severities assigned explicitly by callers
/// (e.g. manually filed alerts); score classification never produces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Classify a risk score against configured thresholds.
    ///
    /// Thresholds are strict: a score sitting exactly on a boundary falls
    /// into the lower level.
    pub fn from_score(score: f64, thresholds: &ClassifyConfig) -> Self {
        if score > thresholds.high {
            RiskLevel::High
        } else if score > thresholds.medium {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

/// Action recommendation consumed by the order-processing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Allow,
    Review,
    Block,
}

/// Predicted fraud type for an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FraudType {
    PaymentFraud,
    AccountTakeover,
    FriendlyFraud,
    IdentityTheft,
    None,
}

/// Result of a completed risk analysis.
///
/// Immutable once created. Keyed by entity id in the assessment store; a
/// later submission for the same entity replaces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub entity_id: String,
    pub entity_kind: EntityKind,

    /// Weighted feature accumulation, clamped to [0, 1].
    pub risk_score: f64,

    /// Independently weighted fraud likelihood, clamped to [0, 1].
    pub fraud_probability: f64,

    pub risk_level: RiskLevel,
    pub fraud_type: FraudType,

    /// Canonical names of the factors that contributed to the score.
    pub matched_factors: Vec<String>,

    pub recommendation: Recommendation,
    pub confidence: f64,
    pub created_at: DateTime<Utc>,
}

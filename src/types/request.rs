//! Submission request and receipt types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind of entity a risk analysis runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Order,
    Customer,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Order => write!(f, "order"),
            EntityKind::Customer => write!(f, "customer"),
        }
    }
}

/// An analysis submission as it arrives on the wire.
///
/// Accepts both the order and the customer envelope: `{order_id, order_data}`
/// or `{customer_id, customer_data}`. The data payload is an arbitrary
/// key/value mapping; validation happens at submission, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    #[serde(alias = "order_id", alias = "customer_id")]
    pub entity_id: String,

    #[serde(alias = "order_data", alias = "customer_data", default)]
    pub data: Value,
}

/// Lifecycle of a submitted analysis.
///
/// `Stored` and `Failed` are terminal. `Failed` is only reachable through an
/// unrecoverable error after acceptance (currently a timeout); malformed
/// payloads are rejected before a submission ever enters the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Queued,
    Extracting,
    Scoring,
    Classified,
    Stored,
    Failed,
}

/// Acceptance receipt returned synchronously from a submission.
///
/// The sequence number is per-entity and strictly increasing; results are
/// applied in submission order, so the receipt with the highest sequence
/// identifies the analysis that will be visible once complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReceipt {
    pub entity_id: String,
    pub entity_kind: EntityKind,
    pub sequence: u64,
    pub status: AnalysisStatus,
    pub submitted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_accepts_order_envelope() {
        let raw = json!({
            "order_id": "order_17",
            "order_data": { "order_value": 1500.0, "new_customer": true }
        });

        let req: AnalysisRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(req.entity_id, "order_17");
        assert!(req.data.get("new_customer").is_some());
    }

    #[test]
    fn test_request_accepts_customer_envelope() {
        let raw = json!({
            "customer_id": "cust_9",
            "customer_data": { "multiple_addresses": true }
        });

        let req: AnalysisRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(req.entity_id, "cust_9");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&AnalysisStatus::Queued).unwrap();
        assert_eq!(json, "\"queued\"");
    }
}

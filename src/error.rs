//! Engine error types.
//!
//! Every error here is locally recoverable: the caller receives a typed
//! failure and may resubmit. No condition is fatal to the process, and a bad
//! submission never corrupts state held for other entities.

use thiserror::Error;

/// Errors surfaced by the risk engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The submitted payload was malformed. Rejected synchronously at
    /// submission time; malformed fields are never silently defaulted.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// Lookup for an entity id that was never submitted.
    #[error("no analysis found for entity `{entity_id}`")]
    UnknownEntity { entity_id: String },

    /// The entity was submitted but no result has been applied yet.
    #[error("analysis for entity `{entity_id}` is still in progress")]
    AnalysisPending { entity_id: String },

    /// Resolve was called with an alert id that does not exist.
    #[error("no alert found with id `{alert_id}`")]
    UnknownAlert { alert_id: String },

    /// The analysis exceeded its configured latency bound and was marked
    /// failed instead of hanging.
    #[error("analysis for entity `{entity_id}` timed out")]
    ComputationTimeout { entity_id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::UnknownEntity {
            entity_id: "order_42".to_string(),
        };
        assert_eq!(err.to_string(), "no analysis found for entity `order_42`");

        let err = EngineError::InvalidPayload("payload must be a JSON object".to_string());
        assert!(err.to_string().contains("invalid payload"));
    }
}

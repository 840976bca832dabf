//! Payload validation and feature extraction.
//!
//! Validation happens once, at the submission boundary: a malformed payload
//! is rejected with a typed error and never reaches the extractor. The
//! extractor itself is a pure function over a validated mapping; missing
//! keys are a valid low-signal input, not an error.

use crate::error::EngineError;
use serde::Serialize;
use serde_json::{Map, Value};

/// Boolean signals recognized in a submission payload.
const BOOL_FIELDS: [&str; 7] = [
    "high_value",
    "new_customer",
    "unusual_timing",
    "multiple_addresses",
    "international_shipping",
    "multiple_payment_methods",
    "rapid_ordering",
];

/// Fixed feature set derived from a raw attribute mapping.
///
/// Immutable once extracted; one instance per scoring request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FeatureSet {
    pub order_value: f64,
    pub high_value: bool,
    pub new_customer: bool,
    pub unusual_timing: bool,
    pub multiple_addresses: bool,
    pub international_shipping: bool,
    pub multiple_payment_methods: bool,
    pub rapid_ordering: bool,
}

/// Check that a raw payload is a well-formed attribute mapping.
///
/// The payload must be a JSON object, and every recognized key must carry
/// the expected JSON type. Unknown keys pass through untouched; the customer
/// variant's order-history aggregates ride along here as ignored context.
pub fn validate_payload(raw: &Value) -> Result<&Map<String, Value>, EngineError> {
    let map = raw
        .as_object()
        .ok_or_else(|| EngineError::InvalidPayload("payload must be a JSON object".to_string()))?;

    if let Some(value) = map.get("order_value") {
        if !value.is_number() {
            return Err(EngineError::InvalidPayload(
                "field `order_value` must be a number".to_string(),
            ));
        }
    }

    for field in BOOL_FIELDS {
        if let Some(value) = map.get(field) {
            if !value.is_boolean() {
                return Err(EngineError::InvalidPayload(format!(
                    "field `{field}` must be a boolean"
                )));
            }
        }
    }

    Ok(map)
}

/// Feature extractor that normalizes a validated mapping into a [`FeatureSet`].
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract features from a validated payload.
    ///
    /// Deterministic: the same mapping always yields an identical feature
    /// set. Missing keys default to `false`/`0`.
    pub fn extract(&self, raw: &Map<String, Value>) -> FeatureSet {
        FeatureSet {
            order_value: raw
                .get("order_value")
                .and_then(Value::as_f64)
                .unwrap_or(0.0),
            high_value: flag(raw, "high_value"),
            new_customer: flag(raw, "new_customer"),
            unusual_timing: flag(raw, "unusual_timing"),
            multiple_addresses: flag(raw, "multiple_addresses"),
            international_shipping: flag(raw, "international_shipping"),
            multiple_payment_methods: flag(raw, "multiple_payment_methods"),
            rapid_ordering: flag(raw, "rapid_ordering"),
        }
    }

    /// Number of signals in the fixed feature set.
    pub fn feature_count(&self) -> usize {
        BOOL_FIELDS.len() + 1
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn flag(raw: &Map<String, Value>, key: &str) -> bool {
    raw.get(key).and_then(Value::as_bool).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(value: &Value) -> FeatureSet {
        let map = validate_payload(value).unwrap();
        FeatureExtractor::new().extract(map)
    }

    #[test]
    fn test_empty_payload_yields_defaults() {
        let features = extract(&json!({}));
        assert_eq!(features, FeatureSet::default());
        assert_eq!(features.order_value, 0.0);
        assert!(!features.new_customer);
    }

    #[test]
    fn test_extraction_reads_signals() {
        let features = extract(&json!({
            "order_value": 1500.0,
            "new_customer": true,
            "international_shipping": true,
        }));

        assert_eq!(features.order_value, 1500.0);
        assert!(features.new_customer);
        assert!(features.international_shipping);
        assert!(!features.multiple_addresses);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let features = extract(&json!({
            "new_customer": true,
            "order_history": { "total_orders": 12, "total_spent": 840.0 },
            "loyalty_tier": "gold",
        }));

        assert!(features.new_customer);
        assert_eq!(features.order_value, 0.0);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let payload = json!({ "order_value": 99.5, "unusual_timing": true });
        assert_eq!(extract(&payload), extract(&payload));
    }

    #[test]
    fn test_non_object_payload_rejected() {
        let err = validate_payload(&json!([1, 2, 3])).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPayload(_)));

        let err = validate_payload(&json!("order")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidPayload(_)));
    }

    #[test]
    fn test_wrong_field_types_rejected() {
        let err = validate_payload(&json!({ "order_value": "a lot" })).unwrap_err();
        assert!(err.to_string().contains("order_value"));

        let err = validate_payload(&json!({ "new_customer": 1 })).unwrap_err();
        assert!(err.to_string().contains("new_customer"));
    }
}

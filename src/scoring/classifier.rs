//! Classification, recommendation and explainability.

use crate::config::{ClassifyConfig, RecommendConfig};
use crate::features::FeatureSet;
use crate::patterns::PatternCatalog;
use crate::types::assessment::{FraudType, Recommendation, RiskLevel};

/// Confidence grows with the number of contributing factors.
const CONFIDENCE_BASE: f64 = 0.70;
const CONFIDENCE_PER_FACTOR: f64 = 0.05;
const CONFIDENCE_CAP: f64 = 0.95;

/// Maps scores to risk levels and actions.
///
/// Classification and recommendation thresholds are independent knobs; all
/// comparisons are strict, so a score exactly on a boundary takes the less
/// severe outcome.
pub struct Classifier {
    classify: ClassifyConfig,
    recommend: RecommendConfig,
}

impl Classifier {
    pub fn new(classify: ClassifyConfig, recommend: RecommendConfig) -> Self {
        Self { classify, recommend }
    }

    /// Classify a risk score into a discrete level.
    pub fn classify(&self, risk_score: f64) -> RiskLevel {
        RiskLevel::from_score(risk_score, &self.classify)
    }

    /// Recommend an action from the score pair.
    pub fn recommend(&self, risk_score: f64, fraud_probability: f64) -> Recommendation {
        if risk_score > self.recommend.block_risk
            || fraud_probability > self.recommend.block_probability
        {
            Recommendation::Block
        } else if risk_score > self.recommend.review_risk
            || fraud_probability > self.recommend.review_probability
        {
            Recommendation::Review
        } else {
            Recommendation::Allow
        }
    }

    /// Project triggered features onto their canonical factor names.
    pub fn match_factors(features: &FeatureSet) -> Vec<String> {
        let mappings = [
            (features.high_value, "high_order_value"),
            (features.new_customer, "new_customer_account"),
            (features.unusual_timing, "unusual_order_timing"),
            (features.multiple_addresses, "multiple_shipping_addresses"),
            (features.international_shipping, "international_shipping"),
            (features.multiple_payment_methods, "multiple_payment_methods"),
            (features.rapid_ordering, "rapid_order_placement"),
        ];

        mappings
            .into_iter()
            .filter(|(triggered, _)| *triggered)
            .map(|(_, name)| name.to_string())
            .collect()
    }

    /// Predict the fraud type for a feature set.
    ///
    /// High-value and new-customer signals dominate; otherwise the catalog
    /// picks the category with the most triggered patterns. No signal at
    /// all means no predicted fraud.
    pub fn predict_fraud_type(features: &FeatureSet, catalog: &PatternCatalog) -> FraudType {
        if features.high_value {
            return FraudType::PaymentFraud;
        }
        if features.new_customer {
            return FraudType::AccountTakeover;
        }

        match catalog.best_matching_category(features) {
            Some("payment") => FraudType::PaymentFraud,
            Some("behavioral") => FraudType::FriendlyFraud,
            Some("geographic") => FraudType::IdentityTheft,
            _ => FraudType::None,
        }
    }

    /// Deterministic confidence for an assessment.
    pub fn confidence(matched_factors: usize) -> f64 {
        (CONFIDENCE_BASE + CONFIDENCE_PER_FACTOR * matched_factors as f64).min(CONFIDENCE_CAP)
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(ClassifyConfig::default(), RecommendConfig::default())
    }
}

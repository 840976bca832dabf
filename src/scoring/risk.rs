//! Weighted risk scoring.

use crate::config::ScoringConfig;
use crate::features::FeatureSet;
use crate::scoring::noise::NoiseSource;

/// Converts a feature set into a risk score in `[0, 1]`.
///
/// Starts from a base score and accumulates a fixed weight per triggered
/// feature. The result is clamped regardless of how the weights sum.
pub struct RiskScorer {
    config: ScoringConfig,
    noise: NoiseSource,
}

impl RiskScorer {
    pub fn new(config: ScoringConfig) -> Self {
        let noise = NoiseSource::new(config.noise_amplitude, config.noise_seed);
        Self { config, noise }
    }

    /// Score a feature set.
    pub fn score(&self, features: &FeatureSet) -> f64 {
        let mut score = self.config.base_score;

        if features.order_value > self.config.high_value_threshold {
            score += self.config.order_value_weight;
        }
        if features.new_customer {
            score += self.config.new_customer_weight;
        }
        if features.international_shipping {
            score += self.config.international_shipping_weight;
        }
        if features.multiple_payment_methods {
            score += self.config.multiple_payment_methods_weight;
        }

        (score + self.noise.sample()).clamp(0.0, 1.0)
    }
}

//! Fraud probability estimation.

use crate::config::ProbabilityConfig;
use crate::features::FeatureSet;
use crate::scoring::noise::NoiseSource;

/// Converts a feature set into a fraud probability in `[0, 1]`.
///
/// Accumulates independently of the risk scorer: a flat weight per
/// triggered factor on top of a small base probability.
pub struct FraudProbabilityEstimator {
    config: ProbabilityConfig,
    noise: NoiseSource,
}

impl FraudProbabilityEstimator {
    pub fn new(config: ProbabilityConfig) -> Self {
        let noise = NoiseSource::new(config.noise_amplitude, config.noise_seed);
        Self { config, noise }
    }

    /// Estimate the fraud probability for a feature set.
    pub fn probability(&self, features: &FeatureSet) -> f64 {
        let factors = [
            features.high_value,
            features.new_customer,
            features.unusual_timing,
            features.multiple_addresses,
        ];

        let triggered = factors.iter().filter(|&&set| set).count();
        let probability =
            self.config.base_probability + self.config.factor_weight * triggered as f64;

        (probability + self.noise.sample()).clamp(0.0, 1.0)
    }
}

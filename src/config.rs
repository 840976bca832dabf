//! Configuration management for the fraud risk engine

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub nats: NatsConfig,
    pub scoring: ScoringConfig,
    pub probability: ProbabilityConfig,
    pub classify: ClassifyConfig,
    pub recommend: RecommendConfig,
    pub pipeline: PipelineConfig,
    pub logging: LoggingConfig,
}

/// NATS connection and subject configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    /// NATS server URL
    pub url: String,
    /// Subject for order analysis submissions
    pub order_subject: String,
    /// Subject for customer analysis submissions
    pub customer_subject: String,
    /// Request-reply subject for fetching a stored assessment
    pub analysis_query_subject: String,
    /// Request-reply subject for fraud pattern lookups
    pub pattern_query_subject: String,
    /// Request-reply subject for filing alerts
    pub alert_create_subject: String,
    /// Request-reply subject for resolving alerts
    pub alert_resolve_subject: String,
    /// Request-reply subject for listing alerts
    pub alert_list_subject: String,
    /// Subject alert notifications are published to
    pub alert_events_subject: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            order_subject: "fraud.orders.analyze".to_string(),
            customer_subject: "fraud.customers.analyze".to_string(),
            analysis_query_subject: "fraud.analysis.get".to_string(),
            pattern_query_subject: "fraud.patterns.get".to_string(),
            alert_create_subject: "fraud.alerts.create".to_string(),
            alert_resolve_subject: "fraud.alerts.resolve".to_string(),
            alert_list_subject: "fraud.alerts.list".to_string(),
            alert_events_subject: "fraud.alerts.events".to_string(),
        }
    }
}

/// Risk scorer weights.
///
/// The noise term simulates model variability. It defaults to zero so
/// scoring stays deterministic; give it an amplitude and a seed to get
/// reproducible jitter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Score every analysis starts from
    pub base_score: f64,
    /// Order value above which the order-value weight applies
    pub high_value_threshold: f64,
    pub order_value_weight: f64,
    pub new_customer_weight: f64,
    pub international_shipping_weight: f64,
    pub multiple_payment_methods_weight: f64,
    /// Uniform jitter bound; 0.0 disables noise entirely
    pub noise_amplitude: f64,
    /// Seed for the jitter source; unseeded sources draw from entropy
    pub noise_seed: Option<u64>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            base_score: 0.5,
            high_value_threshold: 1000.0,
            order_value_weight: 0.20,
            new_customer_weight: 0.15,
            international_shipping_weight: 0.10,
            multiple_payment_methods_weight: 0.20,
            noise_amplitude: 0.0,
            noise_seed: None,
        }
    }
}

/// Fraud probability estimator weights, accumulated independently of the
/// risk scorer.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbabilityConfig {
    pub base_probability: f64,
    /// Added once per triggered probability factor
    pub factor_weight: f64,
    pub noise_amplitude: f64,
    pub noise_seed: Option<u64>,
}

impl Default for ProbabilityConfig {
    fn default() -> Self {
        Self {
            base_probability: 0.1,
            factor_weight: 0.15,
            noise_amplitude: 0.0,
            noise_seed: None,
        }
    }
}

/// Risk level classification thresholds. Strict: a score exactly on a
/// boundary classifies into the lower level.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifyConfig {
    pub high: f64,
    pub medium: f64,
}

impl Default for ClassifyConfig {
    fn default() -> Self {
        Self { high: 0.7, medium: 0.3 }
    }
}

/// Recommendation thresholds, tunable independently of classification.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    pub block_risk: f64,
    pub block_probability: f64,
    pub review_risk: f64,
    pub review_probability: f64,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            block_risk: 0.8,
            block_probability: 0.7,
            review_risk: 0.5,
            review_probability: 0.4,
        }
    }
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of concurrent submission workers
    pub workers: usize,
    /// Latency bound per analysis; exceeding it marks the analysis failed
    pub timeout_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            timeout_ms: 1000,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.nats.url, "nats://localhost:4222");
        assert_eq!(config.scoring.base_score, 0.5);
        assert_eq!(config.scoring.noise_amplitude, 0.0);
        assert_eq!(config.classify.high, 0.7);
        assert_eq!(config.recommend.block_risk, 0.8);
        assert_eq!(config.pipeline.workers, 4);
    }

    #[test]
    fn test_classify_and_recommend_are_independent() {
        // Tuning one set of thresholds must not reach into the other.
        let mut config = AppConfig::default();
        config.classify.high = 0.9;
        assert_eq!(config.recommend.block_risk, 0.8);
        assert_eq!(config.recommend.review_risk, 0.5);
    }
}

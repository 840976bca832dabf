//! Scoring components: weighted accumulation, probability estimation,
//! classification and recommendation.

pub mod classifier;
pub mod noise;
pub mod probability;
pub mod risk;

pub use classifier::Classifier;
pub use noise::NoiseSource;
pub use probability::FraudProbabilityEstimator;
pub use risk::RiskScorer;

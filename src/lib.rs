//! Fraud Risk Engine Library
//!
//! Risk-scoring and fraud-classification engine for commerce orders and
//! customers: feature extraction, weighted scoring, risk classification,
//! action recommendation, asynchronous analysis and alerting.

pub mod alerts;
pub mod config;
pub mod error;
pub mod features;
pub mod metrics;
pub mod patterns;
pub mod pipeline;
pub mod scoring;
pub mod service;
pub mod types;

pub use alerts::{AlertFilter, AlertLedger};
pub use config::AppConfig;
pub use error::EngineError;
pub use features::{FeatureExtractor, FeatureSet};
pub use metrics::EngineMetrics;
pub use patterns::{FraudPattern, PatternCatalog};
pub use pipeline::{AnalysisPipeline, Analyzer};
pub use types::{
    Alert, AlertSeverity, AlertType, AnalysisReceipt, AnalysisRequest, AnalysisStatus, EntityKind,
    FraudType, Recommendation, RiskAssessment, RiskLevel,
};

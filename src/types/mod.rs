//! Type definitions for the fraud risk engine

pub mod alert;
pub mod assessment;
pub mod request;

pub use alert::{Alert, AlertSeverity, AlertType, SeverityCounts};
pub use assessment::{FraudType, Recommendation, RiskAssessment, RiskLevel};
pub use request::{AnalysisReceipt, AnalysisRequest, AnalysisStatus, EntityKind};

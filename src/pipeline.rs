//! Asynchronous analysis pipeline.
//!
//! A submission is validated synchronously, receives a per-entity sequence
//! number and runs as an independent tokio task through the staged
//! computation: extraction, scoring, classification. Completions are applied
//! in submission order; a stale, slower analysis never overwrites a fresher
//! one. Entities are independent, so there is no cross-entity locking.

use crate::alerts::AlertLedger;
use crate::config::AppConfig;
use crate::error::EngineError;
use crate::features::{self, FeatureExtractor, FeatureSet};
use crate::metrics::EngineMetrics;
use crate::patterns::PatternCatalog;
use crate::scoring::{Classifier, FraudProbabilityEstimator, RiskScorer};
use crate::types::alert::{Alert, AlertSeverity, AlertType};
use crate::types::assessment::{RiskAssessment, RiskLevel};
use crate::types::request::{AnalysisReceipt, AnalysisStatus, EntityKind};
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Synchronous composition of the scoring components.
///
/// This is the seam a real model slots into: anything that can turn a
/// feature set into a score pair can replace the weighted-sum internals
/// without touching the surrounding pipeline.
pub struct Analyzer {
    extractor: FeatureExtractor,
    scorer: RiskScorer,
    estimator: FraudProbabilityEstimator,
    classifier: Classifier,
    catalog: Arc<PatternCatalog>,
}

impl Analyzer {
    pub fn new(config: &AppConfig, catalog: Arc<PatternCatalog>) -> Self {
        Self {
            extractor: FeatureExtractor::new(),
            scorer: RiskScorer::new(config.scoring.clone()),
            estimator: FraudProbabilityEstimator::new(config.probability.clone()),
            classifier: Classifier::new(config.classify.clone(), config.recommend.clone()),
            catalog,
        }
    }

    /// Normalize a validated payload into features.
    pub fn extract(&self, raw: &Map<String, Value>) -> FeatureSet {
        self.extractor.extract(raw)
    }

    /// Run both accumulators: `(risk_score, fraud_probability)`.
    pub fn score(&self, features: &FeatureSet) -> (f64, f64) {
        (
            self.scorer.score(features),
            self.estimator.probability(features),
        )
    }

    /// Combine the score pair into a full assessment.
    pub fn finalize(
        &self,
        entity_id: &str,
        entity_kind: EntityKind,
        features: &FeatureSet,
        risk_score: f64,
        fraud_probability: f64,
    ) -> RiskAssessment {
        let matched_factors = Classifier::match_factors(features);
        let confidence = Classifier::confidence(matched_factors.len());

        RiskAssessment {
            entity_id: entity_id.to_string(),
            entity_kind,
            risk_score,
            fraud_probability,
            risk_level: self.classifier.classify(risk_score),
            fraud_type: Classifier::predict_fraud_type(features, &self.catalog),
            matched_factors,
            recommendation: self.classifier.recommend(risk_score, fraud_probability),
            confidence,
            created_at: Utc::now(),
        }
    }

    /// Full synchronous analysis of a validated payload.
    pub fn assess(
        &self,
        entity_id: &str,
        entity_kind: EntityKind,
        raw: &Map<String, Value>,
    ) -> RiskAssessment {
        let features = self.extract(raw);
        let (risk_score, fraud_probability) = self.score(&features);
        self.finalize(entity_id, entity_kind, &features, risk_score, fraud_probability)
    }
}

#[derive(Default)]
struct EntityRecord {
    /// Highest sequence handed out for this entity.
    last_submitted: u64,
    /// Sequence of the assessment currently visible, 0 if none.
    applied: u64,
    status: Option<AnalysisStatus>,
    assessment: Option<RiskAssessment>,
}

/// Store of analysis results keyed by entity id.
///
/// At most one assessment is visible per entity at any time. Writers carry
/// the sequence number of their submission; `apply` only accepts a result
/// whose sequence exceeds the one already applied, which makes replacement
/// last-submitted-wins rather than last-completed-wins.
pub struct AssessmentStore {
    entries: RwLock<HashMap<String, EntityRecord>>,
}

impl AssessmentStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new submission and return its sequence number.
    pub fn begin(&self, entity_id: &str) -> u64 {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };

        let record = entries.entry(entity_id.to_string()).or_default();
        record.last_submitted += 1;
        record.status = Some(AnalysisStatus::Queued);
        record.last_submitted
    }

    /// Advance the visible status. Only the newest submission drives it;
    /// stale writers are ignored.
    pub fn transition(&self, entity_id: &str, sequence: u64, status: AnalysisStatus) {
        if let Ok(mut entries) = self.entries.write() {
            if let Some(record) = entries.get_mut(entity_id) {
                if record.last_submitted == sequence {
                    record.status = Some(status);
                }
            }
        }
    }

    /// Apply a completed assessment. Returns whether the result became
    /// visible; stale completions are discarded.
    pub fn apply(&self, entity_id: &str, sequence: u64, assessment: RiskAssessment) -> bool {
        let mut entries = match self.entries.write() {
            Ok(entries) => entries,
            Err(poisoned) => poisoned.into_inner(),
        };

        let record = entries.entry(entity_id.to_string()).or_default();
        if sequence <= record.applied {
            return false;
        }

        record.applied = sequence;
        record.assessment = Some(assessment);
        if record.last_submitted == sequence {
            record.status = Some(AnalysisStatus::Stored);
        }
        true
    }

    /// Mark a submission failed. Only the newest, not-yet-applied
    /// submission can surface the failure.
    pub fn fail(&self, entity_id: &str, sequence: u64) {
        if let Ok(mut entries) = self.entries.write() {
            if let Some(record) = entries.get_mut(entity_id) {
                if record.last_submitted == sequence && record.applied < sequence {
                    record.status = Some(AnalysisStatus::Failed);
                }
            }
        }
    }

    /// Fetch the visible assessment for an entity.
    pub fn assessment(&self, entity_id: &str) -> Result<RiskAssessment, EngineError> {
        let entries = self.entries.read().map_err(|_| EngineError::UnknownEntity {
            entity_id: entity_id.to_string(),
        })?;

        let record = entries.get(entity_id).ok_or_else(|| EngineError::UnknownEntity {
            entity_id: entity_id.to_string(),
        })?;

        if let Some(assessment) = &record.assessment {
            return Ok(assessment.clone());
        }

        match record.status {
            Some(AnalysisStatus::Failed) => Err(EngineError::ComputationTimeout {
                entity_id: entity_id.to_string(),
            }),
            _ => Err(EngineError::AnalysisPending {
                entity_id: entity_id.to_string(),
            }),
        }
    }

    /// Current lifecycle status for an entity.
    pub fn status(&self, entity_id: &str) -> Result<AnalysisStatus, EngineError> {
        let entries = self.entries.read().map_err(|_| EngineError::UnknownEntity {
            entity_id: entity_id.to_string(),
        })?;

        entries
            .get(entity_id)
            .and_then(|record| record.status)
            .ok_or_else(|| EngineError::UnknownEntity {
                entity_id: entity_id.to_string(),
            })
    }
}

impl Default for AssessmentStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Orchestrates submissions end to end: validation, staged asynchronous
/// computation, result storage and alert generation.
pub struct AnalysisPipeline {
    analyzer: Arc<Analyzer>,
    store: Arc<AssessmentStore>,
    ledger: Arc<AlertLedger>,
    metrics: Arc<EngineMetrics>,
    timeout: Duration,
}

impl AnalysisPipeline {
    pub fn new(
        config: &AppConfig,
        catalog: Arc<PatternCatalog>,
        ledger: Arc<AlertLedger>,
        metrics: Arc<EngineMetrics>,
    ) -> Self {
        Self {
            analyzer: Arc::new(Analyzer::new(config, catalog)),
            store: Arc::new(AssessmentStore::new()),
            ledger,
            metrics,
            timeout: Duration::from_millis(config.pipeline.timeout_ms),
        }
    }

    /// Submit an entity for analysis.
    ///
    /// Malformed payloads are rejected here, before acceptance; a valid
    /// submission is acknowledged immediately and computed without blocking
    /// the caller. Must be called from within a tokio runtime.
    pub fn submit(
        &self,
        entity_id: &str,
        entity_kind: EntityKind,
        payload: &Value,
    ) -> Result<AnalysisReceipt, EngineError> {
        let raw = features::validate_payload(payload)?.clone();
        let sequence = self.store.begin(entity_id);

        debug!(
            entity_id = %entity_id,
            entity_kind = %entity_kind,
            sequence,
            "Analysis submission accepted"
        );

        let analyzer = self.analyzer.clone();
        let store = self.store.clone();
        let ledger = self.ledger.clone();
        let metrics = self.metrics.clone();
        let timeout = self.timeout;
        let id = entity_id.to_string();

        tokio::spawn(async move {
            let started = Instant::now();
            let work = run_stages(&analyzer, &store, &id, entity_kind, sequence, raw);

            match tokio::time::timeout(timeout, work).await {
                Ok(assessment) => {
                    let risk_score = assessment.risk_score;
                    let risk_level = assessment.risk_level;
                    let visible = store.apply(&id, sequence, assessment);
                    metrics.record_analysis(started.elapsed(), risk_score);

                    if visible && risk_level >= RiskLevel::High {
                        let severity = AlertSeverity::from(risk_level);
                        let alert = Alert::new(
                            AlertType::Fraud,
                            severity,
                            format!("High-risk {entity_kind} detected"),
                        )
                        .with_source_entity(&id);

                        ledger.append(alert);
                        metrics.record_alert(severity.as_str());

                        info!(
                            entity_id = %id,
                            risk_score,
                            risk_level = ?risk_level,
                            "High-risk analysis stored, alert generated"
                        );
                    } else {
                        debug!(
                            entity_id = %id,
                            sequence,
                            risk_score,
                            visible,
                            "Analysis complete"
                        );
                    }
                }
                Err(_) => {
                    store.fail(&id, sequence);
                    warn!(
                        entity_id = %id,
                        sequence,
                        timeout_ms = timeout.as_millis() as u64,
                        "Analysis exceeded latency bound, marked failed"
                    );
                }
            }
        });

        Ok(AnalysisReceipt {
            entity_id: entity_id.to_string(),
            entity_kind,
            sequence,
            status: AnalysisStatus::Queued,
            submitted_at: Utc::now(),
        })
    }

    /// Fetch the visible assessment for an entity.
    pub fn assessment(&self, entity_id: &str) -> Result<RiskAssessment, EngineError> {
        self.store.assessment(entity_id)
    }

    /// Current lifecycle status for an entity.
    pub fn status(&self, entity_id: &str) -> Result<AnalysisStatus, EngineError> {
        self.store.status(entity_id)
    }

    /// Direct access to the scoring seam, mainly for synchronous use.
    pub fn analyzer(&self) -> &Analyzer {
        &self.analyzer
    }
}

/// The staged computation. Yields between stages so the surrounding timeout
/// has cancellation points.
async fn run_stages(
    analyzer: &Analyzer,
    store: &AssessmentStore,
    entity_id: &str,
    entity_kind: EntityKind,
    sequence: u64,
    raw: Map<String, Value>,
) -> RiskAssessment {
    store.transition(entity_id, sequence, AnalysisStatus::Extracting);
    let features = analyzer.extract(&raw);
    tokio::task::yield_now().await;

    store.transition(entity_id, sequence, AnalysisStatus::Scoring);
    let (risk_score, fraud_probability) = analyzer.score(&features);
    tokio::task::yield_now().await;

    store.transition(entity_id, sequence, AnalysisStatus::Classified);
    analyzer.finalize(entity_id, entity_kind, &features, risk_score, fraud_probability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::assessment::{FraudType, Recommendation};
    use serde_json::json;

    fn analyzer() -> Analyzer {
        Analyzer::new(&AppConfig::default(), Arc::new(PatternCatalog::seeded()))
    }

    fn pipeline() -> (AnalysisPipeline, Arc<AlertLedger>, Arc<EngineMetrics>) {
        let ledger = Arc::new(AlertLedger::new());
        let metrics = Arc::new(EngineMetrics::new());
        let pipeline = AnalysisPipeline::new(
            &AppConfig::default(),
            Arc::new(PatternCatalog::seeded()),
            ledger.clone(),
            metrics.clone(),
        );
        (pipeline, ledger, metrics)
    }

    async fn wait_until(mut done: impl FnMut() -> bool) {
        for _ in 0..400 {
            if done() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not reached within 2s");
    }

    fn payload_map(value: &Value) -> Map<String, Value> {
        features::validate_payload(value).unwrap().clone()
    }

    #[test]
    fn test_high_risk_order_scenario() {
        let raw = payload_map(&json!({ "order_value": 1500.0, "new_customer": true }));
        let assessment = analyzer().assess("order_1", EntityKind::Order, &raw);

        assert!((assessment.risk_score - 0.85).abs() < 1e-9);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.recommendation, Recommendation::Block);
        assert_eq!(assessment.fraud_type, FraudType::AccountTakeover);
        assert_eq!(assessment.matched_factors, vec!["new_customer_account"]);
        assert!((assessment.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_no_signal_scenario() {
        let raw = payload_map(&json!({}));
        let assessment = analyzer().assess("order_2", EntityKind::Order, &raw);

        assert_eq!(assessment.risk_score, 0.5);
        assert!((assessment.fraud_probability - 0.1).abs() < 1e-9);
        assert_eq!(assessment.risk_level, RiskLevel::Medium);
        // 0.5 is not strictly above the review threshold.
        assert_eq!(assessment.recommendation, Recommendation::Allow);
        assert_eq!(assessment.fraud_type, FraudType::None);
    }

    #[test]
    fn test_store_applies_in_submission_order() {
        let store = AssessmentStore::new();
        let analyzer = analyzer();

        let first = store.begin("order_9");
        let second = store.begin("order_9");
        assert_eq!((first, second), (1, 2));

        let raw_a = payload_map(&json!({}));
        let raw_b = payload_map(&json!({ "order_value": 1500.0, "new_customer": true }));

        // The second submission completes first.
        assert!(store.apply(
            "order_9",
            second,
            analyzer.assess("order_9", EntityKind::Order, &raw_b)
        ));

        // The first submission finishing late is discarded.
        assert!(!store.apply(
            "order_9",
            first,
            analyzer.assess("order_9", EntityKind::Order, &raw_a)
        ));

        let visible = store.assessment("order_9").unwrap();
        assert!((visible.risk_score - 0.85).abs() < 1e-9);
        assert_eq!(store.status("order_9").unwrap(), AnalysisStatus::Stored);
    }

    #[test]
    fn test_store_read_errors() {
        let store = AssessmentStore::new();

        assert!(matches!(
            store.assessment("ghost"),
            Err(EngineError::UnknownEntity { .. })
        ));

        let sequence = store.begin("order_5");
        assert!(matches!(
            store.assessment("order_5"),
            Err(EngineError::AnalysisPending { .. })
        ));

        store.fail("order_5", sequence);
        assert_eq!(store.status("order_5").unwrap(), AnalysisStatus::Failed);
        assert!(matches!(
            store.assessment("order_5"),
            Err(EngineError::ComputationTimeout { .. })
        ));
    }

    #[tokio::test]
    async fn test_submit_rejects_malformed_payload() {
        let (pipeline, _, _) = pipeline();

        let err = pipeline
            .submit("order_1", EntityKind::Order, &json!("not an object"))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPayload(_)));

        // The rejection happened before acceptance: nothing was recorded.
        assert!(matches!(
            pipeline.status("order_1"),
            Err(EngineError::UnknownEntity { .. })
        ));
    }

    #[tokio::test]
    async fn test_submission_flows_to_stored_result_and_alert() {
        let (pipeline, ledger, _) = pipeline();

        let receipt = pipeline
            .submit(
                "order_42",
                EntityKind::Order,
                &json!({ "order_value": 1500.0, "new_customer": true }),
            )
            .unwrap();
        assert_eq!(receipt.sequence, 1);
        assert_eq!(receipt.status, AnalysisStatus::Queued);

        wait_until(|| pipeline.assessment("order_42").is_ok()).await;

        let assessment = pipeline.assessment("order_42").unwrap();
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(pipeline.status("order_42").unwrap(), AnalysisStatus::Stored);

        // High risk fed the ledger.
        let alerts = ledger.list(&Default::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, AlertSeverity::High);
        assert_eq!(alerts[0].source_entity_id.as_deref(), Some("order_42"));
    }

    #[tokio::test]
    async fn test_low_risk_submission_generates_no_alert() {
        let (pipeline, ledger, _) = pipeline();

        pipeline
            .submit("customer_3", EntityKind::Customer, &json!({}))
            .unwrap();

        wait_until(|| pipeline.assessment("customer_3").is_ok()).await;

        assert_eq!(
            pipeline.assessment("customer_3").unwrap().risk_level,
            RiskLevel::Medium
        );
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_resubmission_wins_even_against_slow_predecessor() {
        let (pipeline, _, metrics) = pipeline();

        pipeline
            .submit("order_7", EntityKind::Order, &json!({}))
            .unwrap();
        pipeline
            .submit(
                "order_7",
                EntityKind::Order,
                &json!({ "order_value": 1500.0, "new_customer": true }),
            )
            .unwrap();

        wait_until(|| {
            metrics
                .analyses_processed
                .load(std::sync::atomic::Ordering::Relaxed)
                == 2
        })
        .await;

        // Whatever order the two tasks finished in, the later submission's
        // result is the visible one.
        let visible = pipeline.assessment("order_7").unwrap();
        assert!((visible.risk_score - 0.85).abs() < 1e-9);
    }
}

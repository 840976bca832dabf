//! NATS service layer.
//!
//! Thin wire plumbing around the engine: JSON envelopes in, JSON envelopes
//! out. Submissions are fire-and-forget with an optional receipt reply;
//! queries use request-reply. Appended alerts are forwarded to a
//! notification subject for downstream consumers.

use crate::alerts::{AlertFilter, AlertLedger};
use crate::config::AppConfig;
use crate::patterns::{FraudPattern, PatternCatalog};
use crate::pipeline::AnalysisPipeline;
use crate::types::alert::{Alert, AlertSeverity, AlertType, SeverityCounts};
use crate::types::request::{AnalysisRequest, EntityKind};
use anyhow::Result;
use async_nats::{Client, Message};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

/// Uniform response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AnalysisQuery {
    #[serde(alias = "order_id", alias = "customer_id")]
    entity_id: String,
}

#[derive(Debug, Deserialize)]
struct PatternQuery {
    #[serde(alias = "pattern_type")]
    category: String,
}

#[derive(Debug, Serialize)]
struct PatternReply {
    category: String,
    patterns: Vec<FraudPattern>,
    total_patterns: usize,
}

#[derive(Debug, Deserialize)]
struct CreateAlertRequest {
    #[serde(rename = "type")]
    alert_type: AlertType,
    severity: AlertSeverity,
    message: String,
    #[serde(default)]
    store_id: Option<String>,
    #[serde(default)]
    source_entity_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateAlertReply {
    alert_id: String,
}

#[derive(Debug, Deserialize)]
struct ResolveAlertRequest {
    alert_id: String,
}

#[derive(Debug, Serialize)]
struct ResolveAlertReply {
    alert_id: String,
    resolved: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ListAlertsRequest {
    #[serde(rename = "type", default)]
    alert_type: Option<AlertType>,
    #[serde(default)]
    severity: Option<AlertSeverity>,
    #[serde(default)]
    store_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct AlertListReply {
    alerts: Vec<Alert>,
    total: usize,
    counts: SeverityCounts,
}

/// Publisher for alert notifications.
#[derive(Clone)]
pub struct AlertPublisher {
    client: Client,
    subject: String,
}

impl AlertPublisher {
    pub fn new(client: Client, subject: &str) -> Self {
        Self {
            client,
            subject: subject.to_string(),
        }
    }

    /// Publish an alert notification.
    pub async fn publish(&self, alert: &Alert) -> Result<()> {
        let payload = serde_json::to_vec(alert)?;

        self.client
            .publish(self.subject.clone(), payload.into())
            .await?;

        debug!(
            alert_id = %alert.alert_id,
            severity = %alert.severity.as_str(),
            "Published alert notification"
        );

        Ok(())
    }
}

/// The engine's wire surface.
pub struct EngineService {
    client: Client,
    config: Arc<AppConfig>,
    pipeline: Arc<AnalysisPipeline>,
    catalog: Arc<PatternCatalog>,
    ledger: Arc<AlertLedger>,
}

impl EngineService {
    pub fn new(
        client: Client,
        config: Arc<AppConfig>,
        pipeline: Arc<AnalysisPipeline>,
        catalog: Arc<PatternCatalog>,
        ledger: Arc<AlertLedger>,
    ) -> Self {
        Self {
            client,
            config,
            pipeline,
            catalog,
            ledger,
        }
    }

    /// Run all subject loops until the connection drops.
    pub async fn run(self: Arc<Self>) -> Result<()> {
        // Forward appended alerts to the notification subject.
        let mut alert_rx = self.ledger.subscribe();
        let publisher =
            AlertPublisher::new(self.client.clone(), &self.config.nats.alert_events_subject);
        tokio::spawn(async move {
            while let Some(alert) = alert_rx.recv().await {
                if let Err(e) = publisher.publish(&alert).await {
                    error!(alert_id = %alert.alert_id, error = %e, "Failed to publish alert");
                }
            }
        });

        let semaphore = Arc::new(Semaphore::new(self.config.pipeline.workers));

        let tasks = vec![
            tokio::spawn(self.clone().submission_loop(
                self.config.nats.order_subject.clone(),
                EntityKind::Order,
                semaphore.clone(),
            )),
            tokio::spawn(self.clone().submission_loop(
                self.config.nats.customer_subject.clone(),
                EntityKind::Customer,
                semaphore,
            )),
            tokio::spawn(
                self.clone()
                    .analysis_query_loop(self.config.nats.analysis_query_subject.clone()),
            ),
            tokio::spawn(
                self.clone()
                    .pattern_query_loop(self.config.nats.pattern_query_subject.clone()),
            ),
            tokio::spawn(
                self.clone()
                    .alert_create_loop(self.config.nats.alert_create_subject.clone()),
            ),
            tokio::spawn(
                self.clone()
                    .alert_resolve_loop(self.config.nats.alert_resolve_subject.clone()),
            ),
            tokio::spawn(
                self.clone()
                    .alert_list_loop(self.config.nats.alert_list_subject.clone()),
            ),
        ];

        for task in tasks {
            task.await??;
        }
        Ok(())
    }

    /// Consume analysis submissions for one entity kind, bounded by the
    /// shared worker semaphore.
    async fn submission_loop(
        self: Arc<Self>,
        subject: String,
        entity_kind: EntityKind,
        semaphore: Arc<Semaphore>,
    ) -> Result<()> {
        let mut subscription = self.client.subscribe(subject.clone()).await?;
        info!(subject = %subject, entity_kind = %entity_kind, "Listening for analysis submissions");

        while let Some(message) = subscription.next().await {
            let permit = semaphore.clone().acquire_owned().await?;
            let service = self.clone();

            tokio::spawn(async move {
                service.handle_submission(entity_kind, message).await;
                drop(permit);
            });
        }

        Ok(())
    }

    async fn handle_submission(&self, entity_kind: EntityKind, message: Message) {
        let response = match serde_json::from_slice::<AnalysisRequest>(&message.payload) {
            Ok(request) => {
                match self
                    .pipeline
                    .submit(&request.entity_id, entity_kind, &request.data)
                {
                    Ok(receipt) => ApiResponse::ok(receipt),
                    Err(e) => {
                        warn!(
                            entity_id = %request.entity_id,
                            error = %e,
                            "Submission rejected"
                        );
                        ApiResponse::err(e.to_string())
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to deserialize analysis request");
                ApiResponse::err(format!("invalid request: {e}"))
            }
        };

        self.reply(&message, &response).await;
    }

    /// Request-reply: fetch a stored assessment by entity id.
    async fn analysis_query_loop(self: Arc<Self>, subject: String) -> Result<()> {
        let mut subscription = self.client.subscribe(subject.clone()).await?;
        info!(subject = %subject, "Listening for analysis queries");

        while let Some(message) = subscription.next().await {
            let response = match serde_json::from_slice::<AnalysisQuery>(&message.payload) {
                Ok(query) => match self.pipeline.assessment(&query.entity_id) {
                    Ok(assessment) => ApiResponse::ok(assessment),
                    Err(e) => ApiResponse::err(e.to_string()),
                },
                Err(e) => ApiResponse::err(format!("invalid request: {e}")),
            };

            self.reply(&message, &response).await;
        }

        Ok(())
    }

    /// Request-reply: list fraud patterns for a category.
    async fn pattern_query_loop(self: Arc<Self>, subject: String) -> Result<()> {
        let mut subscription = self.client.subscribe(subject.clone()).await?;
        info!(subject = %subject, "Listening for pattern queries");

        while let Some(message) = subscription.next().await {
            let response = match serde_json::from_slice::<PatternQuery>(&message.payload) {
                Ok(query) => {
                    let patterns = self.catalog.lookup(&query.category).to_vec();
                    ApiResponse::ok(PatternReply {
                        category: query.category,
                        total_patterns: patterns.len(),
                        patterns,
                    })
                }
                Err(e) => ApiResponse::err(format!("invalid request: {e}")),
            };

            self.reply(&message, &response).await;
        }

        Ok(())
    }

    /// Request-reply: file an alert directly.
    async fn alert_create_loop(self: Arc<Self>, subject: String) -> Result<()> {
        let mut subscription = self.client.subscribe(subject.clone()).await?;
        info!(subject = %subject, "Listening for alert submissions");

        while let Some(message) = subscription.next().await {
            let response = match serde_json::from_slice::<CreateAlertRequest>(&message.payload) {
                Ok(request) => {
                    let mut alert =
                        Alert::new(request.alert_type, request.severity, request.message);
                    if let Some(store_id) = request.store_id {
                        alert = alert.with_store(store_id);
                    }
                    if let Some(entity_id) = request.source_entity_id {
                        alert = alert.with_source_entity(entity_id);
                    }

                    let alert_id = self.ledger.append(alert);
                    ApiResponse::ok(CreateAlertReply { alert_id })
                }
                Err(e) => ApiResponse::err(format!("invalid request: {e}")),
            };

            self.reply(&message, &response).await;
        }

        Ok(())
    }

    /// Request-reply: resolve an alert by id.
    async fn alert_resolve_loop(self: Arc<Self>, subject: String) -> Result<()> {
        let mut subscription = self.client.subscribe(subject.clone()).await?;
        info!(subject = %subject, "Listening for alert resolutions");

        while let Some(message) = subscription.next().await {
            let response = match serde_json::from_slice::<ResolveAlertRequest>(&message.payload) {
                Ok(request) => match self.ledger.resolve(&request.alert_id) {
                    Ok(()) => ApiResponse::ok(ResolveAlertReply {
                        alert_id: request.alert_id,
                        resolved: true,
                    }),
                    Err(e) => ApiResponse::err(e.to_string()),
                },
                Err(e) => ApiResponse::err(format!("invalid request: {e}")),
            };

            self.reply(&message, &response).await;
        }

        Ok(())
    }

    /// Request-reply: list alerts with optional filters plus severity
    /// counts.
    async fn alert_list_loop(self: Arc<Self>, subject: String) -> Result<()> {
        let mut subscription = self.client.subscribe(subject.clone()).await?;
        info!(subject = %subject, "Listening for alert list queries");

        while let Some(message) = subscription.next().await {
            let request = if message.payload.is_empty() {
                Ok(ListAlertsRequest::default())
            } else {
                serde_json::from_slice::<ListAlertsRequest>(&message.payload)
            };

            let response = match request {
                Ok(request) => {
                    let filter = AlertFilter {
                        alert_type: request.alert_type,
                        severity: request.severity,
                        store_id: request.store_id,
                    };
                    let alerts = self.ledger.list(&filter);
                    ApiResponse::ok(AlertListReply {
                        total: alerts.len(),
                        counts: self.ledger.severity_counts(),
                        alerts,
                    })
                }
                Err(e) => ApiResponse::err(format!("invalid request: {e}")),
            };

            self.reply(&message, &response).await;
        }

        Ok(())
    }

    /// Send a reply if the message asked for one.
    async fn reply<T: Serialize>(&self, message: &Message, response: &ApiResponse<T>) {
        let Some(reply) = message.reply.clone() else {
            return;
        };

        match serde_json::to_vec(response) {
            Ok(payload) => {
                if let Err(e) = self.client.publish(reply, payload.into()).await {
                    error!(error = %e, "Failed to publish reply");
                }
            }
            Err(e) => error!(error = %e, "Failed to serialize reply"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_envelope_shape() {
        let ok = ApiResponse::ok(CreateAlertReply {
            alert_id: "a1".to_string(),
        });
        let json = serde_json::to_string(&ok).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"alert_id\":\"a1\""));
        assert!(!json.contains("\"error\""));

        let err: ApiResponse<CreateAlertReply> = ApiResponse::err("no alert found");
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(json.contains("no alert found"));
        assert!(!json.contains("\"data\""));
    }

    #[test]
    fn test_create_alert_request_parsing() {
        let raw = r#"{ "type": "fraud", "severity": "critical", "message": "manual review", "store_id": "store_2" }"#;
        let request: CreateAlertRequest = serde_json::from_str(raw).unwrap();

        assert_eq!(request.alert_type, AlertType::Fraud);
        assert_eq!(request.severity, AlertSeverity::Critical);
        assert_eq!(request.store_id.as_deref(), Some("store_2"));
        assert!(request.source_entity_id.is_none());
    }

    #[test]
    fn test_list_request_defaults_to_no_filters() {
        let request: ListAlertsRequest = serde_json::from_str("{}").unwrap();
        assert!(request.alert_type.is_none());
        assert!(request.severity.is_none());
        assert!(request.store_id.is_none());
    }
}

//! Append-only alert ledger.
//!
//! Shared between the analysis pipeline (high-risk results) and external
//! callers filing alerts directly. Appends go through a single write lock so
//! concurrent producers never lose entries; aggregate views are recomputed
//! from the ledger on every read.

use crate::error::EngineError;
use crate::types::alert::{Alert, AlertSeverity, AlertType, SeverityCounts};
use std::sync::RwLock;
use tokio::sync::mpsc;
use tracing::debug;

/// Filter for listing alerts. Empty filters match everything.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub alert_type: Option<AlertType>,
    pub severity: Option<AlertSeverity>,
    pub store_id: Option<String>,
}

/// Ledger of generated alerts.
pub struct AlertLedger {
    alerts: RwLock<Vec<Alert>>,
    notify: RwLock<Option<mpsc::UnboundedSender<Alert>>>,
}

impl AlertLedger {
    pub fn new() -> Self {
        Self {
            alerts: RwLock::new(Vec::new()),
            notify: RwLock::new(None),
        }
    }

    /// Append an alert and return its id.
    pub fn append(&self, alert: Alert) -> String {
        let alert_id = alert.alert_id.clone();

        if let Ok(notify) = self.notify.read() {
            if let Some(sender) = notify.as_ref() {
                // Receiver may be gone; the ledger entry still lands.
                let _ = sender.send(alert.clone());
            }
        }

        if let Ok(mut alerts) = self.alerts.write() {
            alerts.push(alert);
        }

        debug!(alert_id = %alert_id, "Alert appended to ledger");
        alert_id
    }

    /// Mark an alert resolved.
    ///
    /// One-way and idempotent: resolving an already-resolved alert succeeds
    /// without changing anything.
    pub fn resolve(&self, alert_id: &str) -> Result<(), EngineError> {
        let mut alerts = self.alerts.write().map_err(|_| EngineError::UnknownAlert {
            alert_id: alert_id.to_string(),
        })?;

        match alerts.iter_mut().find(|a| a.alert_id == alert_id) {
            Some(alert) => {
                alert.resolved = true;
                Ok(())
            }
            None => Err(EngineError::UnknownAlert {
                alert_id: alert_id.to_string(),
            }),
        }
    }

    /// List alerts matching a filter, newest first.
    pub fn list(&self, filter: &AlertFilter) -> Vec<Alert> {
        let alerts = match self.alerts.read() {
            Ok(alerts) => alerts,
            Err(_) => return Vec::new(),
        };

        alerts
            .iter()
            .rev()
            .filter(|a| filter.alert_type.map_or(true, |t| a.alert_type == t))
            .filter(|a| filter.severity.map_or(true, |s| a.severity == s))
            .filter(|a| {
                filter
                    .store_id
                    .as_deref()
                    .map_or(true, |s| a.store_id.as_deref() == Some(s))
            })
            .cloned()
            .collect()
    }

    /// Alert counts by severity, derived from the ledger on read.
    pub fn severity_counts(&self) -> SeverityCounts {
        let alerts = match self.alerts.read() {
            Ok(alerts) => alerts,
            Err(_) => return SeverityCounts::default(),
        };

        let mut counts = SeverityCounts::default();
        for alert in alerts.iter() {
            match alert.severity {
                AlertSeverity::Low => counts.low += 1,
                AlertSeverity::Medium => counts.medium += 1,
                AlertSeverity::High => counts.high += 1,
                AlertSeverity::Critical => counts.critical += 1,
            }
        }
        counts
    }

    /// Total number of ledger entries.
    pub fn len(&self) -> usize {
        self.alerts.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Register a channel that receives every subsequently appended alert.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Alert> {
        let (sender, receiver) = mpsc::unbounded_channel();
        if let Ok(mut notify) = self.notify.write() {
            *notify = Some(sender);
        }
        receiver
    }
}

impl Default for AlertLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(severity: AlertSeverity) -> Alert {
        Alert::new(AlertType::Fraud, severity, "test alert")
    }

    #[test]
    fn test_severity_counts_derived_on_read() {
        let ledger = AlertLedger::new();
        ledger.append(sample(AlertSeverity::High));
        ledger.append(sample(AlertSeverity::Medium));
        ledger.append(sample(AlertSeverity::Critical));

        let counts = ledger.severity_counts();
        assert_eq!(counts.high, 1);
        assert_eq!(counts.medium, 1);
        assert_eq!(counts.critical, 1);
        assert_eq!(counts.low, 0);
    }

    #[test]
    fn test_resolve_unknown_id() {
        let ledger = AlertLedger::new();
        let err = ledger.resolve("no-such-alert").unwrap_err();
        assert!(matches!(err, EngineError::UnknownAlert { .. }));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let ledger = AlertLedger::new();
        let alert_id = ledger.append(sample(AlertSeverity::High));

        ledger.resolve(&alert_id).unwrap();
        ledger.resolve(&alert_id).unwrap();

        let alerts = ledger.list(&AlertFilter::default());
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].resolved);
    }

    #[test]
    fn test_list_newest_first() {
        let ledger = AlertLedger::new();
        let first = ledger.append(sample(AlertSeverity::Low));
        let second = ledger.append(sample(AlertSeverity::High));

        let alerts = ledger.list(&AlertFilter::default());
        assert_eq!(alerts[0].alert_id, second);
        assert_eq!(alerts[1].alert_id, first);
    }

    #[test]
    fn test_list_filters() {
        let ledger = AlertLedger::new();
        ledger.append(sample(AlertSeverity::High));
        ledger.append(Alert::new(AlertType::Security, AlertSeverity::Low, "login").with_store("store_7"));

        let fraud_only = ledger.list(&AlertFilter {
            alert_type: Some(AlertType::Fraud),
            ..AlertFilter::default()
        });
        assert_eq!(fraud_only.len(), 1);

        let by_store = ledger.list(&AlertFilter {
            store_id: Some("store_7".to_string()),
            ..AlertFilter::default()
        });
        assert_eq!(by_store.len(), 1);
        assert_eq!(by_store[0].alert_type, AlertType::Security);

        let none = ledger.list(&AlertFilter {
            severity: Some(AlertSeverity::Critical),
            ..AlertFilter::default()
        });
        assert!(none.is_empty());
    }

    #[test]
    fn test_concurrent_appends_lose_nothing() {
        use std::sync::Arc;

        let ledger = Arc::new(AlertLedger::new());
        let mut handles = Vec::new();

        for _ in 0..8 {
            let ledger = ledger.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..50 {
                    ledger.append(sample(AlertSeverity::Low));
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(ledger.len(), 400);
    }

    #[tokio::test]
    async fn test_subscriber_sees_appends() {
        let ledger = AlertLedger::new();
        let mut receiver = ledger.subscribe();

        let alert_id = ledger.append(sample(AlertSeverity::High));

        let received = receiver.recv().await.unwrap();
        assert_eq!(received.alert_id, alert_id);
    }
}

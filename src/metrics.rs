//! Performance metrics and statistics tracking for the risk engine.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

/// Metrics collector for the analysis pipeline.
pub struct EngineMetrics {
    /// Total analyses completed
    pub analyses_processed: AtomicU64,
    /// Total alerts generated
    pub alerts_generated: AtomicU64,
    /// Alerts by severity
    alerts_by_severity: RwLock<HashMap<String, u64>>,
    /// Processing times (in microseconds)
    processing_times: RwLock<Vec<u64>>,
    /// Risk score distribution buckets
    score_buckets: RwLock<[u64; 10]>,
    /// Start time for rate calculation
    start_time: Instant,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            analyses_processed: AtomicU64::new(0),
            alerts_generated: AtomicU64::new(0),
            alerts_by_severity: RwLock::new(HashMap::new()),
            processing_times: RwLock::new(Vec::with_capacity(1000)),
            score_buckets: RwLock::new([0; 10]),
            start_time: Instant::now(),
        }
    }

    /// Record a completed analysis.
    pub fn record_analysis(&self, processing_time: Duration, risk_score: f64) {
        self.analyses_processed.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut times) = self.processing_times.write() {
            times.push(processing_time.as_micros() as u64);
            // Keep only the most recent window
            if times.len() > 10000 {
                times.drain(0..5000);
            }
        }

        let bucket = (risk_score * 10.0).min(9.0) as usize;
        if let Ok(mut buckets) = self.score_buckets.write() {
            buckets[bucket] += 1;
        }
    }

    /// Record a generated alert.
    pub fn record_alert(&self, severity: &str) {
        self.alerts_generated.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut by_severity) = self.alerts_by_severity.write() {
            *by_severity.entry(severity.to_string()).or_insert(0) += 1;
        }
    }

    /// Get processing time statistics.
    pub fn get_processing_stats(&self) -> ProcessingStats {
        let times = match self.processing_times.read() {
            Ok(times) => times,
            Err(_) => return ProcessingStats::default(),
        };
        if times.is_empty() {
            return ProcessingStats::default();
        }

        let mut sorted: Vec<u64> = times.clone();
        sorted.sort();

        let sum: u64 = sorted.iter().sum();
        let count = sorted.len();

        ProcessingStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[(count as f64 * 0.95) as usize],
            p99_us: sorted[(count as f64 * 0.99) as usize],
            max_us: *sorted.last().unwrap_or(&0),
        }
    }

    /// Get current throughput (analyses per second).
    pub fn get_throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.analyses_processed.load(Ordering::Relaxed) as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Get the risk score distribution.
    pub fn get_score_distribution(&self) -> [u64; 10] {
        self.score_buckets.read().map(|b| *b).unwrap_or([0; 10])
    }

    /// Get alert counts by severity.
    pub fn get_alerts_by_severity(&self) -> HashMap<String, u64> {
        self.alerts_by_severity
            .read()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Print summary statistics.
    pub fn print_summary(&self) {
        let analyses = self.analyses_processed.load(Ordering::Relaxed);
        let alerts = self.alerts_generated.load(Ordering::Relaxed);
        let alert_rate = if analyses > 0 {
            (alerts as f64 / analyses as f64) * 100.0
        } else {
            0.0
        };

        let processing = self.get_processing_stats();
        let score_dist = self.get_score_distribution();

        info!(
            analyses = analyses,
            alerts = alerts,
            alert_rate = format!("{:.1}%", alert_rate),
            throughput = format!("{:.1}/s", self.get_throughput()),
            "Engine metrics summary"
        );
        info!(
            mean_us = processing.mean_us,
            p50_us = processing.p50_us,
            p95_us = processing.p95_us,
            p99_us = processing.p99_us,
            "Analysis latency (microseconds)"
        );

        for (severity, count) in self.get_alerts_by_severity() {
            info!(severity = %severity, count = count, "Alerts by severity");
        }

        let total: u64 = score_dist.iter().sum();
        if total > 0 {
            for (i, &count) in score_dist.iter().enumerate() {
                let pct = (count as f64 / total as f64) * 100.0;
                info!(
                    bucket = format!("{:.1}-{:.1}", i as f64 / 10.0, (i + 1) as f64 / 10.0),
                    count = count,
                    pct = format!("{:.1}%", pct),
                    "Risk score distribution"
                );
            }
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Processing time statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub p99_us: u64,
    pub max_us: u64,
}

/// Real-time metrics reporter that prints periodic summaries
pub struct MetricsReporter {
    metrics: std::sync::Arc<EngineMetrics>,
    interval_secs: u64,
}

impl MetricsReporter {
    pub fn new(metrics: std::sync::Arc<EngineMetrics>, interval_secs: u64) -> Self {
        Self {
            metrics,
            interval_secs,
        }
    }

    /// Start the periodic reporting task.
    pub async fn start(self) {
        let mut interval = tokio::time::interval(Duration::from_secs(self.interval_secs));
        loop {
            interval.tick().await;
            self.metrics.print_summary();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = EngineMetrics::new();

        metrics.record_analysis(Duration::from_micros(100), 0.5);
        metrics.record_analysis(Duration::from_micros(200), 0.85);
        metrics.record_alert("high");

        assert_eq!(metrics.analyses_processed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.alerts_generated.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.get_alerts_by_severity().get("high"), Some(&1));
    }

    #[test]
    fn test_score_distribution_buckets() {
        let metrics = EngineMetrics::new();

        metrics.record_analysis(Duration::from_micros(50), 0.05);
        metrics.record_analysis(Duration::from_micros(50), 0.55);
        metrics.record_analysis(Duration::from_micros(50), 1.0);

        let dist = metrics.get_score_distribution();
        assert_eq!(dist[0], 1);
        assert_eq!(dist[5], 1);
        assert_eq!(dist[9], 1);
    }

    #[test]
    fn test_processing_stats() {
        let metrics = EngineMetrics::new();
        for us in [100u64, 200, 300, 400] {
            metrics.record_analysis(Duration::from_micros(us), 0.5);
        }

        let stats = metrics.get_processing_stats();
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean_us, 250);
        assert_eq!(stats.max_us, 400);
    }
}

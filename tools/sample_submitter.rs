//! Sample Submission Producer
//!
//! Generates and publishes order and customer analysis submissions to NATS
//! for exercising the engine end to end.

use rand::Rng;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

/// Generator for analysis submissions.
struct SubmissionGenerator {
    rng: rand::rngs::ThreadRng,
    counter: u64,
}

impl SubmissionGenerator {
    fn new() -> Self {
        Self {
            rng: rand::thread_rng(),
            counter: 0,
        }
    }

    /// Generate a benign order submission.
    fn generate_benign(&mut self) -> (String, Value) {
        self.counter += 1;
        let entity_id = format!("order_{:08}", self.counter);

        let data = json!({
            "order_value": self.rng.gen_range(15.0..400.0),
            "new_customer": self.rng.gen_bool(0.1),
        });

        (entity_id, data)
    }

    /// Generate a suspicious order submission with several signals set.
    fn generate_suspicious(&mut self) -> (String, Value) {
        self.counter += 1;
        let entity_id = format!("order_{:08}", self.counter);

        let data = json!({
            "order_value": self.rng.gen_range(1200.0..8000.0), // High amount
            "high_value": true,
            "new_customer": self.rng.gen_bool(0.7),
            "unusual_timing": self.rng.gen_bool(0.5),          // Night-time orders
            "multiple_addresses": self.rng.gen_bool(0.4),
            "international_shipping": self.rng.gen_bool(0.6),
            "multiple_payment_methods": self.rng.gen_bool(0.5),
            "rapid_ordering": self.rng.gen_bool(0.3),
        });

        (entity_id, data)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_submitter=info".parse()?),
        )
        .init();

    info!("Starting Sample Submission Producer");

    // Parse arguments
    let args: Vec<String> = std::env::args().collect();
    let nats_url = args
        .get(1)
        .map(|s| s.as_str())
        .unwrap_or("nats://localhost:4222");
    let subject = args
        .get(2)
        .map(|s| s.as_str())
        .unwrap_or("fraud.orders.analyze");
    let count: u64 = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(100);
    let suspicious_rate: f64 = args.get(4).and_then(|s| s.parse().ok()).unwrap_or(0.1);
    let delay_ms: u64 = args.get(5).and_then(|s| s.parse().ok()).unwrap_or(100);

    info!(
        nats_url = %nats_url,
        subject = %subject,
        count = count,
        suspicious_rate = suspicious_rate,
        delay_ms = delay_ms,
        "Configuration loaded"
    );

    // Connect to NATS
    let client = match async_nats::connect(nats_url).await {
        Ok(c) => {
            info!("Connected to NATS");
            c
        }
        Err(e) => {
            warn!(error = %e, "Failed to connect to NATS. Running in dry-run mode.");
            return run_dry_mode(count, suspicious_rate, delay_ms).await;
        }
    };

    // Generate and publish submissions
    let mut generator = SubmissionGenerator::new();
    let mut rng = rand::thread_rng();

    info!("Starting to publish {} submissions...", count);

    let mut benign_count = 0;
    let mut suspicious_count = 0;

    for i in 0..count {
        let (entity_id, data) = if rng.gen_bool(suspicious_rate) {
            suspicious_count += 1;
            generator.generate_suspicious()
        } else {
            benign_count += 1;
            generator.generate_benign()
        };

        let envelope = json!({ "order_id": entity_id, "order_data": data });
        let payload = serde_json::to_vec(&envelope)?;

        client.publish(subject.to_string(), payload.into()).await?;

        if (i + 1) % 10 == 0 {
            info!(
                "Published {}/{} submissions ({} benign, {} suspicious)",
                i + 1,
                count,
                benign_count,
                suspicious_count
            );
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    info!(
        "Completed! Published {} submissions ({} benign, {} suspicious)",
        count, benign_count, suspicious_count
    );

    Ok(())
}

async fn run_dry_mode(count: u64, suspicious_rate: f64, delay_ms: u64) -> anyhow::Result<()> {
    info!("Running in dry-run mode (no NATS connection)");

    let mut generator = SubmissionGenerator::new();
    let mut rng = rand::thread_rng();

    for i in 0..count {
        let (entity_id, data) = if rng.gen_bool(suspicious_rate) {
            generator.generate_suspicious()
        } else {
            generator.generate_benign()
        };

        let envelope = json!({ "order_id": entity_id, "order_data": data });
        let json = serde_json::to_string_pretty(&envelope)?;

        if (i + 1) % 10 == 0 || i == 0 {
            info!("Sample submission {}:\n{}", i + 1, json);
        }

        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
    }

    Ok(())
}

//! Static catalog of known fraud patterns.
//!
//! Reference data seeded at startup and never mutated at runtime. Patterns
//! back the explainability fields of an assessment and the fraud-type
//! fallback; they do not feed the score directly.

use crate::features::FeatureSet;
use crate::types::assessment::RiskLevel;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Categories seeded at startup, in fallback-priority order. The catalog
/// itself is keyed by string, so callers can extend it with new categories.
const SEEDED_CATEGORIES: [&str; 3] = ["payment", "behavioral", "geographic"];

/// A named, categorized fraud signature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudPattern {
    pub id: String,
    pub category: String,
    pub name: String,
    pub description: String,
    pub base_risk_level: RiskLevel,
    /// How often the pattern has been observed historically.
    pub observed_frequency: u32,
}

/// Categorized registry of fraud patterns.
pub struct PatternCatalog {
    patterns: HashMap<String, Vec<FraudPattern>>,
}

impl PatternCatalog {
    /// Build the catalog with the known payment, behavioral and geographic
    /// patterns.
    pub fn seeded() -> Self {
        let mut patterns: HashMap<String, Vec<FraudPattern>> = HashMap::new();

        patterns.insert(
            "payment".to_string(),
            vec![
                pattern(
                    "pat-payment-001",
                    "payment",
                    "multiple_payment_methods",
                    "Customer uses multiple payment methods in short time",
                    RiskLevel::High,
                    30,
                ),
                pattern(
                    "pat-payment-002",
                    "payment",
                    "declined_payments",
                    "Multiple payment declines followed by successful payment",
                    RiskLevel::Medium,
                    50,
                ),
            ],
        );

        patterns.insert(
            "behavioral".to_string(),
            vec![
                pattern(
                    "pat-behavioral-001",
                    "behavioral",
                    "rapid_ordering",
                    "Multiple orders placed in very short time intervals",
                    RiskLevel::High,
                    15,
                ),
                pattern(
                    "pat-behavioral-002",
                    "behavioral",
                    "unusual_timing",
                    "Orders placed at unusual hours",
                    RiskLevel::Medium,
                    30,
                ),
            ],
        );

        patterns.insert(
            "geographic".to_string(),
            vec![
                pattern(
                    "pat-geographic-001",
                    "geographic",
                    "multiple_addresses",
                    "Customer uses multiple shipping addresses",
                    RiskLevel::High,
                    19,
                ),
                pattern(
                    "pat-geographic-002",
                    "geographic",
                    "international_shipping",
                    "High-value orders shipped internationally",
                    RiskLevel::Medium,
                    26,
                ),
            ],
        );

        Self { patterns }
    }

    /// Patterns for a category. Unknown categories return the empty slice.
    pub fn lookup(&self, category: &str) -> &[FraudPattern] {
        self.patterns
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Known category names.
    pub fn categories(&self) -> Vec<&str> {
        self.patterns.keys().map(String::as_str).collect()
    }

    /// Total number of registered patterns.
    pub fn pattern_count(&self) -> usize {
        self.patterns.values().map(Vec::len).sum()
    }

    /// Patterns whose signature is triggered by the given features.
    pub fn matched(&self, features: &FeatureSet) -> Vec<&FraudPattern> {
        self.patterns
            .values()
            .flatten()
            .filter(|p| pattern_triggered(&p.name, features))
            .collect()
    }

    /// The seeded category with the most triggered patterns, if any.
    ///
    /// Ties resolve in seeding-priority order: payment, then behavioral,
    /// then geographic.
    pub fn best_matching_category(&self, features: &FeatureSet) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;

        for category in SEEDED_CATEGORIES {
            let hits = self
                .lookup(category)
                .iter()
                .filter(|p| pattern_triggered(&p.name, features))
                .count();

            if hits > 0 && best.map_or(true, |(_, top)| hits > top) {
                best = Some((category, hits));
            }
        }

        best.map(|(category, _)| category)
    }
}

/// Whether a pattern's signature is present in a feature set. Patterns
/// without a corresponding extracted signal never trigger.
fn pattern_triggered(name: &str, features: &FeatureSet) -> bool {
    match name {
        "multiple_payment_methods" => features.multiple_payment_methods,
        "rapid_ordering" => features.rapid_ordering,
        "unusual_timing" => features.unusual_timing,
        "multiple_addresses" => features.multiple_addresses,
        "international_shipping" => features.international_shipping,
        _ => false,
    }
}

fn pattern(
    id: &str,
    category: &str,
    name: &str,
    description: &str,
    base_risk_level: RiskLevel,
    observed_frequency: u32,
) -> FraudPattern {
    FraudPattern {
        id: id.to_string(),
        category: category.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        base_risk_level,
        observed_frequency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_categories() {
        let catalog = PatternCatalog::seeded();

        assert_eq!(catalog.lookup("payment").len(), 2);
        assert_eq!(catalog.lookup("behavioral").len(), 2);
        assert_eq!(catalog.lookup("geographic").len(), 2);
        assert_eq!(catalog.pattern_count(), 6);
    }

    #[test]
    fn test_unknown_category_returns_empty() {
        let catalog = PatternCatalog::seeded();
        assert!(catalog.lookup("astrological").is_empty());
    }

    #[test]
    fn test_matched_patterns() {
        let catalog = PatternCatalog::seeded();
        let features = FeatureSet {
            unusual_timing: true,
            international_shipping: true,
            ..FeatureSet::default()
        };

        let matched = catalog.matched(&features);
        let names: Vec<&str> = matched.iter().map(|p| p.name.as_str()).collect();

        assert_eq!(matched.len(), 2);
        assert!(names.contains(&"unusual_timing"));
        assert!(names.contains(&"international_shipping"));
    }

    #[test]
    fn test_best_matching_category() {
        let catalog = PatternCatalog::seeded();

        let geographic_heavy = FeatureSet {
            multiple_addresses: true,
            international_shipping: true,
            unusual_timing: true,
            ..FeatureSet::default()
        };
        assert_eq!(
            catalog.best_matching_category(&geographic_heavy),
            Some("geographic")
        );

        // One hit per category: priority order wins the tie.
        let tied = FeatureSet {
            multiple_payment_methods: true,
            unusual_timing: true,
            multiple_addresses: true,
            ..FeatureSet::default()
        };
        assert_eq!(catalog.best_matching_category(&tied), Some("payment"));

        assert_eq!(catalog.best_matching_category(&FeatureSet::default()), None);
    }
}

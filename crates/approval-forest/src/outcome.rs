use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Result of a `predict` call, handed to and owned by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct PredictionOutcome {
    pub predicted_label: Option<bool>,
    /// Accuracy percentage in [0, 100].
    pub confidence: f64,
    pub confidence_threshold: f64,
    pub observed_count: usize,
    pub min_count: usize,
    pub outcomes: BTreeMap<String, Value>,
}

impl PredictionOutcome {
    pub fn new(
        predicted_label: bool,
        label_field: &str,
        confidence: f64,
        confidence_threshold: f64,
        observed_count: usize,
        min_count: usize,
    ) -> Self {
        let mut outcomes = BTreeMap::new();
        outcomes.insert(label_field.to_string(), Value::Bool(predicted_label));
        Self {
            predicted_label: Some(predicted_label),
            confidence,
            confidence_threshold,
            observed_count,
            min_count,
            outcomes,
        }
    }

    /// The "not enough information yet" outcome: no label, zero confidence.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_present(&self) -> bool {
        self.predicted_label.is_some()
    }

    /// True when a label is present and its confidence reaches the threshold.
    pub fn is_certain(&self) -> bool {
        self.is_present() && self.confidence >= self.confidence_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_outcome_is_neutral() {
        let outcome = PredictionOutcome::empty();
        assert_eq!(outcome.predicted_label, None);
        assert_eq!(outcome.confidence, 0.0);
        assert!(outcome.outcomes.is_empty());
        assert!(!outcome.is_present());
        assert!(!outcome.is_certain());
    }

    #[test]
    fn certainty_requires_threshold() {
        let outcome = PredictionOutcome::new(true, "approved", 80.0, 90.0, 10, 5);
        assert!(outcome.is_present());
        assert!(!outcome.is_certain());
        assert_eq!(outcome.outcomes.get("approved"), Some(&Value::Bool(true)));

        let outcome = PredictionOutcome::new(false, "approved", 100.0, 100.0, 10, 5);
        assert!(outcome.is_certain());
    }

    #[test]
    fn serializes_to_json() {
        let outcome = PredictionOutcome::new(true, "approved", 50.0, 100.0, 6, 5);
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["predicted_label"], Value::Bool(true));
        assert_eq!(json["outcomes"]["approved"], Value::Bool(true));
        assert_eq!(json["observed_count"], 6);
    }
}

//! Nominal encoding of categorical task inputs.
//!
//! Every feature column and the label get their own `NominalEncoder`, which
//! hands out consecutive integer indices in first-seen order. Indices are
//! never reassigned, so a value keeps its index for the lifetime of the
//! service.
use std::collections::HashMap;

use crate::config::FeatureSchema;
use crate::error::PredictionError;

#[derive(Debug, Clone, Default)]
pub struct NominalEncoder {
    name: String,
    index: HashMap<String, u32>,
    values: Vec<String>,
}

impl NominalEncoder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Return the index of `value`, minting the next unused index on first
    /// occurrence.
    pub fn encode(&mut self, value: &str) -> u32 {
        if let Some(&idx) = self.index.get(value) {
            return idx;
        }
        let idx = self.values.len() as u32;
        self.index.insert(value.to_string(), idx);
        self.values.push(value.to_string());
        log::debug!("Encoder '{}': new category '{}' -> {}", self.name, value, idx);
        idx
    }

    pub fn index_of(&self, value: &str) -> Option<u32> {
        self.index.get(value).copied()
    }

    /// Read-only counterpart of [`encode`](Self::encode): an unseen value maps
    /// to the index it would be given next, without recording it.
    pub fn lookup(&self, value: &str) -> u32 {
        self.index_of(value).unwrap_or(self.values.len() as u32)
    }

    pub fn decode(&self, idx: u32) -> Option<&str> {
        self.values.get(idx as usize).map(String::as_str)
    }
}

/// The encoders for one feature schema plus the label encoder.
#[derive(Debug, Clone)]
pub struct FeatureEncoders {
    features: Vec<NominalEncoder>,
    label: NominalEncoder,
}

impl FeatureEncoders {
    pub fn new(schema: FeatureSchema, label_name: &str) -> Self {
        Self {
            features: schema
                .column_names()
                .iter()
                .map(|name| NominalEncoder::new(name))
                .collect(),
            label: NominalEncoder::new(label_name),
        }
    }

    pub fn arity(&self) -> usize {
        self.features.len()
    }

    pub fn feature(&self, name: &str) -> Option<&NominalEncoder> {
        self.features.iter().find(|enc| enc.name() == name)
    }

    pub fn label(&self) -> &NominalEncoder {
        &self.label
    }

    pub fn encode(&mut self, feature_name: &str, raw: &str) -> Result<u32, PredictionError> {
        self.features
            .iter_mut()
            .find(|enc| enc.name() == feature_name)
            .map(|enc| enc.encode(raw))
            .ok_or_else(|| PredictionError::UnknownFeature(feature_name.to_string()))
    }

    /// Encode a full row of raw values, column by column.
    pub fn encode_row(&mut self, raw: &[String]) -> Result<Vec<u32>, PredictionError> {
        self.check_arity(raw.len())?;
        Ok(self
            .features
            .iter_mut()
            .zip(raw)
            .map(|(enc, value)| enc.encode(value))
            .collect())
    }

    /// Encode a full row without growing any table.
    pub fn lookup_row(&self, raw: &[String]) -> Result<Vec<u32>, PredictionError> {
        self.check_arity(raw.len())?;
        Ok(self
            .features
            .iter()
            .zip(raw)
            .map(|(enc, value)| enc.lookup(value))
            .collect())
    }

    pub fn encode_label(&mut self, raw: &str) -> u32 {
        self.label.encode(raw)
    }

    pub fn decode_label(&self, idx: u32) -> Option<&str> {
        self.label.decode(idx)
    }

    fn check_arity(&self, actual: usize) -> Result<(), PredictionError> {
        if actual != self.features.len() {
            return Err(PredictionError::SchemaMismatch {
                expected: self.features.len(),
                actual,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoding_is_stable_and_consecutive() {
        let mut enc = NominalEncoder::new("user");
        assert_eq!(enc.encode("alice"), 0);
        assert_eq!(enc.encode("bob"), 1);
        assert_eq!(enc.encode("alice"), 0);
        assert_eq!(enc.len(), 2);
    }

    #[test]
    fn lookup_does_not_grow_table() {
        let mut enc = NominalEncoder::new("item");
        enc.encode("pen");
        assert_eq!(enc.lookup("pen"), 0);
        assert_eq!(enc.lookup("laptop"), 1);
        assert_eq!(enc.lookup("desk"), 1);
        assert_eq!(enc.len(), 1);
        assert_eq!(enc.index_of("laptop"), None);
    }

    #[test]
    fn label_round_trips() {
        let mut encoders = FeatureEncoders::new(FeatureSchema::UserItem, "approved");
        let t = encoders.encode_label("true");
        let f = encoders.encode_label("false");
        assert_eq!(encoders.decode_label(t), Some("true"));
        assert_eq!(encoders.decode_label(f), Some("false"));
        assert_eq!(encoders.decode_label(7), None);
    }

    #[test]
    fn columns_are_encoded_independently() {
        let mut encoders = FeatureEncoders::new(FeatureSchema::UserItem, "approved");
        let row = encoders
            .encode_row(&["pen".to_string(), "pen".to_string()])
            .unwrap();
        assert_eq!(row, vec![0, 0]);
        assert_eq!(encoders.encode("item", "desk").unwrap(), 1);
        assert_eq!(encoders.encode("user", "desk").unwrap(), 1);
        assert!(matches!(
            encoders.encode("level", "1"),
            Err(PredictionError::UnknownFeature(_))
        ));
    }

    #[test]
    fn row_arity_is_checked() {
        let mut encoders = FeatureEncoders::new(FeatureSchema::ApprovalKey, "approved");
        assert_eq!(encoders.arity(), 1);
        let err = encoders
            .encode_row(&["a".to_string(), "b".to_string()])
            .unwrap_err();
        assert_eq!(
            err,
            PredictionError::SchemaMismatch {
                expected: 1,
                actual: 2
            }
        );
    }
}

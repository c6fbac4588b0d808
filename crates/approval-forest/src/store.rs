//! Append-only store of encoded training records.
//!
//! Records are kept in arrival order and are never edited or removed. The
//! retrain policy reads the whole store as an `ndarray` feature matrix plus a
//! label vector.
use std::collections::BTreeSet;

use ndarray::{Array2, ShapeError};

use crate::error::PredictionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingRecord {
    features: Vec<u32>,
    label: u32,
}

impl TrainingRecord {
    pub fn new(features: Vec<u32>, label: u32) -> Self {
        Self { features, label }
    }

    pub fn features(&self) -> &[u32] {
        &self.features
    }

    pub fn label(&self) -> u32 {
        self.label
    }
}

#[derive(Debug, Clone)]
pub struct TrainingStore {
    arity: usize,
    records: Vec<TrainingRecord>,
}

impl TrainingStore {
    pub fn new(arity: usize) -> Self {
        Self {
            arity,
            records: Vec::new(),
        }
    }

    /// Append one record and return the new store size.
    ///
    /// # Errors
    ///
    /// Returns `SchemaMismatch` when the feature vector does not have the
    /// arity the store was created with; the store is left unchanged.
    pub fn append(&mut self, features: Vec<u32>, label: u32) -> Result<usize, PredictionError> {
        if features.len() != self.arity {
            return Err(PredictionError::SchemaMismatch {
                expected: self.arity,
                actual: features.len(),
            });
        }
        self.records.push(TrainingRecord::new(features, label));
        Ok(self.records.len())
    }

    pub fn size(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn records(&self) -> &[TrainingRecord] {
        &self.records
    }

    pub fn all_feature_vectors(&self) -> Vec<Vec<u32>> {
        self.records.iter().map(|r| r.features.clone()).collect()
    }

    pub fn all_labels(&self) -> Vec<u32> {
        self.records.iter().map(|r| r.label).collect()
    }

    pub fn distinct_labels(&self) -> usize {
        self.records
            .iter()
            .map(|r| r.label)
            .collect::<BTreeSet<_>>()
            .len()
    }

    /// Feature matrix with one row per record, in arrival order.
    pub fn feature_matrix(&self) -> Result<Array2<f64>, ShapeError> {
        let data = self
            .records
            .iter()
            .flat_map(|r| r.features.iter().map(|&v| v as f64))
            .collect::<Vec<_>>();
        Array2::from_shape_vec((self.records.len(), self.arity), data)
    }
}

//! Decides after each appended record whether a new model is trained.
//!
//! A model needs at least two distinct labels. Once that holds, the whole
//! store is refitted from scratch, either after every sample or, with
//! batching, whenever the store size is a multiple of `retrain_every` (and
//! always while no model exists yet).
use std::sync::Arc;

use anyhow::Result;

use crate::models::classifier_trait::{EnsembleClassifier, TrainedModel};
use crate::store::TrainingStore;

pub enum RetrainDecision {
    /// Fewer than two distinct labels; any previous model stays in place.
    InsufficientClasses,
    /// Waiting for the next batch boundary; the previous model stays in place.
    Deferred,
    Retrained(Arc<dyn TrainedModel>),
}

pub struct RetrainPolicy {
    classifier: Box<dyn EnsembleClassifier>,
    retrain_every: usize,
}

impl RetrainPolicy {
    pub fn new(classifier: Box<dyn EnsembleClassifier>, retrain_every: usize) -> Self {
        RetrainPolicy {
            classifier,
            retrain_every: retrain_every.max(1),
        }
    }

    pub fn maybe_retrain(
        &self,
        store: &TrainingStore,
        model_present: bool,
    ) -> Result<RetrainDecision> {
        if store.distinct_labels() < 2 {
            log::debug!(
                "Skipping retrain: {} samples but fewer than two distinct labels",
                store.size()
            );
            return Ok(RetrainDecision::InsufficientClasses);
        }
        if model_present && store.size() % self.retrain_every != 0 {
            return Ok(RetrainDecision::Deferred);
        }

        log::info!(
            "Retraining {} on {} samples",
            self.classifier.name(),
            store.size()
        );
        let x = store.feature_matrix()?;
        let model = self.classifier.fit(&x, &store.all_labels())?;
        Ok(RetrainDecision::Retrained(model))
    }
}

//! The train/predict facade consumed by the host task system.
//!
//! Training calls are serialised on a mutex guarding the encoders and the
//! training store. Every successful train publishes a fresh immutable
//! `Snapshot` (encoders, model, observed count) behind an `RwLock`, so
//! `predict` only holds the read lock long enough to clone an `Arc` and never
//! sees a half-updated store/model pair.
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

use crate::confidence::accuracy;
use crate::config::PredictorConfig;
use crate::encoding::FeatureEncoders;
use crate::error::PredictionError;
use crate::models::classifier_trait::{EnsembleClassifier, TrainedModel};
use crate::models::factory::build_classifier;
use crate::outcome::PredictionOutcome;
use crate::retrain::{RetrainDecision, RetrainPolicy};
use crate::store::TrainingStore;
use crate::task::{extract_features, extract_label, TaskContext, TaskData};

pub const IDENTIFIER: &str = "RandomForest";

/// Contract between the host task system and a prediction backend.
pub trait PredictionService: Send + Sync {
    fn identifier(&self) -> &str;

    /// Learn from a completed task.
    fn train(&self, task: &TaskContext, inputs: &TaskData, outputs: &TaskData) -> TrainStatus;

    /// Predict the outcome of a task that has not been completed yet.
    fn predict(&self, task: &TaskContext, inputs: &TaskData) -> PredictionOutcome;
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrainStatus {
    /// The task type is not the one this service learns from.
    Ignored,
    /// The sample was stored; the model was left as it was.
    Recorded { store_size: usize },
    /// The sample was stored and a new model replaced the old one.
    Retrained { store_size: usize },
    /// The sample could not be used; store and model are unchanged.
    Rejected(PredictionError),
}

struct TrainingState {
    encoders: Arc<FeatureEncoders>,
    store: TrainingStore,
}

struct Snapshot {
    encoders: Arc<FeatureEncoders>,
    model: Option<Arc<dyn TrainedModel>>,
    observed_count: usize,
}

pub struct TaskPredictor {
    config: PredictorConfig,
    policy: RetrainPolicy,
    training: Mutex<TrainingState>,
    published: RwLock<Arc<Snapshot>>,
}

impl TaskPredictor {
    /// Build a predictor backed by the random forest classifier.
    pub fn new(config: PredictorConfig) -> Result<Self, PredictionError> {
        let classifier = build_classifier(&config);
        Self::with_classifier(config, classifier)
    }

    /// Build a predictor around any ensemble classifier implementation.
    pub fn with_classifier(
        config: PredictorConfig,
        classifier: Box<dyn EnsembleClassifier>,
    ) -> Result<Self, PredictionError> {
        config.validate()?;

        let encoders = Arc::new(FeatureEncoders::new(config.schema, &config.label_field));
        let store = TrainingStore::new(config.schema.arity());
        let snapshot = Snapshot {
            encoders: encoders.clone(),
            model: None,
            observed_count: 0,
        };

        log::info!(
            "Prediction service '{}' ready: task '{}', schema {:?}, {} trees, min count {}",
            IDENTIFIER,
            config.task_name,
            config.schema,
            config.tree_count,
            config.min_count
        );

        Ok(TaskPredictor {
            policy: RetrainPolicy::new(classifier, config.retrain_every),
            config,
            training: Mutex::new(TrainingState { encoders, store }),
            published: RwLock::new(Arc::new(snapshot)),
        })
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn has_model(&self) -> bool {
        self.snapshot().model.is_some()
    }

    pub fn observed_count(&self) -> usize {
        self.snapshot().observed_count
    }

    pub fn store_size(&self) -> usize {
        self.lock_training().store.size()
    }

    fn is_recognized(&self, task: &TaskContext) -> bool {
        task.form_name == self.config.task_name
    }

    fn snapshot(&self) -> Arc<Snapshot> {
        let guard = self.published.read().unwrap_or_else(|poisoned| {
            log::warn!("Recovering poisoned model lock");
            poisoned.into_inner()
        });
        Arc::clone(&guard)
    }

    fn publish(&self, snapshot: Snapshot) {
        let mut guard = self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(snapshot);
    }

    fn lock_training(&self) -> MutexGuard<'_, TrainingState> {
        self.training.lock().unwrap_or_else(|poisoned| {
            log::warn!("Recovering poisoned training lock");
            poisoned.into_inner()
        })
    }

    fn try_train(
        &self,
        task: &TaskContext,
        inputs: &TaskData,
        outputs: &TaskData,
    ) -> Result<TrainStatus, PredictionError> {
        let raw = extract_features(&self.config, task, inputs)?;
        let approved = extract_label(&self.config, outputs)?;

        let mut state = self.lock_training();

        // Stage every mutation so a failed fit leaves the committed state alone.
        let mut encoders = FeatureEncoders::clone(&state.encoders);
        let features = encoders.encode_row(&raw)?;
        let label = encoders.encode_label(&approved.to_string());
        let mut store = state.store.clone();
        let store_size = store.append(features, label)?;

        let current = self.snapshot().model.clone();
        let decision = self
            .policy
            .maybe_retrain(&store, current.is_some())
            .map_err(|e| PredictionError::Training(format!("{:#}", e)))?;

        let (model, status) = match decision {
            RetrainDecision::Retrained(model) => {
                (Some(model), TrainStatus::Retrained { store_size })
            }
            RetrainDecision::InsufficientClasses | RetrainDecision::Deferred => {
                (current, TrainStatus::Recorded { store_size })
            }
        };

        state.encoders = Arc::new(encoders);
        state.store = store;
        self.publish(Snapshot {
            encoders: state.encoders.clone(),
            model,
            observed_count: store_size,
        });

        log::debug!(
            "Train input {:?} = {}; {} samples stored",
            raw,
            approved,
            store_size
        );
        Ok(status)
    }

    fn try_predict(
        &self,
        snapshot: &Snapshot,
        model: &dyn TrainedModel,
        task: &TaskContext,
        inputs: &TaskData,
    ) -> Result<PredictionOutcome, PredictionError> {
        let raw = extract_features(&self.config, task, inputs)?;
        let row = snapshot
            .encoders
            .lookup_row(&raw)?
            .into_iter()
            .map(f64::from)
            .collect::<Vec<_>>();

        let idx = model
            .predict(&row)
            .map_err(|e| PredictionError::Inference(format!("{:#}", e)))?;
        let label = snapshot.encoders.decode_label(idx).ok_or_else(|| {
            PredictionError::Inference(format!("label index {} was never encoded", idx))
        })?;
        let approved = label.parse::<bool>().map_err(|_| {
            PredictionError::Inference(format!("label '{}' is not a boolean", label))
        })?;

        let confidence = accuracy(
            model.out_of_bag_error(),
            snapshot.observed_count,
            self.config.min_count,
        );
        log::debug!(
            "Predict input {:?}: predicting '{}' with accuracy {:.1}%",
            raw,
            approved,
            confidence
        );

        Ok(PredictionOutcome::new(
            approved,
            &self.config.label_field,
            confidence,
            self.config.confidence_threshold,
            snapshot.observed_count,
            self.config.min_count,
        ))
    }
}

impl PredictionService for TaskPredictor {
    fn identifier(&self) -> &str {
        IDENTIFIER
    }

    fn train(&self, task: &TaskContext, inputs: &TaskData, outputs: &TaskData) -> TrainStatus {
        if !self.is_recognized(task) {
            log::debug!("Ignoring training data for task '{}'", task.form_name);
            return TrainStatus::Ignored;
        }
        match self.try_train(task, inputs, outputs) {
            Ok(status) => status,
            Err(err) => {
                log::warn!("Rejected training sample for task '{}': {}", task.form_name, err);
                TrainStatus::Rejected(err)
            }
        }
    }

    fn predict(&self, task: &TaskContext, inputs: &TaskData) -> PredictionOutcome {
        if !self.is_recognized(task) {
            return PredictionOutcome::empty();
        }
        let snapshot = self.snapshot();
        let Some(model) = snapshot.model.as_deref() else {
            log::debug!("No model trained yet for task '{}'", task.form_name);
            return PredictionOutcome::empty();
        };
        match self.try_predict(&snapshot, model, task, inputs) {
            Ok(outcome) => outcome,
            Err(err) => {
                log::warn!("Prediction for task '{}' failed: {}", task.form_name, err);
                PredictionOutcome::empty()
            }
        }
    }
}

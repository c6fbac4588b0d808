//! approval-forest: incremental outcome prediction for human approval tasks.
//!
//! Every completed task is encoded into a nominal feature vector, appended to
//! a growing training store and, once both outcomes have been seen, used to
//! refit a random forest from scratch. Predictions carry an accuracy derived
//! from the forest's out-of-bag error, held at zero until enough samples have
//! been observed.
//!
//! The entry point is [`service::TaskPredictor`], which implements the
//! [`service::PredictionService`] contract consumed by the host task system.
pub mod confidence;
pub mod config;
pub mod encoding;
pub mod error;
pub mod models;
pub mod outcome;
pub mod retrain;
pub mod service;
pub mod store;
pub mod task;

pub use config::{FeatureSchema, PredictorConfig};
pub use error::PredictionError;
pub use outcome::PredictionOutcome;
pub use service::{PredictionService, TaskPredictor, TrainStatus};
pub use task::{TaskContext, TaskData};

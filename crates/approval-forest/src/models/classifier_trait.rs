use std::fmt::Debug;
use std::sync::Arc;

use anyhow::Result;
use ndarray::Array2;

/// Trains an ensemble classifier from scratch on a full feature matrix.
///
/// Labels are the encoded class indices produced by the label encoder. The
/// caller guarantees at least two distinct classes are present.
pub trait EnsembleClassifier: Send + Sync {
    fn fit(&self, x: &Array2<f64>, y: &[u32]) -> Result<Arc<dyn TrainedModel>>;

    /// Optional human readable name for the classifier
    fn name(&self) -> &str {
        "ensemble"
    }
}

/// A fitted model that can be shared between concurrent readers.
pub trait TrainedModel: Send + Sync + Debug {
    /// Predict the encoded label for one feature vector.
    fn predict(&self, row: &[f64]) -> Result<u32>;

    /// Self-reported out-of-bag error in [0, 1]; 0 means no error.
    fn out_of_bag_error(&self) -> f64;
}

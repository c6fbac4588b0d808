use std::error::Error;
use std::fmt;

/// Failures that can occur while turning task data into training records or
/// predictions. None of these escape the service facade; they are reported
/// through `TrainStatus::Rejected` or collapse into an empty outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionError {
    InvalidConfig(String),
    UnencodableInput { field: String, reason: String },
    MissingLabel(String),
    UnknownFeature(String),
    SchemaMismatch { expected: usize, actual: usize },
    Training(String),
    Inference(String),
}

impl fmt::Display for PredictionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PredictionError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            PredictionError::UnencodableInput { field, reason } => {
                write!(f, "Cannot encode field '{}': {}", field, reason)
            }
            PredictionError::MissingLabel(field) => {
                write!(f, "Task output is missing label field '{}'", field)
            }
            PredictionError::UnknownFeature(name) => write!(f, "Unknown feature column '{}'", name),
            PredictionError::SchemaMismatch { expected, actual } => write!(
                f,
                "Feature vector has {} values but the schema expects {}",
                actual, expected
            ),
            PredictionError::Training(msg) => write!(f, "Classifier training failed: {}", msg),
            PredictionError::Inference(msg) => write!(f, "Classifier inference failed: {}", msg),
        }
    }
}

impl Error for PredictionError {}

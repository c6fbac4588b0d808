use crate::config::PredictorConfig;
use crate::models::classifier_trait::EnsembleClassifier;
use crate::models::random_forest::RandomForestClassifier;

/// Build the boxed ensemble classifier described by a `PredictorConfig`.
pub fn build_classifier(config: &PredictorConfig) -> Box<dyn EnsembleClassifier> {
    Box::new(RandomForestClassifier::new(config.tree_count, config.seed))
}

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::PredictionError;

/// Which categorical inputs make up a feature vector.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FeatureSchema {
    /// Two columns: the requester and the requested item.
    #[default]
    UserItem,
    /// One column holding a composite `(requester, level)` key.
    ApprovalKey,
}

impl FeatureSchema {
    pub fn column_names(&self) -> &'static [&'static str] {
        match self {
            FeatureSchema::UserItem => &["user", "item"],
            FeatureSchema::ApprovalKey => &["approval_key"],
        }
    }

    pub fn arity(&self) -> usize {
        self.column_names().len()
    }
}

impl FromStr for FeatureSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "user_item" => Ok(FeatureSchema::UserItem),
            "approval_key" => Ok(FeatureSchema::ApprovalKey),
            _ => Err(format!(
                "Unknown feature schema: {}. Expected one of: user_item, approval_key",
                s
            )),
        }
    }
}

/// Central configuration for the prediction service.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PredictorConfig {
    /// Form name of the only task type that is trained on and predicted.
    pub task_name: String,
    pub schema: FeatureSchema,
    /// Number of trees grown on every retrain.
    pub tree_count: usize,
    /// Confidence stays at zero until this many samples have been observed.
    pub min_count: usize,
    /// Confidence (0..=100) at or above which a prediction counts as certain.
    pub confidence_threshold: f64,
    /// Retrain once every `retrain_every` samples (1 = after every sample).
    pub retrain_every: usize,
    /// Fixed forest seed. A fresh random seed is drawn per retrain when unset.
    pub seed: Option<u64>,

    pub item_field: String,
    pub requester_field: String,
    pub actor_field: String,
    pub level_field: String,
    pub label_field: String,
    pub default_item: String,
    pub default_level: String,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            task_name: "ManagerApproval".to_string(),
            schema: FeatureSchema::UserItem,
            tree_count: 100,
            min_count: 5,
            confidence_threshold: 100.0,
            retrain_every: 1,
            seed: None,
            item_field: "item".to_string(),
            requester_field: "requestor".to_string(),
            actor_field: "ActorId".to_string(),
            level_field: "level".to_string(),
            label_field: "approved".to_string(),
            default_item: "apple".to_string(),
            default_level: "0".to_string(),
        }
    }
}

impl PredictorConfig {
    pub fn new(schema: FeatureSchema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check the numeric settings before the service is built.
    pub fn validate(&self) -> Result<(), PredictionError> {
        if self.tree_count == 0 {
            return Err(PredictionError::InvalidConfig(
                "tree_count must be at least 1".to_string(),
            ));
        }
        if self.tree_count > u16::MAX as usize {
            return Err(PredictionError::InvalidConfig(format!(
                "tree_count must not exceed {}",
                u16::MAX
            )));
        }
        if self.retrain_every == 0 {
            return Err(PredictionError::InvalidConfig(
                "retrain_every must be at least 1".to_string(),
            ));
        }
        if !self.confidence_threshold.is_finite()
            || !(0.0..=100.0).contains(&self.confidence_threshold)
        {
            return Err(PredictionError::InvalidConfig(format!(
                "confidence_threshold must lie in [0, 100], got {}",
                self.confidence_threshold
            )));
        }
        Ok(())
    }
}

/// Load a predictor configuration from a JSON file.
pub fn load_predictor_config<P: AsRef<Path>>(path: P) -> Result<PredictorConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: PredictorConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config: {}", path.as_ref().display()))?;
    Ok(config)
}

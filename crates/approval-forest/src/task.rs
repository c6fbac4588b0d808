//! Task metadata supplied by the host and extraction of the raw categorical
//! values that make up a feature vector.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{FeatureSchema, PredictorConfig};
use crate::error::PredictionError;

/// Key-value task inputs or outputs as handed over by the host.
pub type TaskData = HashMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskContext {
    /// Form name identifying the task type.
    pub form_name: String,
    /// Actor who owns the task, used when the input names no requester.
    pub actor_id: Option<String>,
}

impl TaskContext {
    pub fn new(form_name: &str) -> Self {
        Self {
            form_name: form_name.to_string(),
            actor_id: None,
        }
    }

    pub fn with_actor(mut self, actor_id: &str) -> Self {
        self.actor_id = Some(actor_id.to_string());
        self
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Read a field as text. Missing and null fields are `None`.
fn field_text(data: &TaskData, field: &str) -> Result<Option<String>, PredictionError> {
    match data.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(PredictionError::UnencodableInput {
            field: field.to_string(),
            reason: format!("expected a string, got {}", kind(other)),
        }),
    }
}

fn requester(
    config: &PredictorConfig,
    task: &TaskContext,
    inputs: &TaskData,
) -> Result<String, PredictionError> {
    if let Some(user) = field_text(inputs, &config.requester_field)? {
        return Ok(user);
    }
    if let Some(actor) = field_text(inputs, &config.actor_field)? {
        log::debug!(
            "No '{}' input, falling back to '{}' = {}",
            config.requester_field,
            config.actor_field,
            actor
        );
        return Ok(actor);
    }
    task.actor_id
        .clone()
        .ok_or_else(|| PredictionError::UnencodableInput {
            field: config.requester_field.clone(),
            reason: "no requester and no actor id on the task".to_string(),
        })
}

/// Raw categorical values in schema column order.
pub fn extract_features(
    config: &PredictorConfig,
    task: &TaskContext,
    inputs: &TaskData,
) -> Result<Vec<String>, PredictionError> {
    let user = requester(config, task, inputs)?;
    match config.schema {
        FeatureSchema::UserItem => {
            let item = field_text(inputs, &config.item_field)?.unwrap_or_else(|| {
                log::debug!(
                    "No '{}' input, using default '{}'",
                    config.item_field,
                    config.default_item
                );
                config.default_item.clone()
            });
            Ok(vec![user, item])
        }
        FeatureSchema::ApprovalKey => {
            let level = field_text(inputs, &config.level_field)?
                .unwrap_or_else(|| config.default_level.clone());
            Ok(vec![approval_key(&user, &level)])
        }
    }
}

fn escape_key_part(part: &str) -> String {
    part.replace('\\', "\\\\").replace('#', "\\#")
}

/// Composite key for the single-column schema. `\` and `#` inside either part
/// are backslash-escaped, so distinct pairs never share a key.
pub fn approval_key(user: &str, level: &str) -> String {
    format!("{}#{}", escape_key_part(user), escape_key_part(level))
}

/// Read the boolean decision from the task outputs.
pub fn extract_label(config: &PredictorConfig, outputs: &TaskData) -> Result<bool, PredictionError> {
    let field = &config.label_field;
    match outputs.get(field) {
        None | Some(Value::Null) => Err(PredictionError::MissingLabel(field.clone())),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::String(s)) => match s.trim().to_lowercase().as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            _ => Err(PredictionError::UnencodableInput {
                field: field.clone(),
                reason: format!("'{}' is not a boolean", s),
            }),
        },
        Some(other) => Err(PredictionError::UnencodableInput {
            field: field.clone(),
            reason: format!("expected a boolean, got {}", kind(other)),
        }),
    }
}

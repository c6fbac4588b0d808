//! Replay a CSV log of completed approvals through the prediction service.
//!
//! Usage: `replay_approvals [approvals.csv] [config.json]`
//!
//! Every row is first predicted (as if the task were still open) and then
//! used for training, so the output shows how predictions evolve as the
//! corpus grows. Without a CSV a small built-in log is replayed.
use anyhow::{Context, Result};
use csv::ReaderBuilder;
use log::LevelFilter;
use serde::Deserialize;
use serde_json::json;

use approval_forest::config::load_predictor_config;
use approval_forest::{PredictionService, PredictorConfig, TaskContext, TaskData, TaskPredictor};

#[derive(Debug, Deserialize)]
struct ApprovalRow {
    requestor: String,
    item: Option<String>,
    approved: bool,
}

const BUILTIN_LOG: &str = "requestor,item,approved
alice,pen,true
bob,laptop,false
alice,laptop,true
carol,pen,true
bob,pen,false
alice,desk,true
bob,desk,false
carol,laptop,true
bob,laptop,false
alice,pen,true
";

fn main() -> Result<()> {
    env_logger::Builder::default()
        .filter_level(LevelFilter::Warn)
        .parse_env(env_logger::Env::default().filter_or("APPROVAL_FOREST_LOG", "warn"))
        .init();

    let mut args = std::env::args().skip(1);
    let csv_path = args.next();
    let config = match args.next() {
        Some(path) => load_predictor_config(&path)?,
        None => PredictorConfig::default(),
    };
    let task_name = config.task_name.clone();
    let predictor = TaskPredictor::new(config)?;

    let content = match &csv_path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read approval log: {}", path))?,
        None => BUILTIN_LOG.to_string(),
    };
    let mut reader = ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let task = TaskContext::new(&task_name);
    for (line, row) in reader.deserialize::<ApprovalRow>().enumerate() {
        let row = row.with_context(|| format!("Malformed approval row {}", line + 1))?;

        let mut inputs = TaskData::new();
        inputs.insert("requestor".to_string(), json!(row.requestor));
        if let Some(item) = &row.item {
            inputs.insert("item".to_string(), json!(item));
        }
        let mut outputs = TaskData::new();
        outputs.insert("approved".to_string(), json!(row.approved));

        let outcome = predictor.predict(&task, &inputs);
        let status = predictor.train(&task, &inputs, &outputs);
        println!(
            "{:>3} {:<10} {:<10} actual={:<5} predicted={:<5} confidence={:>6.2}% {:?}",
            line + 1,
            row.requestor,
            row.item.as_deref().unwrap_or("-"),
            row.approved,
            outcome
                .predicted_label
                .map(|l| l.to_string())
                .unwrap_or_else(|| "-".to_string()),
            outcome.confidence,
            status
        );
    }

    Ok(())
}

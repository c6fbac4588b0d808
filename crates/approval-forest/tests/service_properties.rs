//! Integration tests for the train/predict facade backed by the random forest.

use std::sync::Arc;
use std::thread;

use approval_forest::{
    FeatureSchema, PredictionOutcome, PredictionService, PredictorConfig, TaskContext, TaskData,
    TaskPredictor, TrainStatus,
};
use serde_json::json;

fn config() -> PredictorConfig {
    PredictorConfig {
        tree_count: 25,
        ..PredictorConfig::default()
    }
    .with_seed(7)
}

fn approval_task() -> TaskContext {
    TaskContext::new("ManagerApproval")
}

fn inputs(user: &str, item: &str) -> TaskData {
    let mut data = TaskData::new();
    data.insert("requestor".to_string(), json!(user));
    data.insert("item".to_string(), json!(item));
    data
}

fn decision(approved: bool) -> TaskData {
    let mut data = TaskData::new();
    data.insert("approved".to_string(), json!(approved));
    data
}

// ---------------------------------------------------------------------------
// Store bookkeeping
// ---------------------------------------------------------------------------

#[test]
fn store_size_counts_only_recognized_tasks() {
    let predictor = TaskPredictor::new(config()).unwrap();
    let approval = approval_task();
    let other = TaskContext::new("TravelRequest");
    let mut recognized = 0;
    for i in 0..9 {
        let task = if i % 3 == 0 { &other } else { &approval };
        let status = predictor.train(task, &inputs("alice", "pen"), &decision(i % 2 == 0));
        if task.form_name == "ManagerApproval" {
            recognized += 1;
            assert_ne!(status, TrainStatus::Ignored);
        } else {
            assert_eq!(status, TrainStatus::Ignored);
        }
    }
    assert_eq!(predictor.store_size(), recognized);
    assert_eq!(predictor.observed_count(), recognized);
}

// ---------------------------------------------------------------------------
// Model availability
// ---------------------------------------------------------------------------

#[test]
fn predict_before_training_is_empty() {
    let predictor = TaskPredictor::new(config()).unwrap();
    let outcome = predictor.predict(&approval_task(), &inputs("alice", "pen"));
    assert_eq!(outcome, PredictionOutcome::empty());
    assert_eq!(outcome.predicted_label, None);
    assert_eq!(outcome.confidence, 0.0);
}

#[test]
fn single_label_corpus_has_no_model() {
    let predictor = TaskPredictor::new(config()).unwrap();
    for user in ["alice", "bob", "carol", "dave", "erin", "frank"] {
        predictor.train(&approval_task(), &inputs(user, "pen"), &decision(true));
    }
    assert!(!predictor.has_model());
    assert_eq!(predictor.store_size(), 6);
    assert!(!predictor
        .predict(&approval_task(), &inputs("alice", "pen"))
        .is_present());
}

#[test]
fn alice_and_bob_produce_a_model() {
    let predictor = TaskPredictor::new(config()).unwrap();
    predictor.train(&approval_task(), &inputs("alice", "pen"), &decision(true));
    let status = predictor.train(&approval_task(), &inputs("bob", "pen"), &decision(false));
    assert_eq!(status, TrainStatus::Retrained { store_size: 2 });
    assert!(predictor.has_model());
    assert_eq!(predictor.store_size(), 2);
}

// ---------------------------------------------------------------------------
// Confidence gating
// ---------------------------------------------------------------------------

#[test]
fn four_samples_report_zero_confidence() {
    let predictor = TaskPredictor::new(config()).unwrap();
    for (user, approved) in [("alice", true), ("bob", false), ("alice", true), ("bob", false)] {
        predictor.train(&approval_task(), &inputs(user, "pen"), &decision(approved));
    }
    for user in ["alice", "bob", "nobody"] {
        let outcome = predictor.predict(&approval_task(), &inputs(user, "pen"));
        assert!(outcome.is_present());
        assert_eq!(outcome.confidence, 0.0);
        assert_eq!(outcome.observed_count, 4);
        assert_eq!(outcome.min_count, 5);
        assert!(!outcome.is_certain());
    }
}

#[test]
fn confidence_is_reported_once_min_count_reached() {
    let predictor = TaskPredictor::new(config()).unwrap();
    for i in 0..8 {
        let approved = i % 2 == 0;
        let user = if approved { "alice" } else { "bob" };
        predictor.train(&approval_task(), &inputs(user, "pen"), &decision(approved));
    }
    let outcome = predictor.predict(&approval_task(), &inputs("alice", "pen"));
    assert!((0.0..=100.0).contains(&outcome.confidence));
    assert_eq!(outcome.confidence_threshold, 100.0);
    assert_eq!(outcome.outcomes.get("approved"), Some(&json!(outcome.predicted_label.unwrap())));
}

// ---------------------------------------------------------------------------
// Learning
// ---------------------------------------------------------------------------

#[test]
fn approval_key_schema_learns_per_requester_decisions() {
    let predictor = TaskPredictor::new(PredictorConfig {
        schema: FeatureSchema::ApprovalKey,
        ..config()
    })
    .unwrap();
    for _ in 0..6 {
        predictor.train(&approval_task(), &inputs("alice", "pen"), &decision(true));
        predictor.train(&approval_task(), &inputs("bob", "pen"), &decision(false));
    }
    assert_eq!(
        predictor
            .predict(&approval_task(), &inputs("alice", "laptop"))
            .predicted_label,
        Some(true)
    );
    assert_eq!(
        predictor
            .predict(&approval_task(), &inputs("bob", "laptop"))
            .predicted_label,
        Some(false)
    );
}

#[test]
fn requester_falls_back_to_actor_id() {
    let predictor = TaskPredictor::new(config()).unwrap();
    let task = approval_task().with_actor("alice");
    let mut no_requester = TaskData::new();
    no_requester.insert("item".to_string(), json!("pen"));
    assert_eq!(
        predictor.train(&task, &no_requester, &decision(true)),
        TrainStatus::Recorded { store_size: 1 }
    );
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

#[test]
fn concurrent_train_and_predict_keep_store_consistent() {
    let predictor = Arc::new(
        TaskPredictor::new(PredictorConfig {
            tree_count: 5,
            ..config()
        })
        .unwrap(),
    );

    let handles = (0..4)
        .map(|worker| {
            let predictor = Arc::clone(&predictor);
            thread::spawn(move || {
                for i in 0..10 {
                    let approved = (worker + i) % 2 == 0;
                    let user = format!("user{}", worker);
                    predictor.train(&approval_task(), &inputs(&user, "pen"), &decision(approved));
                    let outcome = predictor.predict(&approval_task(), &inputs(&user, "pen"));
                    assert!(outcome.observed_count <= 40);
                }
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(predictor.store_size(), 40);
    assert_eq!(predictor.observed_count(), 40);
    assert!(predictor.has_model());
}

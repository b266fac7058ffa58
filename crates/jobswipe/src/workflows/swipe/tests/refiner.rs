use std::sync::Arc;

use serde_json::json;

use super::common::*;
use crate::workflows::swipe::domain::MatchScore;
use crate::workflows::swipe::refiner::{
    MatchScoreRefiner, RefineError, RefineOutcome, RefineRequest,
};

fn request(score: f64) -> RefineRequest {
    RefineRequest {
        initial_match_score: score,
        job_description: "Backend engineer working on Rust payment services.".to_string(),
        candidate_profile: "Three years of Rust and PostgreSQL.".to_string(),
    }
}

fn refiner(script: Vec<Scripted>) -> (MatchScoreRefiner<Arc<ScriptedCompletion>>, Arc<ScriptedCompletion>) {
    let completion = Arc::new(ScriptedCompletion::new(script));
    (
        MatchScoreRefiner::new(Arc::clone(&completion), refiner_config()),
        completion,
    )
}

#[tokio::test]
async fn refined_score_and_reasoning_are_returned() {
    let (refiner, completion) = refiner(vec![Scripted::Respond(json!({
        "refinedMatchScore": 88,
        "reasoning": "Strong overlap on Rust and SQL."
    }))]);

    let refined = refiner.refine(&request(76.0)).await.expect("refined");
    assert_eq!(refined.refined_match_score.value(), 88.0);
    assert_eq!(
        refined.reasoning.as_deref(),
        Some("Strong overlap on Rust and SQL.")
    );
    assert!(!refined.clamped);
    assert_eq!(completion.calls(), 1);
}

#[tokio::test]
async fn prompt_embeds_all_three_inputs() {
    let (refiner, completion) =
        refiner(vec![Scripted::Respond(json!({ "refinedMatchScore": 70 }))]);
    refiner.refine(&request(76.0)).await.expect("refined");

    let prompts = completion.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Backend engineer working on Rust payment services."));
    assert!(prompts[0].contains("Three years of Rust and PostgreSQL."));
    assert!(prompts[0].contains("76"));
}

#[tokio::test(start_paused = true)]
async fn one_retry_after_transport_failure() {
    let (refiner, completion) = refiner(vec![
        Scripted::Fail("connection reset"),
        Scripted::Respond(json!({ "refinedMatchScore": 64.5 })),
    ]);

    let refined = refiner.refine(&request(80.0)).await.expect("second try");
    assert_eq!(refined.refined_match_score.value(), 64.5);
    assert_eq!(completion.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn retries_are_bounded() {
    let (refiner, completion) = refiner(vec![
        Scripted::Fail("down"),
        Scripted::Fail("still down"),
        Scripted::Respond(json!({ "refinedMatchScore": 99 })),
    ]);

    let err = refiner.refine(&request(80.0)).await.expect_err("gives up");
    assert!(matches!(err, RefineError::Completion(_)));
    assert_eq!(completion.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn hanging_backend_times_out() {
    let (refiner, completion) = refiner(vec![Scripted::Hang, Scripted::Hang]);

    let err = refiner.refine(&request(80.0)).await.expect_err("timeout");
    assert!(matches!(err, RefineError::Timeout(_)));
    assert_eq!(completion.calls(), 2);
}

#[tokio::test]
async fn out_of_range_output_is_clamped_and_flagged() {
    let (refiner, _) = refiner(vec![Scripted::Respond(json!({ "refinedMatchScore": 140 }))]);

    let refined = refiner.refine(&request(90.0)).await.expect("clamped");
    assert_eq!(refined.refined_match_score.value(), 100.0);
    assert!(refined.clamped);
}

#[tokio::test]
async fn invalid_initial_score_never_reaches_backend() {
    let (refiner, completion) =
        refiner(vec![Scripted::Respond(json!({ "refinedMatchScore": 50 }))]);

    let err = refiner.refine(&request(120.0)).await.expect_err("invalid");
    assert!(matches!(err, RefineError::InvalidInput(_)));

    let err = refiner.refine(&request(f64::NAN)).await.expect_err("invalid");
    assert!(matches!(err, RefineError::InvalidInput(_)));
    assert_eq!(completion.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn malformed_output_keeps_initial_score() {
    let (refiner, completion) = refiner(vec![
        Scripted::Respond(json!({ "score": 90 })),
        Scripted::Respond(json!({ "refinedMatchScore": "high" })),
    ]);
    let initial = MatchScore::new(74.0).expect("valid");

    let outcome = refiner
        .refine_or_keep(initial, "job text", "profile text")
        .await;

    match &outcome {
        RefineOutcome::KeptInitial { score, reason } => {
            assert_eq!(*score, initial);
            assert!(reason.contains("schema"));
        }
        RefineOutcome::Refined(_) => panic!("malformed output must not refine"),
    }
    assert_eq!(outcome.score(), initial);
    assert_eq!(completion.calls(), 2);
}

#[tokio::test]
async fn refine_or_keep_passes_through_success() {
    let (refiner, _) = refiner(vec![Scripted::Respond(json!({ "refinedMatchScore": 91 }))]);
    let initial = MatchScore::new(74.0).expect("valid");

    let outcome = refiner.refine_or_keep(initial, "job", "profile").await;
    assert!(matches!(outcome, RefineOutcome::Refined(_)));
    assert_eq!(outcome.score().value(), 91.0);
}

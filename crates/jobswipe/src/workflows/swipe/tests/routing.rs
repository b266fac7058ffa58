use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::swipe::router::{self, swipe_router};

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).expect("serialize body")))
        .expect("request")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

async fn open_session(router: &axum::Router) -> String {
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/swipe/sessions",
            json!({ "candidateId": "cand-1", "skills": ["Rust"] }),
        ))
        .await
        .expect("response");
    assert_status(&response, StatusCode::CREATED);
    let body = read_json_body(response).await;
    body["sessionId"].as_str().expect("session id").to_string()
}

#[tokio::test]
async fn open_session_returns_snapshot() {
    let router = swipe_router(Arc::new(build_service(live_jobs()).service));

    let response = router
        .oneshot(post_json(
            "/api/v1/swipe/sessions",
            json!({ "candidateId": "cand-1" }),
        ))
        .await
        .expect("response");

    assert_status(&response, StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["state"], "ready");
    assert_eq!(body["source"], "live");
    assert_eq!(body["remaining"], 3);
    assert_eq!(body["top"]["id"], "job-1");
    assert_eq!(body["top"]["roleType"], "full-time");
}

#[tokio::test]
async fn blank_candidate_is_a_bad_request() {
    let router = swipe_router(Arc::new(build_service(live_jobs()).service));
    let response = router
        .oneshot(post_json(
            "/api/v1/swipe/sessions",
            json!({ "candidateId": " " }),
        ))
        .await
        .expect("response");
    assert_status(&response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn swipe_settle_and_undo_over_http() {
    let harness = build_service(live_jobs());
    let applications = harness.applications.clone();
    let router = swipe_router(Arc::new(harness.service));
    let session = open_session(&router).await;

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/swipe/sessions/{session}/swipe"),
            json!({ "direction": "left" }),
        ))
        .await
        .expect("response");
    assert_status(&response, StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["outcome"], "committed");
    assert_eq!(body["remaining"], 2);
    assert_eq!(body["applicationQueued"], false);

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/swipe/sessions/{session}/swipe"),
            json!({ "direction": "right" }),
        ))
        .await
        .expect("response");
    assert_status(&response, StatusCode::CONFLICT);

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/swipe/sessions/{session}/settle"),
            json!({}),
        ))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body["settled"], "left");

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/swipe/sessions/{session}/undo"),
            json!({}),
        ))
        .await
        .expect("response");
    assert_status(&response, StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["jobId"], "job-1");
    assert_eq!(body["applicationRetained"], false);
    assert!(applications.all().is_empty());
}

#[tokio::test]
async fn drag_and_release_report_feedback() {
    let router = swipe_router(Arc::new(build_service(live_jobs()).service));
    let session = open_session(&router).await;

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/swipe/sessions/{session}/drag"),
            json!({ "offsetX": 75.0 }),
        ))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body["feedback"]["like_intensity"], 0.5);
    assert_eq!(body["preview"], Value::Null);

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/swipe/sessions/{session}/release"),
            json!({ "velocityX": 10.0 }),
        ))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body["outcome"], "snapped_back");
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let router = swipe_router(Arc::new(build_service(live_jobs()).service));
    let response = router
        .oneshot(get("/api/v1/swipe/sessions/session-999999"))
        .await
        .expect("response");
    assert_status(&response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn closing_a_session_returns_no_content() {
    let router = swipe_router(Arc::new(build_service(live_jobs()).service));
    let session = open_session(&router).await;

    let response = router
        .clone()
        .oneshot(
            Request::delete(format!("/api/v1/swipe/sessions/{session}"))
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_status(&response, StatusCode::NO_CONTENT);

    let response = router
        .oneshot(get(&format!("/api/v1/swipe/sessions/{session}")))
        .await
        .expect("response");
    assert_status(&response, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn feed_route_reports_demo_fallback() {
    let router = swipe_router(Arc::new(build_service(Vec::new()).service));
    let response = router
        .oneshot(get("/api/v1/candidates/cand-1/feed"))
        .await
        .expect("response");

    assert_status(&response, StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["source"], "demo");
    assert_eq!(body["size"], 5);
}

#[tokio::test]
async fn review_and_applicant_routes() {
    let applications = MemoryApplications::seeded(vec![
        application_for("cand-1", "job-1", 64.0),
        application_for("cand-2", "job-2", 93.0),
    ]);
    let harness = build_service_with(live_jobs(), applications);
    let first_id = harness.applications.all()[0].id.0.clone();
    let router = swipe_router(Arc::new(harness.service));

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/applications/{first_id}/review"),
            json!({ "status": "pending" }),
        ))
        .await
        .expect("response");
    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/applications/{first_id}/review"),
            json!({ "status": "accepted" }),
        ))
        .await
        .expect("response");
    assert_status(&response, StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "accepted");

    let response = router
        .clone()
        .oneshot(get("/api/v1/recruiters/rec-1/applicants"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body[0]["matchScore"], 93.0);
    assert_eq!(body[0]["tier"], "strong");

    let response = router
        .clone()
        .oneshot(get("/api/v1/recruiters/rec-1/applicants?jobId=job-1"))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["status"], "accepted");

    let response = router
        .oneshot(get(&format!("/api/v1/applications/{first_id}")))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body["tier"], "moderate");
    assert_eq!(body["application"]["jobId"], "job-1");
}

#[tokio::test]
async fn refine_route_requires_configured_backend() {
    let router = swipe_router(Arc::new(build_service(live_jobs()).service));
    let response = router
        .oneshot(post_json(
            "/api/v1/match-score/refine",
            json!({
                "initialMatchScore": 70,
                "jobDescription": "job",
                "candidateProfile": "profile"
            }),
        ))
        .await
        .expect("response");
    assert_status(&response, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn refine_route_returns_refined_score() {
    let completion = Arc::new(ScriptedCompletion::new(vec![Scripted::Respond(json!({
        "refinedMatchScore": 105,
        "reasoning": "Exceeds every requirement."
    }))]));
    let service = Arc::new(build_refining_service(live_jobs(), completion).service);

    let response = router::refine_handler(
        State(service),
        axum::Json(crate::workflows::swipe::refiner::RefineRequest {
            initial_match_score: 88.0,
            job_description: "job".to_string(),
            candidate_profile: "profile".to_string(),
        }),
    )
    .await;

    assert_status(&response, StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["refinedMatchScore"], 100.0);
    assert_eq!(body["clamped"], true);
}

#[tokio::test]
async fn refine_handler_rejects_out_of_range_input() {
    let completion = Arc::new(ScriptedCompletion::default());
    let service = Arc::new(build_refining_service(live_jobs(), Arc::clone(&completion)).service);

    let response = router::refine_handler(
        State(service),
        axum::Json(crate::workflows::swipe::refiner::RefineRequest {
            initial_match_score: -3.0,
            job_description: "job".to_string(),
            candidate_profile: "profile".to_string(),
        }),
    )
    .await;

    assert_status(&response, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(completion.calls(), 0);
}

#[tokio::test]
async fn snapshot_handler_serves_existing_session() {
    let harness = build_service(live_jobs());
    let service = Arc::new(harness.service);
    let snapshot = service.open_session(candidate()).expect("opens");

    let response =
        router::snapshot_handler(State(Arc::clone(&service)), Path(snapshot.session_id.0.clone()))
            .await;
    assert_status(&response, StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["candidateId"], "cand-1");
    assert_eq!(body["canUndo"], false);
}

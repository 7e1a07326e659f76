use super::common::*;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::workflows::ACTOR_HEADER;

fn request(method: &str, uri: &str, actor: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(ACTOR_HEADER, actor);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("serialize")))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

#[tokio::test]
async fn program_lifecycle_over_http() {
    let harness = Harness::new();
    let outbox = harness.outbox.clone();
    let router = router_for(harness);

    let response = router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/programs",
            "mentor-1",
            Some(json!({ "title": "Staff engineering", "max_participants": 1 })),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let program = read_json_body(response).await;
    assert_eq!(program["available_slots"], json!(1));
    assert_eq!(program["accepting_applications"], json!(true));
    let program_id = program["id"].as_str().expect("id").to_string();

    let mut application_ids = Vec::new();
    for member in ["member-0", "member-1"] {
        let response = router
            .clone()
            .oneshot(request(
                "POST",
                &format!("/api/v1/programs/{program_id}/applications"),
                member,
                None,
            ))
            .await
            .expect("route executes");
        assert_eq!(response.status(), StatusCode::CREATED);
        let application = read_json_body(response).await;
        assert_eq!(application["status"], json!("submitted"));
        application_ids.push(application["id"].as_str().expect("id").to_string());
    }

    let response = router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/applications/{}/admit", application_ids[0]),
            "mentor-1",
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["status"], json!("admitted"));

    let response = router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/applications/{}/admit", application_ids[1]),
            "mentor-1",
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = read_json_body(response).await;
    assert_eq!(body["code"], json!("program_full"));

    let response = router
        .clone()
        .oneshot(request(
            "GET",
            &format!("/api/v1/programs/{program_id}"),
            "member-1",
            None,
        ))
        .await
        .expect("route executes");
    let view = read_json_body(response).await;
    assert_eq!(view["current_participants"], json!(1));
    assert_eq!(view["is_full"], json!(true));
    assert_eq!(view["accepting_applications"], json!(false));

    let response = router
        .oneshot(request(
            "GET",
            &format!("/api/v1/programs/{program_id}/applications"),
            "mentor-1",
            None,
        ))
        .await
        .expect("route executes");
    let listed = read_json_body(response).await;
    assert_eq!(listed.as_array().expect("array").len(), 2);

    assert_eq!(outbox.drain().len(), 1);
}

#[tokio::test]
async fn withdraw_and_patch_routes() {
    let harness = Harness::new();
    let program = harness.program(2);
    let application = harness.apply_many(&program, 1).remove(0);
    let router = router_for(harness);

    let response = router
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/v1/programs/{}", program.id),
            "mentor-1",
            Some(json!({ "max_participants": 5 })),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["max_participants"], json!(5));

    let response = router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/v1/applications/{}/withdraw", application.id),
            "member-0",
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["status"], json!("withdrawn"));

    let response = router
        .oneshot(request(
            "POST",
            &format!("/api/v1/applications/{}/reject", application.id),
            "mentor-1",
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn deadline_refusal_is_gone() {
    let harness = Harness::new();
    let program = harness.program(2);
    let late = harness.at(now() + chrono::Duration::days(30));
    let router = crate::workflows::mentorship::mentorship_router(std::sync::Arc::new(late));

    let response = router
        .oneshot(request(
            "POST",
            &format!("/api/v1/programs/{}/applications", program.id),
            "member-4",
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::GONE);
    assert_eq!(
        read_json_body(response).await["code"],
        json!("deadline_passed")
    );
}

#[tokio::test]
async fn null_deadline_in_patch_clears_it() {
    let harness = Harness::new();
    let program = harness.program(2);
    let late = harness.at(now() + chrono::Duration::days(30));
    let router = router_for(harness);

    let response = router
        .clone()
        .oneshot(request(
            "PATCH",
            &format!("/api/v1/programs/{}", program.id),
            "mentor-1",
            Some(json!({ "max_participants": 3 })),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(read_json_body(response).await["application_deadline"].is_string());

    let response = router
        .oneshot(request(
            "PATCH",
            &format!("/api/v1/programs/{}", program.id),
            "mentor-1",
            Some(json!({ "application_deadline": null })),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["application_deadline"], Value::Null);
    assert_eq!(body["max_participants"], json!(3));

    late.submit_application(&program.id, &applicant(4))
        .expect("no deadline left to miss");
}

#[tokio::test]
async fn unknown_program_is_not_found() {
    let router = router_for(Harness::new());
    let response = router
        .oneshot(request(
            "GET",
            &format!("/api/v1/programs/{}", uuid::Uuid::new_v4()),
            "member-0",
            None,
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

//! Behavioural tests for the `sys_user` endpoints through the full stack.

mod support;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use admin_backend::domain::ports::FixtureUserRepository;
use admin_backend::domain::{Environment, TimeZone};
use rstest::{fixture, rstest};
use serde_json::json;
use support::{init_app, send, settings};

#[fixture]
fn repo() -> Arc<FixtureUserRepository> {
    Arc::new(FixtureUserRepository::default())
}

#[rstest]
#[actix_web::test]
async fn created_user_can_be_fetched_and_listed(repo: Arc<FixtureUserRepository>) {
    let app = init_app(settings(Environment::Development), repo).await;
    let (status, _, created) = send(
        &app,
        TestRequest::post()
            .uri("/api/v1/sys/users")
            .set_json(json!({"username": "grace"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let id = created["data"]["id"].as_str().expect("generated id").to_owned();
    // Clock is fixed at 12:00 UTC; Shanghai is UTC+8.
    assert_eq!(created["data"]["createTime"], "2024-11-22 20:00:00");

    let (status, _, fetched) =
        send(&app, TestRequest::get().uri(&format!("/api/v1/sys/users/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["data"], created["data"]);

    let (_, _, listed) = send(&app, TestRequest::get().uri("/api/v1/sys/users?username=grace")).await;
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(1));

    let (_, _, later) = send(
        &app,
        TestRequest::get().uri("/api/v1/sys/users?createdAfter=2024-11-22%2020:00:00"),
    )
    .await;
    assert_eq!(later["data"], json!([]));
}

#[rstest]
#[actix_web::test]
async fn responses_use_configured_zone(repo: Arc<FixtureUserRepository>) {
    let mut config = settings(Environment::Development);
    config.timezone = TimeZone::from_name("Europe/London")
        .expect("known zone")
        .with_format("%d/%m/%Y %H:%M");
    let app = init_app(config, repo).await;
    let (_, _, created) = send(
        &app,
        TestRequest::post()
            .uri("/api/v1/sys/users")
            .set_json(json!({"username": "linus"})),
    )
    .await;
    assert_eq!(created["data"]["createTime"], "22/11/2024 12:00");
}

#[rstest]
#[actix_web::test]
async fn type_errors_in_the_body_are_validation_failures(repo: Arc<FixtureUserRepository>) {
    let app = init_app(settings(Environment::Development), repo).await;
    let (status, _, body) = send(
        &app,
        TestRequest::post()
            .uri("/api/v1/sys/users")
            .set_json(json!({"username": 42})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["data"]["errors"][0]["type"], "invalid_type");
    assert_eq!(body["data"]["errors"][0]["loc"], json!(["body", "username"]));
    let msg = body["msg"].as_str().expect("summary message");
    assert!(
        msg.starts_with("Invalid request parameters: username "),
        "{msg}"
    );
}

#[rstest]
#[actix_web::test]
async fn non_object_bodies_are_located_at_the_root(repo: Arc<FixtureUserRepository>) {
    let app = init_app(settings(Environment::Development), repo).await;
    let (status, _, body) = send(
        &app,
        TestRequest::post()
            .uri("/api/v1/sys/users")
            .set_json(json!("linus")),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["data"]["errors"][0]["type"], "invalid_type");
    assert_eq!(body["data"]["errors"][0]["loc"], json!(["body"]));
}

#[rstest]
#[actix_web::test]
async fn overlong_usernames_are_rejected_with_context(repo: Arc<FixtureUserRepository>) {
    let app = init_app(settings(Environment::Development), repo).await;
    let (status, _, body) = send(
        &app,
        TestRequest::post()
            .uri("/api/v1/sys/users")
            .set_json(json!({"username": "a".repeat(21)})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let error = &body["data"]["errors"][0];
    assert_eq!(error["type"], "string_too_long");
    assert_eq!(error["ctx"]["max_length"], 20);
}

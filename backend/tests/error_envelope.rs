//! End-to-end checks of the error envelope under both verbosity modes.

mod support;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use admin_backend::domain::Environment;
use admin_backend::domain::ports::FixtureUserRepository;
use rstest::rstest;
use serde_json::json;
use support::{init_app, send, settings};

#[rstest]
#[actix_web::test]
async fn dev_validation_lists_raw_errors() {
    let app = init_app(
        settings(Environment::Development),
        Arc::new(FixtureUserRepository::default()),
    )
    .await;
    let (status, _, body) = send(
        &app,
        TestRequest::post()
            .uri("/api/v1/sys/users")
            .set_json(json!({"operator": "admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], 422);
    assert_eq!(
        body["msg"],
        "Invalid request parameters: username field required, input: null"
    );
    assert_eq!(body["data"]["errors"][0]["type"], "missing");
}

#[rstest]
#[actix_web::test]
async fn prod_validation_hides_error_list() {
    let app = init_app(
        settings(Environment::Production),
        Arc::new(FixtureUserRepository::default()),
    )
    .await;
    let (status, _, body) = send(
        &app,
        TestRequest::post()
            .uri("/api/v1/sys/users")
            .set_json(json!({"operator": "admin"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["data"], json!(null));
    assert_eq!(body["msg"], "Invalid request parameters: field required");
}

#[rstest]
#[case(Environment::Development, json!({"code": 404, "msg": "Not Found", "data": null, "trace_id": "-"}))]
#[case(Environment::Production, json!({"code": 400, "msg": "Bad request", "data": null, "trace_id": "-"}))]
#[actix_web::test]
async fn unknown_routes_follow_verbosity(
    #[case] environment: Environment,
    #[case] expected: serde_json::Value,
) {
    let app = init_app(
        settings(environment),
        Arc::new(FixtureUserRepository::default()),
    )
    .await;
    let (status, _, body) = send(&app, TestRequest::get().uri("/missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, expected);
}

#[rstest]
#[case(Environment::Development, json!({"code": 405, "msg": "Method Not Allowed", "data": null, "trace_id": "-"}))]
#[case(Environment::Production, json!({"code": 400, "msg": "Bad request", "data": null, "trace_id": "-"}))]
#[actix_web::test]
async fn unsupported_methods_follow_verbosity(
    #[case] environment: Environment,
    #[case] expected: serde_json::Value,
) {
    let app = init_app(
        settings(environment),
        Arc::new(FixtureUserRepository::default()),
    )
    .await;
    for request in [
        TestRequest::put().uri("/api/v1/sys/users"),
        TestRequest::delete().uri("/api/v1/sys/users/u1"),
    ] {
        let (status, _, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, expected);
    }
}

#[rstest]
#[case(Environment::Development)]
#[case(Environment::Production)]
#[actix_web::test]
async fn application_errors_are_identical_in_both_modes(#[case] environment: Environment) {
    let app = init_app(
        settings(environment),
        Arc::new(FixtureUserRepository::default()),
    )
    .await;
    let (status, _, body) = send(&app, TestRequest::get().uri("/api/v1/sys/users/ghost")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    insta::allow_duplicates! {
        insta::assert_json_snapshot!(body, @r#"
        {
          "code": 404,
          "data": {
            "id": "ghost"
          },
          "msg": "User not found",
          "trace_id": "-"
        }
        "#);
    }
}

#[rstest]
#[actix_web::test]
async fn wrong_content_type_is_an_http_exception() {
    let app = init_app(
        settings(Environment::Development),
        Arc::new(FixtureUserRepository::default()),
    )
    .await;
    let (status, _, body) = send(
        &app,
        TestRequest::post()
            .uri("/api/v1/sys/users")
            .insert_header(("content-type", "text/plain"))
            .set_payload("username=alice"),
    )
    .await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["code"], 415);
}

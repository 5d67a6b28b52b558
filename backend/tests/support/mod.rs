//! Shared helpers for HTTP integration tests.
//!
//! Builds the production middleware stack around an in-memory repository so
//! suites exercise the same wiring as the binary.

use std::sync::Arc;

use actix_http::Request;
use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use admin_backend::domain::ports::FixtureUserRepository;
use admin_backend::domain::{Environment, UserService};
use admin_backend::inbound::http::{HttpState, configure, not_found};
use admin_backend::middleware::{AccessLog, ExceptionHandlers, Trace};
use admin_backend::settings::Settings;
use chrono::{DateTime, TimeZone as _, Utc};
use mockable::{Clock, MockClock};
use serde_json::Value;

pub type TestResponse = ServiceResponse<EitherBody<BoxBody>>;

pub fn fixed_clock(at: DateTime<Utc>) -> Arc<dyn Clock> {
    let mut clock = MockClock::new();
    clock.expect_utc().return_const(at);
    Arc::new(clock)
}

pub fn noon_utc() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 22, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub fn settings(environment: Environment) -> Settings {
    Settings {
        environment,
        ..Settings::default()
    }
}

pub async fn init_app(
    settings: Settings,
    repo: Arc<FixtureUserRepository>,
) -> impl Service<Request, Response = TestResponse, Error = actix_web::Error> {
    let service = UserService::new(repo, fixed_clock(noon_utc()));
    let state = HttpState::new(Arc::new(service), settings.timezone.clone());
    test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .wrap(ExceptionHandlers::new(
                settings.environment,
                settings.trace.clone(),
            ))
            .wrap(AccessLog)
            .wrap(Trace::new(settings.trace.clone()))
            .configure(configure)
            .default_service(web::to(not_found)),
    )
    .await
}

pub async fn send<S>(app: &S, req: TestRequest) -> (StatusCode, Option<String>, Value)
where
    S: Service<Request, Response = TestResponse, Error = actix_web::Error>,
{
    let res = test::call_service(app, req.to_request()).await;
    let status = res.status();
    let echoed = res
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let body = test::read_body_json(res).await;
    (status, echoed, body)
}

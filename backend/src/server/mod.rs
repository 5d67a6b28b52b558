//! Server construction and middleware wiring.

mod config;

pub use config::ServerConfig;

use std::sync::Arc;

use actix_web::body::{BoxBody, EitherBody};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::DefaultClock;
use tracing::{info, warn};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[cfg(debug_assertions)]
use admin_backend::ApiDoc;
use admin_backend::domain::UserService;
use admin_backend::domain::ports::{FixtureUserRepository, UserRepository};
use admin_backend::inbound::http::{HttpState, configure, not_found};
use admin_backend::middleware::{AccessLog, ExceptionHandlers, Trace};
use admin_backend::outbound::persistence::{DbPool, DieselUserRepository};
use admin_backend::settings::Settings;

fn build_repository(pool: Option<DbPool>) -> Arc<dyn UserRepository> {
    match pool {
        Some(pool) => Arc::new(DieselUserRepository::new(pool)),
        None => {
            warn!("DATABASE_URL not set; using in-memory sys_user repository");
            Arc::new(FixtureUserRepository::default())
        }
    }
}

fn build_app(
    settings: &Settings,
    http_state: web::Data<HttpState>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<EitherBody<BoxBody>>,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    let app = App::new()
        .app_data(http_state)
        .wrap(ExceptionHandlers::new(
            settings.environment,
            settings.trace.clone(),
        ))
        .wrap(AccessLog)
        .wrap(Trace::new(settings.trace.clone()))
        .configure(configure)
        .default_service(web::to(not_found));

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server from `config`.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(config: ServerConfig) -> std::io::Result<Server> {
    let ServerConfig { settings, db_pool } = config;
    let service = UserService::new(build_repository(db_pool), Arc::new(DefaultClock));
    let http_state = web::Data::new(HttpState::new(
        Arc::new(service),
        settings.timezone.clone(),
    ));
    let bind_addr = settings.bind_addr;
    info!(
        %bind_addr,
        environment = %settings.environment,
        timezone = settings.timezone.tz().name(),
        "starting admin backend"
    );

    let server = HttpServer::new(move || build_app(&settings, http_state.clone()))
        .bind(bind_addr)?
        .run();
    Ok(server)
}

//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod state;
pub mod users;
pub mod validation;

use actix_web::web;

use crate::domain::AppError;

pub use error::ApiResult;
pub use state::{HttpState, State};

/// Register the `/api/v1` routes and the query and path error hooks.
///
/// Each path is one resource so a known path with an unsupported method
/// answers 405 rather than falling through to the 404 default.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use admin_backend::inbound::http::configure;
///
/// let app = App::new().configure(configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(validation::query_config())
        .app_data(validation::path_config())
        .service(
            web::scope("/api/v1")
                .service(
                    web::resource("/sys/users")
                        .route(web::post().to(users::create_user))
                        .route(web::get().to(users::list_users))
                        .default_service(web::to(method_not_allowed)),
                )
                .service(
                    web::resource("/sys/users/{id}")
                        .route(web::get().to(users::get_user))
                        .default_service(web::to(method_not_allowed)),
                ),
        );
}

/// Fallback for unmatched routes, rendered through the error envelope.
pub async fn not_found() -> ApiResult<web::Json<()>> {
    Err(AppError::http(404, "Not Found"))
}

/// Fallback for a known path requested with an unsupported method.
pub async fn method_not_allowed() -> ApiResult<web::Json<()>> {
    Err(AppError::http(405, "Method Not Allowed"))
}

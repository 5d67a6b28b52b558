//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers the `sys_user` endpoints together with the success and
//! error envelopes every endpoint answers with. Swagger UI serves it under
//! `/docs` in debug builds.

use utoipa::OpenApi;

use crate::domain::ErrorEnvelope;
use crate::inbound::http::users::{CreateUserRequest, UserDto};

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Admin backend API",
        description = "System user administration with a uniform error envelope."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::list_users,
    ),
    components(schemas(UserDto, CreateUserRequest, ErrorEnvelope)),
    tags(
        (name = "sys_users", description = "System user administration")
    )
)]
pub struct ApiDoc;

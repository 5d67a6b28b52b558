//! `sys_user` API handlers.
//!
//! ```text
//! POST /api/v1/sys/users {"username":"alice","operator":"admin"}
//! GET  /api/v1/sys/users/{id}
//! GET  /api/v1/sys/users?username=alice&createdAfter=2024-11-22%2000:10:22
//! ```
//!
//! Timestamps are parsed and rendered in the configured zone using its
//! datetime format.

use actix_web::web;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::domain::{
    ApiResponse, AppError, AuditName, CreateUser, ErrorEnvelope, SysUser, TimeZone,
    TimeZoneError, UserId, UserListFilter, Username, ValidationError,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::State;
use crate::inbound::http::validation::{JsonBody, Source, field_error};

/// Request body for `POST /api/v1/sys/users`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[schema(example = "alice")]
    pub username: String,
    /// Recorded as `create_user`/`update_user`; `system` when omitted.
    #[schema(example = "admin")]
    pub operator: Option<String>,
}

impl TryFrom<CreateUserRequest> for CreateUser {
    type Error = AppError;

    fn try_from(value: CreateUserRequest) -> Result<Self, Self::Error> {
        let username = Username::new(value.username.as_str());
        let operator = value.operator.as_deref().map(AuditName::new).transpose();
        match (username, operator) {
            (Ok(username), Ok(operator)) => Ok(Self { username, operator }),
            (username, operator) => {
                let mut errors = Vec::new();
                if let Err(err) = username {
                    errors.push(field_error(Source::Body, "username", &err, &value.username));
                }
                if let Err(err) = operator {
                    let input = value.operator.as_deref().unwrap_or_default();
                    errors.push(field_error(Source::Body, "operator", &err, input));
                }
                Err(AppError::Validation(errors))
            }
        }
    }
}

/// Query string for `GET /api/v1/sys/users`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Exact username match.
    pub username: Option<String>,
    /// Only users created strictly after this local datetime.
    #[param(example = "2024-11-22 00:10:22")]
    pub created_after: Option<String>,
}

impl ListUsersQuery {
    fn into_filter(self, timezone: &TimeZone) -> Result<UserListFilter, AppError> {
        let mut errors = Vec::new();
        let username = match self.username.as_deref().map(Username::new).transpose() {
            Ok(username) => username,
            Err(err) => {
                let input = self.username.as_deref().unwrap_or_default();
                errors.push(field_error(Source::Query, "username", &err, input));
                None
            }
        };
        let created_after = match self.created_after.as_deref() {
            None => None,
            Some(input) => match timezone.parse_default(input) {
                Ok(local) => Some(TimeZone::to_utc(&local)),
                Err(err) => {
                    errors.push(datetime_error(input, timezone, &err));
                    None
                }
            },
        };
        if errors.is_empty() {
            Ok(UserListFilter {
                username,
                created_after,
            })
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

fn datetime_error(input: &str, timezone: &TimeZone, err: &TimeZoneError) -> ValidationError {
    ValidationError::new(
        "datetime_parsing",
        ["query", "createdAfter"],
        format!("Input should be a valid datetime, {err}"),
        json!(input),
    )
    .with_ctx("format", timezone.format())
    .with_ctx("error", err.to_string())
}

/// `sys_user` as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    #[schema(example = "3fa85f6457174562b3fc2c963f66afa6")]
    pub id: String,
    #[schema(example = "alice")]
    pub username: String,
    #[schema(example = "system")]
    pub create_user: String,
    #[schema(example = "system")]
    pub update_user: String,
    /// Creation time in the configured zone.
    #[schema(example = "2024-11-22 08:10:22")]
    pub create_time: String,
    #[schema(example = "2024-11-22 08:10:22")]
    pub update_time: String,
}

impl UserDto {
    /// Render `user` with timestamps in `timezone`.
    #[must_use]
    pub fn render(user: &SysUser, timezone: &TimeZone) -> Self {
        let local = |time: DateTime<Utc>| {
            timezone
                .to_zone(&time)
                .format(timezone.format())
                .to_string()
        };
        Self {
            id: user.id().to_string(),
            username: user.username().to_string(),
            create_user: user.create_user().to_string(),
            update_user: user.update_user().to_string(),
            create_time: local(user.create_time()),
            update_time: local(user.update_time()),
        }
    }
}

/// Create a user.
#[utoipa::path(
    post,
    path = "/api/v1/sys/users",
    request_body = CreateUserRequest,
    responses(
        (status = 200, description = "Created user", body = ApiResponse<UserDto>),
        (status = 409, description = "User already exists", body = ErrorEnvelope),
        (status = 422, description = "Invalid request parameters", body = ErrorEnvelope),
        (status = 500, description = "Internal server error", body = ErrorEnvelope)
    ),
    tags = ["sys_users"],
    operation_id = "createSysUser"
)]
pub async fn create_user(
    state: State,
    payload: JsonBody<CreateUserRequest>,
) -> ApiResult<web::Json<ApiResponse<UserDto>>> {
    let command = CreateUser::try_from(payload.into_inner())?;
    let user = state.users.create(command).await?;
    Ok(web::Json(ApiResponse::success(UserDto::render(
        &user,
        &state.timezone,
    ))))
}

/// Fetch one user by id.
#[utoipa::path(
    get,
    path = "/api/v1/sys/users/{id}",
    params(("id" = String, Path, description = "User id", max_length = 32)),
    responses(
        (status = 200, description = "User", body = ApiResponse<UserDto>),
        (status = 404, description = "User not found", body = ErrorEnvelope),
        (status = 422, description = "Invalid request parameters", body = ErrorEnvelope),
        (status = 500, description = "Internal server error", body = ErrorEnvelope)
    ),
    tags = ["sys_users"],
    operation_id = "getSysUser"
)]
pub async fn get_user(
    state: State,
    path: web::Path<String>,
) -> ApiResult<web::Json<ApiResponse<UserDto>>> {
    let raw = path.into_inner();
    let id = UserId::new(raw.as_str())
        .map_err(|err| AppError::validation(field_error(Source::Path, "id", &err, &raw)))?;
    let user = state.users.get(&id).await?;
    Ok(web::Json(ApiResponse::success(UserDto::render(
        &user,
        &state.timezone,
    ))))
}

/// List users, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/sys/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Users", body = ApiResponse<Vec<UserDto>>),
        (status = 422, description = "Invalid request parameters", body = ErrorEnvelope),
        (status = 500, description = "Internal server error", body = ErrorEnvelope)
    ),
    tags = ["sys_users"],
    operation_id = "listSysUsers"
)]
pub async fn list_users(
    state: State,
    query: web::Query<ListUsersQuery>,
) -> ApiResult<web::Json<ApiResponse<Vec<UserDto>>>> {
    let filter = query.into_inner().into_filter(&state.timezone)?;
    let users = state.users.list(filter).await?;
    let data = users
        .iter()
        .map(|user| UserDto::render(user, &state.timezone))
        .collect();
    Ok(web::Json(ApiResponse::success(data)))
}

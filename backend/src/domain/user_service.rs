//! `sys_user` use-cases: create, fetch and list.
//!
//! Persistence failures are translated into the shared failure taxonomy here
//! so HTTP handlers only forward [`AppError`]s.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{AppError, AuditName, CustomError, SysUser, TraceId, UserId, Username};

/// Application code for a missing user.
pub const USER_NOT_FOUND: i64 = 404;
/// Application code for a duplicate user id.
pub const USER_ALREADY_EXISTS: i64 = 409;

/// Input for [`UserService::create`].
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: Username,
    pub operator: Option<AuditName>,
}

/// Optional filters for [`UserService::list`].
#[derive(Debug, Clone, Default)]
pub struct UserListFilter {
    pub username: Option<Username>,
    pub created_after: Option<DateTime<Utc>>,
}

/// `sys_user` service backed by a [`UserRepository`].
#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

fn map_persistence_error(error: UserPersistenceError) -> AppError {
    match error {
        UserPersistenceError::Duplicate { id } => {
            let audit_id = id.clone();
            CustomError::new(USER_ALREADY_EXISTS, "User already exists")
                .with_data(json!({ "id": id }))
                .with_background(async move {
                    let trace_id = TraceId::current().unwrap_or_default();
                    warn!(user_id = %audit_id, %trace_id, "rejected duplicate sys_user insert");
                })
                .into()
        }
        other @ (UserPersistenceError::Connection { .. } | UserPersistenceError::Query { .. }) => {
            AppError::unknown(other)
        }
    }
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Create a user with a generated id, stamped with the current time.
    pub async fn create(&self, command: CreateUser) -> Result<SysUser, AppError> {
        let CreateUser { username, operator } = command;
        let user = SysUser::create(
            UserId::generate(),
            username,
            operator.unwrap_or_else(AuditName::system),
            self.clock.utc(),
        );
        self.repo
            .create(&user)
            .await
            .map_err(map_persistence_error)?;
        info!(user_id = %user.id(), username = %user.username(), "created sys_user");
        Ok(user)
    }

    /// Fetch one user; a miss is reported as a custom 404 failure.
    pub async fn get(&self, id: &UserId) -> Result<SysUser, AppError> {
        self.repo
            .find_by_id(id)
            .await
            .map_err(map_persistence_error)?
            .ok_or_else(|| {
                CustomError::new(USER_NOT_FOUND, "User not found")
                    .with_data(json!({ "id": id.as_ref() }))
                    .into()
            })
    }

    /// List users matching every supplied filter, oldest first.
    pub async fn list(&self, filter: UserListFilter) -> Result<Vec<SysUser>, AppError> {
        let UserListFilter {
            username,
            created_after,
        } = filter;
        let users = match username {
            Some(username) => self
                .repo
                .find_by_username(&username)
                .await
                .map_err(map_persistence_error)?
                .into_iter()
                .filter(|user| created_after.is_none_or(|after| user.create_time() > after))
                .collect(),
            None => self
                .repo
                .list_created_after(created_after)
                .await
                .map_err(map_persistence_error)?,
        };
        Ok(users)
    }
}

#[cfg(test)]
#[path = "user_service_tests.rs"]
mod tests;

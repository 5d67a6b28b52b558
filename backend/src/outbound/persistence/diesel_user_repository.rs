//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::{debug, warn};

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::{SysUser, UserId, Username};

use super::models::{NewSysUserRow, SysUserRow};
use super::pool::DbPool;
use super::schema::sys_user;

/// Diesel-backed implementation of the [`UserRepository`] port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Map Diesel errors to user persistence errors; `id` names the row being
/// inserted so unique violations can report it.
fn map_diesel_error(error: diesel::result::Error, id: Option<&str>) -> UserPersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match (error, id) {
        (DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _), Some(id)) => {
            UserPersistenceError::duplicate(id)
        }
        (DieselError::NotFound, _) => UserPersistenceError::query("record not found"),
        (DieselError::QueryBuilderError(_), _) => {
            UserPersistenceError::query("database query error")
        }
        (DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _), _) => {
            UserPersistenceError::connection("database connection error")
        }
        _ => UserPersistenceError::query("database error"),
    }
}

fn rows_to_users(rows: Vec<SysUserRow>) -> Result<Vec<SysUser>, UserPersistenceError> {
    rows.into_iter().map(row_to_user).collect()
}

fn row_to_user(row: SysUserRow) -> Result<SysUser, UserPersistenceError> {
    let id = row.id.clone();
    SysUser::try_from(row).map_err(|err| {
        warn!(user_id = %id, error = %err, "stored sys_user row failed validation");
        UserPersistenceError::query(format!("invalid stored user {id}: {err}"))
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create(&self, user: &SysUser) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(UserPersistenceError::from)?;
        diesel::insert_into(sys_user::table)
            .values(NewSysUserRow::from(user))
            .execute(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, Some(user.id().as_ref())))?;
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<SysUser>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(UserPersistenceError::from)?;
        let row = sys_user::table
            .filter(sys_user::id.eq(id.as_ref()))
            .select(SysUserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_diesel_error(err, None))?;
        row.map(row_to_user).transpose()
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Vec<SysUser>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(UserPersistenceError::from)?;
        let rows = sys_user::table
            .filter(sys_user::username.eq(username.as_ref()))
            .order((sys_user::create_time.asc(), sys_user::id.asc()))
            .select(SysUserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, None))?;
        rows_to_users(rows)
    }

    async fn list_created_after(
        &self,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SysUser>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(UserPersistenceError::from)?;
        let mut query = sys_user::table
            .order((sys_user::create_time.asc(), sys_user::id.asc()))
            .select(SysUserRow::as_select())
            .into_boxed();
        if let Some(after) = after {
            query = query.filter(sys_user::create_time.gt(after.naive_utc()));
        }
        let rows = query
            .load(&mut conn)
            .await
            .map_err(|err| map_diesel_error(err, None))?;
        rows_to_users(rows)
    }
}

#[cfg(test)]
mod tests {
    //! Error-mapping coverage; query behaviour is exercised against the
    //! fixture repository and, with a database, by the integration suite.

    use super::*;
    use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    #[derive(Debug)]
    struct Info;

    impl DatabaseErrorInformation for Info {
        fn message(&self) -> &str {
            "duplicate key value violates unique constraint"
        }
        fn details(&self) -> Option<&str> {
            None
        }
        fn hint(&self) -> Option<&str> {
            None
        }
        fn table_name(&self) -> Option<&str> {
            Some("sys_user")
        }
        fn column_name(&self) -> Option<&str> {
            None
        }
        fn constraint_name(&self) -> Option<&str> {
            Some("sys_user_pkey")
        }
        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(kind: DatabaseErrorKind) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(Info))
    }

    #[rstest]
    fn unique_violation_on_insert_is_a_duplicate() {
        let error = map_diesel_error(database_error(DatabaseErrorKind::UniqueViolation), Some("u1"));
        assert_eq!(error, UserPersistenceError::duplicate("u1"));
    }

    #[rstest]
    fn unique_violation_without_insert_context_is_a_query_error() {
        let error = map_diesel_error(database_error(DatabaseErrorKind::UniqueViolation), None);
        assert!(matches!(error, UserPersistenceError::Query { .. }));
    }

    #[rstest]
    #[case(database_error(DatabaseErrorKind::ClosedConnection), "connection")]
    #[case(DieselError::NotFound, "query")]
    #[case(DieselError::RollbackTransaction, "query")]
    fn diesel_errors_are_classified(#[case] error: DieselError, #[case] expected: &str) {
        let mapped = map_diesel_error(error, None);
        let actual = match mapped {
            UserPersistenceError::Connection { .. } => "connection",
            UserPersistenceError::Query { .. } => "query",
            UserPersistenceError::Duplicate { .. } => "duplicate",
        };
        assert_eq!(actual, expected);
    }
}

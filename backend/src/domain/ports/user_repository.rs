//! Port abstraction for `sys_user` persistence adapters and their errors.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{SysUser, UserId, Username};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// A row with the same primary key already exists.
        Duplicate { id: String } => "user {id} already exists",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; fails with `Duplicate` when the id is taken.
    async fn create(&self, user: &SysUser) -> Result<(), UserPersistenceError>;

    /// Fetch a user by identifier.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<SysUser>, UserPersistenceError>;

    /// All users sharing `username`, oldest first.
    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Vec<SysUser>, UserPersistenceError>;

    /// Users created strictly after `after` (all users when `None`), oldest first.
    async fn list_created_after(
        &self,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SysUser>, UserPersistenceError>;
}

/// In-memory repository used when no database is configured.
#[derive(Debug, Default)]
pub struct FixtureUserRepository {
    users: Mutex<HashMap<UserId, SysUser>>,
}

impl FixtureUserRepository {
    fn select<P>(&self, predicate: P) -> Result<Vec<SysUser>, UserPersistenceError>
    where
        P: Fn(&SysUser) -> bool,
    {
        let users = self
            .users
            .lock()
            .map_err(|_| UserPersistenceError::query("fixture store poisoned"))?;
        let mut selected: Vec<SysUser> = users.values().filter(|u| predicate(u)).cloned().collect();
        selected.sort_by(|a, b| {
            a.create_time()
                .cmp(&b.create_time())
                .then_with(|| a.id().as_ref().cmp(b.id().as_ref()))
        });
        Ok(selected)
    }
}

#[async_trait]
impl UserRepository for FixtureUserRepository {
    async fn create(&self, user: &SysUser) -> Result<(), UserPersistenceError> {
        let mut users = self
            .users
            .lock()
            .map_err(|_| UserPersistenceError::query("fixture store poisoned"))?;
        if users.contains_key(user.id()) {
            return Err(UserPersistenceError::duplicate(user.id().as_ref()));
        }
        users.insert(user.id().clone(), user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<SysUser>, UserPersistenceError> {
        let users = self
            .users
            .lock()
            .map_err(|_| UserPersistenceError::query("fixture store poisoned"))?;
        Ok(users.get(id).cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Vec<SysUser>, UserPersistenceError> {
        self.select(|user| user.username() == username)
    }

    async fn list_created_after(
        &self,
        after: Option<DateTime<Utc>>,
    ) -> Result<Vec<SysUser>, UserPersistenceError> {
        self.select(|user| after.is_none_or(|after| user.create_time() > after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AuditName;
    use chrono::TimeZone as _;
    use rstest::{fixture, rstest};

    fn user(id: &str, username: &str, hour: u32) -> SysUser {
        let at = Utc
            .with_ymd_and_hms(2024, 11, 22, hour, 0, 0)
            .single()
            .expect("valid timestamp");
        SysUser::create(
            UserId::new(id).expect("valid id"),
            Username::new(username).expect("valid username"),
            AuditName::system(),
            at,
        )
    }

    #[fixture]
    async fn seeded() -> FixtureUserRepository {
        let repo = FixtureUserRepository::default();
        for u in [user("b", "ada", 2), user("a", "ada", 1), user("c", "grace", 3)] {
            repo.create(&u).await.expect("seed user");
        }
        repo
    }

    #[rstest]
    #[tokio::test]
    async fn create_rejects_duplicate_ids(#[future] seeded: FixtureUserRepository) {
        let repo = seeded.await;
        let err = repo
            .create(&user("a", "other", 5))
            .await
            .expect_err("duplicate id");
        assert_eq!(err, UserPersistenceError::duplicate("a"));
    }

    #[rstest]
    #[tokio::test]
    async fn find_by_username_returns_all_matches_oldest_first(
        #[future] seeded: FixtureUserRepository,
    ) {
        let repo = seeded.await;
        let found = repo
            .find_by_username(&Username::new("ada").expect("valid username"))
            .await
            .expect("query succeeds");
        let ids: Vec<&str> = found.iter().map(|u| u.id().as_ref()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[rstest]
    #[tokio::test]
    async fn list_created_after_is_strict(#[future] seeded: FixtureUserRepository) {
        let repo = seeded.await;
        let cutoff = Utc
            .with_ymd_and_hms(2024, 11, 22, 2, 0, 0)
            .single()
            .expect("valid timestamp");
        let found = repo
            .list_created_after(Some(cutoff))
            .await
            .expect("query succeeds");
        assert_eq!(found.len(), 1);
        assert_eq!(found.first().map(|u| u.id().as_ref()), Some("c"));

        let all = repo.list_created_after(None).await.expect("query succeeds");
        assert_eq!(all.len(), 3);
    }

    #[rstest]
    #[tokio::test]
    async fn find_by_id_misses_cleanly() {
        let repo = FixtureUserRepository::default();
        let found = repo
            .find_by_id(&UserId::new("nobody").expect("valid id"))
            .await
            .expect("query succeeds");
        assert!(found.is_none());
    }
}

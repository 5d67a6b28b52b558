//! `DieselUserRepository` and the `sys_user` migration against embedded
//! PostgreSQL.
//!
//! Each test gets its own temporary database with the embedded migrations
//! applied through `migrations::run_pending`, the same path the `migrate`
//! subcommand takes.

use admin_backend::domain::ports::{UserPersistenceError, UserRepository};
use admin_backend::domain::{AuditName, SysUser, UserId, Username};
use admin_backend::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig, migrations};
use chrono::{DateTime, TimeZone as _, Utc};
use diesel::pg::PgConnection;
use diesel::sql_types::Text;
use diesel::{Connection, QueryableByName, RunQueryDsl};
use pg_embedded_setup_unpriv::{TemporaryDatabase, TestCluster};
use rstest::{fixture, rstest};
use tokio::runtime::Runtime;
use uuid::Uuid;

#[path = "support/pg_embed.rs"]
mod pg_embed;

use pg_embed::{handle_cluster_setup_failure, test_cluster};

struct TestContext {
    runtime: Runtime,
    repository: DieselUserRepository,
    database_url: String,
    applied: Vec<String>,
    _database: TemporaryDatabase,
    _cluster: TestCluster,
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = test_cluster()?;
    let name = format!("sys_user_{}", Uuid::new_v4().simple());
    let database = cluster
        .temporary_database(name.as_str())
        .map_err(|err| format!("{err:?}"))?;
    let database_url = database.url().to_owned();

    let applied = runtime
        .block_on(migrations::run_pending(&database_url))
        .map_err(|err| err.to_string())?;
    let pool = runtime
        .block_on(DbPool::connect(
            PoolConfig::new(&database_url).with_max_size(2),
        ))
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        repository: DieselUserRepository::new(pool),
        database_url,
        applied,
        _database: database,
        _cluster: cluster,
    })
}

#[fixture]
fn context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[derive(QueryableByName)]
struct IndexRow {
    #[diesel(sql_type = Text)]
    indexname: String,
}

fn sys_user_indexes(url: &str) -> Vec<String> {
    let mut conn = PgConnection::establish(url).expect("sync connection");
    diesel::sql_query(
        "SELECT indexname FROM pg_indexes WHERE tablename = 'sys_user' ORDER BY indexname",
    )
    .load::<IndexRow>(&mut conn)
    .expect("index query")
    .into_iter()
    .map(|row| row.indexname)
    .collect()
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 11, 22, hour, 10, 22)
        .single()
        .expect("valid timestamp")
}

fn user(id: &str, username: &str, hour: u32) -> SysUser {
    SysUser::create(
        UserId::new(id).expect("valid id"),
        Username::new(username).expect("valid username"),
        AuditName::new("admin").expect("valid operator"),
        at(hour),
    )
}

#[rstest]
fn migration_creates_table_with_both_indexes(context: Option<TestContext>) {
    let Some(ctx) = context else { return };
    assert_eq!(ctx.applied.len(), 1);
    assert_eq!(
        sys_user_indexes(&ctx.database_url),
        ["ix_sys_user_id", "ix_sys_user_username", "sys_user_pkey"]
    );
}

#[rstest]
fn users_round_trip_through_postgres(context: Option<TestContext>) {
    let Some(ctx) = context else { return };
    let created = user("u1", "ada", 1);
    ctx.runtime.block_on(async {
        ctx.repository.create(&created).await.expect("insert succeeds");
        let found = ctx
            .repository
            .find_by_id(created.id())
            .await
            .expect("query succeeds");
        assert_eq!(found, Some(created.clone()));

        let missing = ctx
            .repository
            .find_by_id(&UserId::new("nobody").expect("valid id"))
            .await
            .expect("query succeeds");
        assert!(missing.is_none());
    });
}

#[rstest]
fn duplicate_ids_are_reported(context: Option<TestContext>) {
    let Some(ctx) = context else { return };
    ctx.runtime.block_on(async {
        ctx.repository
            .create(&user("u1", "ada", 1))
            .await
            .expect("first insert succeeds");
        let err = ctx
            .repository
            .create(&user("u1", "grace", 2))
            .await
            .expect_err("id is taken");
        assert_eq!(err, UserPersistenceError::duplicate("u1"));
    });
}

#[rstest]
fn listings_are_filtered_and_oldest_first(context: Option<TestContext>) {
    let Some(ctx) = context else { return };
    ctx.runtime.block_on(async {
        for seeded in [user("b", "ada", 3), user("a", "ada", 1), user("c", "grace", 2)] {
            ctx.repository.create(&seeded).await.expect("seed user");
        }

        let named = ctx
            .repository
            .find_by_username(&Username::new("ada").expect("valid username"))
            .await
            .expect("query succeeds");
        let ids: Vec<&str> = named.iter().map(|u| u.id().as_ref()).collect();
        assert_eq!(ids, ["a", "b"]);

        let after = ctx
            .repository
            .list_created_after(Some(at(2)))
            .await
            .expect("query succeeds");
        let ids: Vec<&str> = after.iter().map(|u| u.id().as_ref()).collect();
        assert_eq!(ids, ["b"], "the boundary row is excluded");

        let all = ctx
            .repository
            .list_created_after(None)
            .await
            .expect("query succeeds");
        let ids: Vec<&str> = all.iter().map(|u| u.id().as_ref()).collect();
        assert_eq!(ids, ["a", "c", "b"]);
    });
}

#[rstest]
fn rollback_drops_the_table(context: Option<TestContext>) {
    let Some(ctx) = context else { return };
    let reverted = ctx
        .runtime
        .block_on(migrations::revert_last(&ctx.database_url))
        .expect("down migration runs");
    assert_eq!(ctx.applied, [reverted]);
    assert!(sys_user_indexes(&ctx.database_url).is_empty());

    let err = ctx
        .runtime
        .block_on(ctx.repository.list_created_after(None))
        .expect_err("table is gone");
    assert!(matches!(err, UserPersistenceError::Query { .. }), "{err}");

    let again = ctx
        .runtime
        .block_on(migrations::revert_last(&ctx.database_url))
        .expect_err("nothing left to revert");
    assert!(matches!(again, migrations::MigrationError::NothingToRevert));
}

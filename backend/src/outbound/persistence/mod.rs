//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repository implementations only translate between Diesel rows and domain
//! types. Row structs and the table definition stay private to this module;
//! connections come from a `bb8` pool through `diesel-async`.

mod diesel_user_repository;
pub mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_user_repository::DieselUserRepository;
pub use migrations::MigrationError;
pub use pool::{DbPool, PoolConfig, PoolError};

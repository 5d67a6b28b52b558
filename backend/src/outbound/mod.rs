//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories and migrations using
//!   Diesel ORM.

pub mod persistence;

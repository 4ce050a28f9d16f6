//! Organization directory database: SurrealDB connection management,
//! schema and repository implementations.
//!
//! This crate provides:
//! - Connection management ([`DbManager`], [`DbConfig`])
//! - Schema definition and versioned application ([`run_migrations`])
//! - Repository implementations of the `orgdir-core` traits ([`repository`])
//! - Demo data seeding ([`seed`])
//! - Error types ([`DbError`])

mod connection;
mod error;
pub mod repository;
mod schema;
pub mod seed;

pub use connection::{DbConfig, DbManager, Repositories};
pub use error::DbError;
pub use schema::run_migrations;

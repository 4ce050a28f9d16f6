//! Organization directory core: shared domain types.
//!
//! This crate provides:
//! - Domain models for buildings, activities, organizations and phones ([`models`])
//! - The error taxonomy shared by every layer ([`error`])
//! - Async repository traits describing the entity store ([`repository`])
//! - Pure geospatial helpers used by the search engine ([`geo`])

pub mod error;
pub mod geo;
pub mod models;
pub mod repository;

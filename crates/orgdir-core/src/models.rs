//! Domain models for the organization directory.
//!
//! Identifiers are time-ordered UUIDs (v7), so ascending id order is
//! also a stable, deterministic pagination order.

pub mod activity;
pub mod building;
pub mod organization;

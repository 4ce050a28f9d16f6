//! SurrealDB repository implementations.

mod activity;
mod building;
mod organization;

pub use activity::SurrealActivityRepository;
pub use building::SurrealBuildingRepository;
pub use organization::SurrealOrganizationRepository;

use orgdir_core::repository::Pagination;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub(crate) total: u64,
}

/// SurrealQL `LIMIT`/`START` take signed integers.
pub(crate) fn limit_start(pagination: Pagination) -> (u64, u64) {
    let max = i64::MAX as u64;
    (pagination.limit.min(max), pagination.offset.min(max))
}

pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Corrupt(format!("invalid {what} UUID {raw}: {e}")))
}

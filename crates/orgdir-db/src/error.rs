//! Database-specific error types and conversions.

use orgdir_core::error::DirectoryError;

/// Thrown inside a transaction when a delete target is still referenced.
pub(crate) const STILL_REFERENCED: &str = "record still referenced";

/// Thrown inside a transaction when a referenced record does not exist.
pub(crate) const MISSING_REFERENCE: &str = "referenced record missing";

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Stored record is malformed: {0}")]
    Corrupt(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Unique constraint violated on {entity}")]
    Duplicate { entity: String },

    #[error("Record still referenced: {entity} with id {id}")]
    InUse { entity: String, id: String },
}

impl DbError {
    /// Classify an error reported by `Response::check`.
    ///
    /// Unique index violations become [`DbError::Duplicate`] for `entity`.
    pub fn from_check(err: surrealdb::Error, entity: &str) -> Self {
        let message = err.to_string();
        if message.contains("already contains") {
            DbError::Duplicate {
                entity: entity.into(),
            }
        } else {
            DbError::Query(message)
        }
    }

    /// Classify an error reported by `Response::check` for a delete that
    /// throws [`STILL_REFERENCED`] while `entity` is in use.
    pub(crate) fn from_guarded_delete(err: surrealdb::Error, entity: &str, id: &str) -> Self {
        let message = err.to_string();
        if message.contains(STILL_REFERENCED) {
            DbError::InUse {
                entity: entity.into(),
                id: id.into(),
            }
        } else {
            DbError::Query(message)
        }
    }

    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

impl From<DbError> for DirectoryError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => DirectoryError::NotFound { entity, id },
            DbError::Duplicate { entity } => DirectoryError::AlreadyExists { entity },
            DbError::InUse { entity, id } => DirectoryError::InUse { entity, id },
            other => DirectoryError::Database(other.to_string()),
        }
    }
}

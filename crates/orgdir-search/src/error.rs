//! Search error types.

use orgdir_core::error::DirectoryError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("radius must be positive, got {0}")]
    NonPositiveRadius(f64),

    #[error("latitude must be within [-90, 90], got {0}")]
    InvalidLatitude(f64),

    #[error("longitude must be within [-180, 180], got {0}")]
    InvalidLongitude(f64),

    #[error("limit must be within [1, {max}], got {limit}")]
    InvalidPage { limit: u64, max: u64 },

    #[error("name fragment must contain 1 to {max} characters")]
    InvalidNameFragment { max: usize },

    #[error("API key header is missing")]
    MissingApiKey,

    #[error("API key is invalid")]
    InvalidApiKey,
}

impl From<SearchError> for DirectoryError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::MissingApiKey | SearchError::InvalidApiKey => DirectoryError::Unauthorized,
            other => DirectoryError::validation(other.to_string()),
        }
    }
}

//! Request-side validation in front of [`DirectoryService`](crate::DirectoryService).
//!
//! Nothing here performs I/O. A transport layer parses its inputs into
//! these types and hands the validated values to the service.

use orgdir_core::repository::Pagination;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::config::SearchConfig;
use crate::error::SearchError;

/// Header carrying the shared API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Raw `skip`/`limit` pair as received from a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub skip: u64,
    pub limit: Option<u64>,
}

impl PageRequest {
    pub fn new(skip: u64, limit: u64) -> Self {
        Self {
            skip,
            limit: Some(limit),
        }
    }

    /// Check `1 <= limit <= max_limit`, substituting the default limit
    /// when none was given.
    pub fn validate(self, config: &SearchConfig) -> Result<Pagination, SearchError> {
        let limit = self.limit.unwrap_or(config.default_limit);
        if limit == 0 || limit > config.max_limit {
            return Err(SearchError::InvalidPage {
                limit,
                max: config.max_limit,
            });
        }
        Ok(Pagination::new(self.skip, limit))
    }
}

/// A latitude/longitude pair within the valid ranges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    lat: f64,
    lon: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lon: f64) -> Result<Self, SearchError> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(SearchError::InvalidLatitude(lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(SearchError::InvalidLongitude(lon));
        }
        Ok(Self { lat, lon })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }
}

/// A trimmed, non-empty organization name fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameQuery(String);

impl NameQuery {
    pub fn new(fragment: &str, config: &SearchConfig) -> Result<Self, SearchError> {
        let trimmed = fragment.trim();
        let len = trimmed.chars().count();
        if len == 0 || len > config.max_name_fragment_len {
            return Err(SearchError::InvalidNameFragment {
                max: config.max_name_fragment_len,
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Checks the API key header against the configured secret.
///
/// Both sides are hashed to fixed-length digests and compared without
/// an early exit, so timing does not reveal the matching prefix length.
pub struct ApiKeyGuard {
    expected: [u8; 32],
}

impl ApiKeyGuard {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            expected: digest(&config.api_key),
        }
    }

    pub fn verify(&self, header: Option<&str>) -> Result<(), SearchError> {
        let supplied = match header {
            Some(value) if !value.is_empty() => value,
            _ => return Err(SearchError::MissingApiKey),
        };
        let diff = digest(supplied)
            .iter()
            .zip(self.expected.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));
        if diff == 0 {
            Ok(())
        } else {
            Err(SearchError::InvalidApiKey)
        }
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    hasher.finalize().into()
}

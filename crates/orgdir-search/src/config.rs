//! Search configuration.

/// Configuration for the directory search service and its request layer.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Shared secret expected in the API key header.
    pub api_key: String,
    /// Upper bound on rows fetched by a radius query before exact filtering
    /// (default: 10_000).
    pub radius_candidate_cap: u64,
    /// Page size used when the caller gives none (default: 100).
    pub default_limit: u64,
    /// Largest accepted page size (default: 1000).
    pub max_limit: u64,
    /// Longest accepted name fragment, in characters (default: 255).
    pub max_name_fragment_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            radius_candidate_cap: 10_000,
            default_limit: 100,
            max_limit: 1000,
            max_name_fragment_len: 255,
        }
    }
}

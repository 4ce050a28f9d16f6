//! Organization directory search, the query side of the directory.
//!
//! [`DirectoryService`] answers by-building, by-activity, by-activity-subtree,
//! rectangle, radius and name queries on top of the `orgdir-core`
//! repository traits. The [`request`] and [`response`] modules hold the
//! transport-agnostic validation and wire mapping used in front of it.

pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod service;
pub mod tree;

pub use config::SearchConfig;
pub use error::SearchError;
pub use service::DirectoryService;
pub use tree::ActivityTreeResolver;

//! Activity domain model.
//!
//! Activities form a self-referential tree of at most three levels.
//! Only the `[1, 3]` level bound is enforced; the "child level equals
//! parent level + 1" rule is left to callers and is not checked here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DirectoryError, DirectoryResult};

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub name: String,
    /// Parent activity; `None` for root nodes.
    pub parent_id: Option<Uuid>,
    /// Nesting level, `1..=3`.
    pub level: u8,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActivity {
    pub name: String,
    pub parent_id: Option<Uuid>,
    pub level: u8,
}

/// Fields that can be updated on an existing activity.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateActivity {
    pub name: Option<String>,
    /// `Some(None)` detaches the activity from its parent.
    pub parent_id: Option<Option<Uuid>>,
    pub level: Option<u8>,
}

pub fn check_level(level: u8) -> DirectoryResult<u8> {
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        return Err(DirectoryError::validation(format!(
            "activity level must be between {MIN_LEVEL} and {MAX_LEVEL}, got {level}"
        )));
    }
    Ok(level)
}

pub fn check_name(name: &str) -> DirectoryResult<()> {
    if name.trim().is_empty() {
        return Err(DirectoryError::validation("activity name must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_bounds() {
        assert!(check_level(0).is_err());
        assert!(check_level(1).is_ok());
        assert!(check_level(3).is_ok());
        assert!(check_level(4).is_err());
    }
}

//! Organization domain model.
//!
//! An organization lives in exactly one building, owns zero or more
//! globally unique phone numbers and is tagged with any number of
//! activities. Every organization handed out by a repository has its
//! building, phones and activities already attached.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{DirectoryError, DirectoryResult};
use crate::models::activity::Activity;
use crate::models::building::Building;

pub const MAX_NAME_LEN: usize = 255;
pub const MAX_PHONES: usize = 10;

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\+?[0-9()\-\s]{5,20}$").expect("phone pattern is a valid regex")
});

/// An organization with its relations eagerly attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub building: Building,
    /// Phones ordered by id (insertion order).
    pub phones: Vec<Phone>,
    /// Activities ordered by id.
    pub activities: Vec<Activity>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Organization {
    /// `(latitude, longitude)` of the owning building.
    pub fn coordinates(&self) -> (f64, f64) {
        (self.building.latitude, self.building.longitude)
    }
}

/// A phone number owned by an organization. Deleted together with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phone {
    pub id: Uuid,
    pub organization_id: Uuid,
    /// Globally unique number string.
    pub number: String,
}

/// Fields required to create a new organization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
    pub building_id: Uuid,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default)]
    pub activity_ids: Vec<Uuid>,
}

/// Fields that can be updated on an existing organization.
///
/// `phones` and `activity_ids` replace the whole collection when present.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateOrganization {
    pub name: Option<String>,
    pub building_id: Option<Uuid>,
    pub phones: Option<Vec<String>>,
    pub activity_ids: Option<Vec<Uuid>>,
}

impl CreateOrganization {
    pub fn validate(&self) -> DirectoryResult<()> {
        check_name(&self.name)?;
        check_phones(&self.phones)
    }
}

impl UpdateOrganization {
    pub fn validate(&self) -> DirectoryResult<()> {
        if let Some(name) = &self.name {
            check_name(name)?;
        }
        if let Some(phones) = &self.phones {
            check_phones(phones)?;
        }
        Ok(())
    }
}

fn check_name(name: &str) -> DirectoryResult<()> {
    let len = name.chars().count();
    if !(1..=MAX_NAME_LEN).contains(&len) {
        return Err(DirectoryError::validation(format!(
            "organization name must contain 1 to {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

fn check_phones(phones: &[String]) -> DirectoryResult<()> {
    if phones.len() > MAX_PHONES {
        return Err(DirectoryError::validation(format!(
            "organization can have at most {MAX_PHONES} phone numbers"
        )));
    }
    let mut seen = HashSet::new();
    for number in phones {
        if !PHONE_PATTERN.is_match(number) {
            return Err(DirectoryError::validation(format!(
                "invalid phone number: {number}"
            )));
        }
        if !seen.insert(number.as_str()) {
            return Err(DirectoryError::validation(format!(
                "duplicate phone number: {number}"
            )));
        }
    }
    Ok(())
}

//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Every organization-returning
//! query hands back organizations with building, phones and activities
//! already attached, ordered by ascending organization id.

use uuid::Uuid;

use crate::error::DirectoryResult;
use crate::geo::BoundingBox;
use crate::models::{
    activity::{Activity, CreateActivity, UpdateActivity},
    building::{Building, CreateBuilding, UpdateBuilding},
    organization::{CreateOrganization, Organization, UpdateOrganization},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
        }
    }
}

impl Pagination {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    /// A window starting at zero that is large enough to contain this page.
    pub fn covering_window(&self) -> Self {
        Self {
            offset: 0,
            limit: self.offset.saturating_add(self.limit),
        }
    }

    /// Apply offset/limit to an already ordered, fully materialized result.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        let offset = usize::try_from(self.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(self.limit).unwrap_or(usize::MAX);
        items.into_iter().skip(offset).take(limit).collect()
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

pub trait BuildingRepository: Send + Sync {
    fn create(&self, input: CreateBuilding) -> impl Future<Output = DirectoryResult<Building>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DirectoryResult<Building>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateBuilding,
    ) -> impl Future<Output = DirectoryResult<Building>> + Send;
    /// Rejected with `InUse` while any organization references the building.
    fn delete(&self, id: Uuid) -> impl Future<Output = DirectoryResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = DirectoryResult<PaginatedResult<Building>>> + Send;
}

// ---------------------------------------------------------------------------
// Activities (self-referential tree)
// ---------------------------------------------------------------------------

pub trait ActivityRepository: Send + Sync {
    fn create(&self, input: CreateActivity) -> impl Future<Output = DirectoryResult<Activity>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DirectoryResult<Activity>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateActivity,
    ) -> impl Future<Output = DirectoryResult<Activity>> + Send;
    /// Rejected with `InUse` while the activity has children or tagged organizations.
    fn delete(&self, id: Uuid) -> impl Future<Output = DirectoryResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = DirectoryResult<PaginatedResult<Activity>>> + Send;

    /// Get direct children of an activity.
    fn get_children(
        &self,
        parent_id: Uuid,
    ) -> impl Future<Output = DirectoryResult<Vec<Activity>>> + Send;
}

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

pub trait OrganizationRepository: Send + Sync {
    fn create(
        &self,
        input: CreateOrganization,
    ) -> impl Future<Output = DirectoryResult<Organization>> + Send;
    /// Full record with relations attached, or `NotFound`.
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = DirectoryResult<Organization>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateOrganization,
    ) -> impl Future<Output = DirectoryResult<Organization>> + Send;
    /// Deletes the organization and its phones; building and activities stay.
    fn delete(&self, id: Uuid) -> impl Future<Output = DirectoryResult<()>> + Send;

    fn list_by_building(
        &self,
        building_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = DirectoryResult<Vec<Organization>>> + Send;

    /// Organizations tagged with exactly this activity (no subtree expansion).
    fn list_by_activity(
        &self,
        activity_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = DirectoryResult<Vec<Organization>>> + Send;

    /// Organizations whose building lies inside the (inclusive) box.
    fn list_in_area(
        &self,
        area: BoundingBox,
        pagination: Pagination,
    ) -> impl Future<Output = DirectoryResult<Vec<Organization>>> + Send;

    /// Case-insensitive substring match on the organization name.
    fn search_by_name(
        &self,
        fragment: &str,
        pagination: Pagination,
    ) -> impl Future<Output = DirectoryResult<Vec<Organization>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_applies_offset_and_limit() {
        let items: Vec<u32> = (0..10).collect();
        assert_eq!(Pagination::new(3, 4).slice(items.clone()), vec![3, 4, 5, 6]);
        assert_eq!(Pagination::new(8, 4).slice(items.clone()), vec![8, 9]);
        assert!(Pagination::new(20, 4).slice(items.clone()).is_empty());
        assert!(Pagination::new(0, 0).slice(items).is_empty());
    }

    #[test]
    fn consecutive_pages_reassemble_the_full_result() {
        let items: Vec<u32> = (0..23).collect();
        let mut joined = Vec::new();
        let mut offset = 0;
        loop {
            let page = Pagination::new(offset, 5).slice(items.clone());
            if page.is_empty() {
                break;
            }
            joined.extend(page);
            offset += 5;
        }
        assert_eq!(joined, items);
    }

    #[test]
    fn covering_window_saturates() {
        let window = Pagination::new(u64::MAX, 10).covering_window();
        assert_eq!(window.offset, 0);
        assert_eq!(window.limit, u64::MAX);
    }
}

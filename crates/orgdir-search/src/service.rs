//! Directory search service.
//!
//! Store-paginated queries (by building, by activity, in area, by name)
//! push offset/limit down to the repository. Queries whose answer set is
//! only known after merging or exact filtering (activity subtree, radius)
//! fetch a covering window, order by id and paginate in memory.

use std::collections::BTreeMap;

use orgdir_core::error::DirectoryResult;
use orgdir_core::geo::{self, BoundingBox};
use orgdir_core::models::building::Building;
use orgdir_core::models::organization::Organization;
use orgdir_core::repository::{
    ActivityRepository, BuildingRepository, OrganizationRepository, PaginatedResult, Pagination,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::tree::ActivityTreeResolver;

/// Read-only search over organizations.
///
/// Generic over repository implementations so that the search layer
/// has no dependency on the database crate.
pub struct DirectoryService<O, A, B>
where
    O: OrganizationRepository,
    A: ActivityRepository,
    B: BuildingRepository,
{
    organizations: O,
    activities: A,
    buildings: B,
    config: SearchConfig,
}

impl<O, A, B> DirectoryService<O, A, B>
where
    O: OrganizationRepository,
    A: ActivityRepository,
    B: BuildingRepository,
{
    pub fn new(organizations: O, activities: A, buildings: B, config: SearchConfig) -> Self {
        Self {
            organizations,
            activities,
            buildings,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Organizations located in a building.
    pub async fn by_building(
        &self,
        building_id: Uuid,
        page: Pagination,
    ) -> DirectoryResult<Vec<Organization>> {
        let found = self.organizations.list_by_building(building_id, page).await?;
        debug!(
            %building_id,
            offset = page.offset,
            limit = page.limit,
            found = found.len(),
            "by_building"
        );
        Ok(found)
    }

    /// Organizations tagged with exactly this activity.
    pub async fn by_activity(
        &self,
        activity_id: Uuid,
        page: Pagination,
    ) -> DirectoryResult<Vec<Organization>> {
        let found = self.organizations.list_by_activity(activity_id, page).await?;
        debug!(
            %activity_id,
            offset = page.offset,
            limit = page.limit,
            found = found.len(),
            "by_activity"
        );
        Ok(found)
    }

    /// Organizations tagged with the activity or any of its descendants,
    /// each organization listed once.
    ///
    /// Every branch is fetched with the window `[0, offset + limit)`:
    /// the first `offset + limit` ids of the union are always among the
    /// first `offset + limit` ids of some branch.
    pub async fn by_activity_tree(
        &self,
        activity_id: Uuid,
        page: Pagination,
    ) -> DirectoryResult<Vec<Organization>> {
        if page.limit == 0 {
            return Ok(Vec::new());
        }

        let subtree = ActivityTreeResolver::new(&self.activities)
            .descendant_ids(activity_id)
            .await?;
        let window = page.covering_window();

        let mut merged = BTreeMap::new();
        for id in &subtree {
            for organization in self.organizations.list_by_activity(*id, window).await? {
                merged.entry(organization.id).or_insert(organization);
            }
        }

        let found = page.slice(merged.into_values().collect());
        debug!(
            %activity_id,
            subtree = subtree.len(),
            offset = page.offset,
            limit = page.limit,
            found = found.len(),
            "by_activity_tree"
        );
        Ok(found)
    }

    /// Organizations whose building lies in the rectangle spanned by two
    /// corners given in any order. Bounds are inclusive.
    pub async fn in_area(
        &self,
        lat1: f64,
        lon1: f64,
        lat2: f64,
        lon2: f64,
        page: Pagination,
    ) -> DirectoryResult<Vec<Organization>> {
        let area = BoundingBox::from_corners(lat1, lon1, lat2, lon2);
        let found = self.organizations.list_in_area(area, page).await?;
        debug!(?area, offset = page.offset, limit = page.limit, found = found.len(), "in_area");
        Ok(found)
    }

    /// Organizations whose building is within `radius_m` meters of the
    /// point, by haversine distance.
    ///
    /// Candidates come from the bounding box of the disc, split in two
    /// when it crosses the antimeridian. Each store fetch is capped at
    /// [`SearchConfig::radius_candidate_cap`] rows; the merged candidates
    /// are then filtered exactly. Results beyond the cap are not seen.
    pub async fn in_radius(
        &self,
        lat: f64,
        lon: f64,
        radius_m: f64,
        page: Pagination,
    ) -> DirectoryResult<Vec<Organization>> {
        if radius_m.is_nan() || radius_m <= 0.0 {
            return Err(SearchError::NonPositiveRadius(radius_m).into());
        }
        if page.limit == 0 {
            return Ok(Vec::new());
        }

        let cap = self.config.radius_candidate_cap;
        let mut candidates = BTreeMap::new();
        let mut capped = false;
        for area in BoundingBox::around(lat, lon, radius_m).split_at_antimeridian() {
            let part = self
                .organizations
                .list_in_area(area, Pagination::new(0, cap))
                .await?;
            capped |= part.len() as u64 >= cap;
            for organization in part {
                candidates.entry(organization.id).or_insert(organization);
            }
        }
        if capped {
            warn!(
                cap,
                lat,
                lon,
                radius_m,
                "Radius query hit the candidate cap; results may be incomplete"
            );
        }
        let candidate_count = candidates.len();

        // Candidates are keyed by id, so the filtered list stays id-ordered.
        let within = geo::filter_within_radius(
            candidates.into_values(),
            Organization::coordinates,
            lat,
            lon,
            radius_m,
        );

        let found = page.slice(within);
        debug!(
            lat,
            lon,
            radius_m,
            candidates = candidate_count,
            offset = page.offset,
            limit = page.limit,
            found = found.len(),
            "in_radius"
        );
        Ok(found)
    }

    /// Case-insensitive substring search on organization names.
    pub async fn search_by_name(
        &self,
        fragment: &str,
        page: Pagination,
    ) -> DirectoryResult<Vec<Organization>> {
        let found = self.organizations.search_by_name(fragment, page).await?;
        debug!(
            fragment,
            offset = page.offset,
            limit = page.limit,
            found = found.len(),
            "search_by_name"
        );
        Ok(found)
    }

    /// Full organization record, or `NotFound`.
    pub async fn detail(&self, organization_id: Uuid) -> DirectoryResult<Organization> {
        debug!(%organization_id, "detail");
        self.organizations.get_by_id(organization_id).await
    }

    /// Buildings in ascending id order.
    pub async fn list_buildings(
        &self,
        page: Pagination,
    ) -> DirectoryResult<PaginatedResult<Building>> {
        let result = self.buildings.list(page).await?;
        debug!(offset = page.offset, limit = page.limit, total = result.total, "list_buildings");
        Ok(result)
    }
}

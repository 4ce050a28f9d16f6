//! SurrealDB implementation of [`OrganizationRepository`].
//!
//! Every query returns organizations with their building, phones and
//! activities attached. Attachment costs one extra round trip per page
//! regardless of page size: the page rows are fetched first, then the
//! referenced buildings, phones and activities are batch-loaded in a
//! single multi-statement query and joined in memory.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use orgdir_core::error::DirectoryResult;
use orgdir_core::geo::BoundingBox;
use orgdir_core::models::activity::Activity;
use orgdir_core::models::building::Building;
use orgdir_core::models::organization::{
    CreateOrganization, Organization, Phone, UpdateOrganization,
};
use orgdir_core::repository::{OrganizationRepository, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::activity::ActivityRowWithId;
use super::building::BuildingRowWithId;
use super::{limit_start, parse_id};
use crate::error::{DbError, MISSING_REFERENCE};

const SELECT_PAGE: &str = "SELECT meta::id(id) AS record_id, * FROM organization";
const ORDER_AND_PAGE: &str = "ORDER BY record_id ASC LIMIT $limit START $offset";

/// First statement of a write transaction that sets `building_id`.
fn building_guard() -> String {
    format!(
        "IF array::len((SELECT VALUE id FROM type::record('building', $building_id))) = 0 \
         {{ THROW '{MISSING_REFERENCE}' }};\n"
    )
}

/// Classify a failed organization write.
fn write_error(err: surrealdb::Error, building_id: Option<Uuid>) -> DbError {
    match building_id {
        Some(id) if err.to_string().contains(MISSING_REFERENCE) => {
            DbError::not_found("building", id)
        }
        _ => DbError::from_check(err, "phone"),
    }
}

const ATTACH_RELATIONS: &str = "\
SELECT meta::id(id) AS record_id, * FROM building \
    WHERE meta::id(id) IN $building_ids;
SELECT meta::id(id) AS record_id, * FROM phone \
    WHERE organization_id IN $organization_ids ORDER BY record_id ASC;
SELECT meta::id(id) AS record_id, * FROM activity \
    WHERE meta::id(id) IN $activity_ids ORDER BY record_id ASC;
";

#[derive(Debug, SurrealValue)]
struct OrganizationRowWithId {
    record_id: String,
    name: String,
    building_id: String,
    activity_ids: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct PhoneRowWithId {
    record_id: String,
    organization_id: String,
    number: String,
}

impl PhoneRowWithId {
    fn try_into_phone(self) -> Result<Phone, DbError> {
        Ok(Phone {
            id: parse_id(&self.record_id, "phone")?,
            organization_id: parse_id(&self.organization_id, "organization")?,
            number: self.number,
        })
    }
}

/// Relations of one page, keyed for the in-memory join.
struct Relations {
    buildings: HashMap<Uuid, Building>,
    phones: HashMap<Uuid, Vec<Phone>>,
    activities: HashMap<Uuid, Activity>,
}

impl Relations {
    fn assemble(&self, row: OrganizationRowWithId) -> Result<Organization, DbError> {
        let id = parse_id(&row.record_id, "organization")?;
        let building_id = parse_id(&row.building_id, "building")?;
        let building = self
            .buildings
            .get(&building_id)
            .cloned()
            .ok_or_else(|| {
                DbError::Corrupt(format!(
                    "organization {id} references missing building {building_id}"
                ))
            })?;

        let mut activities = row
            .activity_ids
            .iter()
            .map(|raw| {
                let activity_id = parse_id(raw, "activity")?;
                self.activities.get(&activity_id).cloned().ok_or_else(|| {
                    DbError::Corrupt(format!(
                        "organization {id} references missing activity {activity_id}"
                    ))
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;
        activities.sort_by_key(|a| a.id);

        Ok(Organization {
            id,
            name: row.name,
            building,
            phones: self.phones.get(&id).cloned().unwrap_or_default(),
            activities,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Canonical stored form of an activity set: unique, ascending.
fn activity_keys(ids: &[Uuid]) -> Vec<String> {
    ids.iter()
        .copied()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(|id| id.to_string())
        .collect()
}

/// SurrealDB implementation of the Organization repository.
#[derive(Clone)]
pub struct SurrealOrganizationRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOrganizationRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    fn page_query(filter: &str) -> String {
        format!("{SELECT_PAGE} {filter} {ORDER_AND_PAGE}")
    }

    async fn attach(&self, rows: Vec<OrganizationRowWithId>) -> Result<Vec<Organization>, DbError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let organization_ids: Vec<String> = rows.iter().map(|r| r.record_id.clone()).collect();
        let building_ids: Vec<String> = rows
            .iter()
            .map(|r| r.building_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let activity_ids: Vec<String> = rows
            .iter()
            .flat_map(|r| r.activity_ids.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut result = self
            .db
            .query(ATTACH_RELATIONS)
            .bind(("building_ids", building_ids))
            .bind(("organization_ids", organization_ids))
            .bind(("activity_ids", activity_ids))
            .await
            .map_err(DbError::from)?;

        let building_rows: Vec<BuildingRowWithId> = result.take(0).map_err(DbError::from)?;
        let phone_rows: Vec<PhoneRowWithId> = result.take(1).map_err(DbError::from)?;
        let activity_rows: Vec<ActivityRowWithId> = result.take(2).map_err(DbError::from)?;

        let mut relations = Relations {
            buildings: HashMap::with_capacity(building_rows.len()),
            phones: HashMap::new(),
            activities: HashMap::with_capacity(activity_rows.len()),
        };
        for row in building_rows {
            let building = row.try_into_building()?;
            relations.buildings.insert(building.id, building);
        }
        for row in phone_rows {
            let phone = row.try_into_phone()?;
            relations
                .phones
                .entry(phone.organization_id)
                .or_default()
                .push(phone);
        }
        for row in activity_rows {
            let activity = row.try_into_activity()?;
            relations.activities.insert(activity.id, activity);
        }

        rows.into_iter()
            .map(|row| relations.assemble(row))
            .collect()
    }

    async fn ensure_activities(&self, keys: &[String]) -> Result<(), DbError> {
        if keys.is_empty() {
            return Ok(());
        }
        let mut result = self
            .db
            .query("SELECT VALUE meta::id(id) FROM activity WHERE meta::id(id) IN $ids")
            .bind(("ids", keys.to_vec()))
            .await
            .map_err(DbError::from)?;
        let found: Vec<String> = result.take(0).map_err(DbError::from)?;
        let found: BTreeSet<String> = found.into_iter().collect();
        match keys.iter().find(|key| !found.contains(*key)) {
            Some(missing) => Err(DbError::not_found("activity", missing)),
            None => Ok(()),
        }
    }

    /// Reject numbers already owned by another organization.
    async fn ensure_phones_free(&self, numbers: &[String], owner: Uuid) -> Result<(), DbError> {
        if numbers.is_empty() {
            return Ok(());
        }
        let mut result = self
            .db
            .query(
                "SELECT VALUE number FROM phone \
                 WHERE number IN $numbers AND organization_id != $owner",
            )
            .bind(("numbers", numbers.to_vec()))
            .bind(("owner", owner.to_string()))
            .await
            .map_err(DbError::from)?;
        let taken: Vec<String> = result.take(0).map_err(DbError::from)?;
        if !taken.is_empty() {
            debug!(numbers = ?taken, "Phone numbers already in use");
            return Err(DbError::Duplicate {
                entity: "phone".into(),
            });
        }
        Ok(())
    }

    /// Statements creating one phone record per number, bound as
    /// `$phone_id_N` / `$phone_number_N`.
    fn phone_statements(numbers: &[String]) -> (String, Vec<(String, String)>) {
        let mut sql = String::new();
        let mut binds = Vec::with_capacity(numbers.len() * 2);
        for (i, number) in numbers.iter().enumerate() {
            sql.push_str(&format!(
                "CREATE type::record('phone', $phone_id_{i}) SET \
                 organization_id = $id, number = $phone_number_{i};\n"
            ));
            binds.push((format!("phone_id_{i}"), Uuid::now_v7().to_string()));
            binds.push((format!("phone_number_{i}"), number.clone()));
        }
        (sql, binds)
    }
}

impl<C: Connection> OrganizationRepository for SurrealOrganizationRepository<C> {
    async fn create(&self, input: CreateOrganization) -> DirectoryResult<Organization> {
        input.validate()?;

        let id = Uuid::now_v7();
        let activity_ids = activity_keys(&input.activity_ids);

        self.ensure_activities(&activity_ids).await?;
        self.ensure_phones_free(&input.phones, id).await?;

        let building_id = input.building_id;
        let guard_sql = building_guard();
        let (phone_sql, phone_binds) = Self::phone_statements(&input.phones);
        let query = format!(
            "BEGIN TRANSACTION;\n\
             {guard_sql}\
             CREATE type::record('organization', $id) SET \
             name = $name, building_id = $building_id, activity_ids = $activity_ids;\n\
             {phone_sql}\
             COMMIT TRANSACTION;"
        );

        let mut builder = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("name", input.name))
            .bind(("building_id", building_id.to_string()))
            .bind(("activity_ids", activity_ids));
        for bind in phone_binds {
            builder = builder.bind(bind);
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| write_error(e, Some(building_id)))?;

        debug!(organization_id = %id, "Organization created");
        self.get_by_id(id).await
    }

    async fn get_by_id(&self, id: Uuid) -> DirectoryResult<Organization> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM type::record('organization', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::not_found("organization", id_str).into());
        }

        let mut organizations = self.attach(rows).await?;
        organizations
            .pop()
            .ok_or_else(|| DbError::not_found("organization", id).into())
    }

    async fn update(&self, id: Uuid, input: UpdateOrganization) -> DirectoryResult<Organization> {
        input.validate()?;
        self.get_by_id(id).await?;

        let activity_ids = input.activity_ids.as_deref().map(activity_keys);
        if let Some(keys) = &activity_ids {
            self.ensure_activities(keys).await?;
        }
        if let Some(numbers) = &input.phones {
            self.ensure_phones_free(numbers, id).await?;
        }

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.building_id.is_some() {
            sets.push("building_id = $building_id");
        }
        if activity_ids.is_some() {
            sets.push("activity_ids = $activity_ids");
        }
        sets.push("updated_at = time::now()");

        let (phone_sql, phone_binds) = match &input.phones {
            Some(numbers) => {
                let (sql, binds) = Self::phone_statements(numbers);
                (format!("DELETE phone WHERE organization_id = $id;\n{sql}"), binds)
            }
            None => (String::new(), Vec::new()),
        };

        let building_id = input.building_id;
        let guard_sql = if building_id.is_some() {
            building_guard()
        } else {
            String::new()
        };
        let query = format!(
            "BEGIN TRANSACTION;\n\
             {guard_sql}\
             UPDATE type::record('organization', $id) SET {};\n\
             {phone_sql}\
             COMMIT TRANSACTION;",
            sets.join(", ")
        );

        let mut builder = self.db.query(query).bind(("id", id.to_string()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(building_id) = input.building_id {
            builder = builder.bind(("building_id", building_id.to_string()));
        }
        if let Some(keys) = activity_ids {
            builder = builder.bind(("activity_ids", keys));
        }
        for bind in phone_binds {
            builder = builder.bind(bind);
        }

        builder
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| write_error(e, building_id))?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: Uuid) -> DirectoryResult<()> {
        self.db
            .query(
                "BEGIN TRANSACTION;\n\
                 DELETE phone WHERE organization_id = $id;\n\
                 DELETE type::record('organization', $id);\n\
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(organization_id = %id, "Organization deleted with its phones");
        Ok(())
    }

    async fn list_by_building(
        &self,
        building_id: Uuid,
        pagination: Pagination,
    ) -> DirectoryResult<Vec<Organization>> {
        if pagination.limit == 0 {
            return Ok(Vec::new());
        }
        let (limit, start) = limit_start(pagination);

        let mut result = self
            .db
            .query(Self::page_query("WHERE building_id = $building_id"))
            .bind(("building_id", building_id.to_string()))
            .bind(("limit", limit))
            .bind(("offset", start))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(self.attach(rows).await?)
    }

    async fn list_by_activity(
        &self,
        activity_id: Uuid,
        pagination: Pagination,
    ) -> DirectoryResult<Vec<Organization>> {
        if pagination.limit == 0 {
            return Ok(Vec::new());
        }
        let (limit, start) = limit_start(pagination);

        let mut result = self
            .db
            .query(Self::page_query("WHERE activity_ids CONTAINS $activity_id"))
            .bind(("activity_id", activity_id.to_string()))
            .bind(("limit", limit))
            .bind(("offset", start))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(self.attach(rows).await?)
    }

    async fn list_in_area(
        &self,
        area: BoundingBox,
        pagination: Pagination,
    ) -> DirectoryResult<Vec<Organization>> {
        if pagination.limit == 0 {
            return Ok(Vec::new());
        }
        let (limit, start) = limit_start(pagination);

        let mut result = self
            .db
            .query(Self::page_query(
                "WHERE building_id IN (\
                 SELECT VALUE meta::id(id) FROM building \
                 WHERE latitude >= $lat_min AND latitude <= $lat_max \
                 AND longitude >= $lon_min AND longitude <= $lon_max)",
            ))
            .bind(("lat_min", area.lat_min))
            .bind(("lat_max", area.lat_max))
            .bind(("lon_min", area.lon_min))
            .bind(("lon_max", area.lon_max))
            .bind(("limit", limit))
            .bind(("offset", start))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(self.attach(rows).await?)
    }

    async fn search_by_name(
        &self,
        fragment: &str,
        pagination: Pagination,
    ) -> DirectoryResult<Vec<Organization>> {
        if pagination.limit == 0 {
            return Ok(Vec::new());
        }
        let (limit, start) = limit_start(pagination);

        let mut result = self
            .db
            .query(Self::page_query(
                "WHERE string::lowercase(name) CONTAINS $fragment",
            ))
            .bind(("fragment", fragment.to_lowercase()))
            .bind(("limit", limit))
            .bind(("offset", start))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OrganizationRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(self.attach(rows).await?)
    }
}

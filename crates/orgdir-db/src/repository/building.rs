//! SurrealDB implementation of [`BuildingRepository`].

use chrono::{DateTime, Utc};
use orgdir_core::error::DirectoryResult;
use orgdir_core::models::building::{Building, CreateBuilding, UpdateBuilding};
use orgdir_core::repository::{BuildingRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{CountRow, limit_start, parse_id};
use crate::error::{DbError, STILL_REFERENCED};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct BuildingRow {
    address: String,
    latitude: f64,
    longitude: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BuildingRow {
    fn into_building(self, id: Uuid) -> Building {
        Building {
            id,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
pub(crate) struct BuildingRowWithId {
    record_id: String,
    address: String,
    latitude: f64,
    longitude: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BuildingRowWithId {
    pub(crate) fn try_into_building(self) -> Result<Building, DbError> {
        Ok(Building {
            id: parse_id(&self.record_id, "building")?,
            address: self.address,
            latitude: self.latitude,
            longitude: self.longitude,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Building repository.
#[derive(Clone)]
pub struct SurrealBuildingRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealBuildingRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn address_taken(&self, address: &str, except: Option<Uuid>) -> Result<bool, DbError> {
        let mut result = self
            .db
            .query("SELECT VALUE meta::id(id) FROM building WHERE address = $address")
            .bind(("address", address.to_string()))
            .await?;
        let ids: Vec<String> = result.take(0)?;
        let except = except.map(|id| id.to_string());
        Ok(ids.iter().any(|id| Some(id) != except.as_ref()))
    }
}

impl<C: Connection> BuildingRepository for SurrealBuildingRepository<C> {
    async fn create(&self, input: CreateBuilding) -> DirectoryResult<Building> {
        let input = input.normalized()?;
        if self.address_taken(&input.address, None).await? {
            return Err(DbError::Duplicate {
                entity: "building".into(),
            }
            .into());
        }

        let id = Uuid::now_v7();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('building', $id) SET \
                 address = $address, latitude = $latitude, longitude = $longitude",
            )
            .bind(("id", id_str.clone()))
            .bind(("address", input.address))
            .bind(("latitude", input.latitude))
            .bind(("longitude", input.longitude))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check(e, "building"))?;

        let rows: Vec<BuildingRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("building", &id_str))?;

        debug!(building_id = %id, "Building created");
        Ok(row.into_building(id))
    }

    async fn get_by_id(&self, id: Uuid) -> DirectoryResult<Building> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('building', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<BuildingRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("building", &id_str))?;

        Ok(row.into_building(id))
    }

    async fn update(&self, id: Uuid, input: UpdateBuilding) -> DirectoryResult<Building> {
        let input = input.normalized()?;
        let id_str = id.to_string();
        self.get_by_id(id).await?;

        if let Some(address) = &input.address {
            if self.address_taken(address, Some(id)).await? {
                return Err(DbError::Duplicate {
                    entity: "building".into(),
                }
                .into());
            }
        }

        let mut sets = Vec::new();
        if input.address.is_some() {
            sets.push("address = $address");
        }
        if input.latitude.is_some() {
            sets.push("latitude = $latitude");
        }
        if input.longitude.is_some() {
            sets.push("longitude = $longitude");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('building', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(address) = input.address {
            builder = builder.bind(("address", address));
        }
        if let Some(latitude) = input.latitude {
            builder = builder.bind(("latitude", latitude));
        }
        if let Some(longitude) = input.longitude {
            builder = builder.bind(("longitude", longitude));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check(e, "building"))?;

        let rows: Vec<BuildingRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("building", &id_str))?;

        Ok(row.into_building(id))
    }

    async fn delete(&self, id: Uuid) -> DirectoryResult<()> {
        let id_str = id.to_string();

        // Reference check and delete share one transaction, so an
        // organization cannot move in between.
        let query = format!(
            "BEGIN TRANSACTION;\n\
             IF array::len((SELECT VALUE id FROM organization \
             WHERE building_id = $id LIMIT 1)) > 0 {{ THROW '{STILL_REFERENCED}' }};\n\
             DELETE type::record('building', $id);\n\
             COMMIT TRANSACTION;"
        );

        self.db
            .query(query)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_guarded_delete(e, "building", &id_str))?;

        debug!(building_id = %id, "Building deleted");
        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> DirectoryResult<PaginatedResult<Building>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM building GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let items = if pagination.limit == 0 {
            Vec::new()
        } else {
            let (limit, start) = limit_start(pagination);
            let mut result = self
                .db
                .query(
                    "SELECT meta::id(id) AS record_id, * FROM building \
                     ORDER BY record_id ASC \
                     LIMIT $limit START $offset",
                )
                .bind(("limit", limit))
                .bind(("offset", start))
                .await
                .map_err(DbError::from)?;

            let rows: Vec<BuildingRowWithId> = result.take(0).map_err(DbError::from)?;
            rows.into_iter()
                .map(BuildingRowWithId::try_into_building)
                .collect::<Result<Vec<_>, DbError>>()?
        };

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}

//! SurrealDB implementation of [`ActivityRepository`].
//!
//! Parents are stored as an id string on the child. Only the `[1, 3]`
//! level bound is checked; a child's level is not compared with its
//! parent's.

use chrono::{DateTime, Utc};
use orgdir_core::error::{DirectoryError, DirectoryResult};
use orgdir_core::models::activity::{self, Activity, CreateActivity, UpdateActivity};
use orgdir_core::repository::{ActivityRepository, PaginatedResult, Pagination};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;
use uuid::Uuid;

use super::{CountRow, limit_start, parse_id};
use crate::error::{DbError, STILL_REFERENCED};

/// Upper bound on parent hops when checking a re-parenting for cycles.
const MAX_ANCESTOR_DEPTH: usize = 50;

#[derive(Debug, SurrealValue)]
struct ActivityRow {
    name: String,
    parent_id: Option<String>,
    level: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_level(level: u32) -> Result<u8, DbError> {
    u8::try_from(level).map_err(|_| DbError::Corrupt(format!("activity level {level} out of range")))
}

impl ActivityRow {
    fn into_activity(self, id: Uuid) -> Result<Activity, DbError> {
        Ok(Activity {
            id,
            name: self.name,
            parent_id: self
                .parent_id
                .map(|p| parse_id(&p, "parent activity"))
                .transpose()?,
            level: parse_level(self.level)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, SurrealValue)]
pub(crate) struct ActivityRowWithId {
    record_id: String,
    name: String,
    parent_id: Option<String>,
    level: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ActivityRowWithId {
    pub(crate) fn try_into_activity(self) -> Result<Activity, DbError> {
        let id = parse_id(&self.record_id, "activity")?;
        ActivityRow {
            name: self.name,
            parent_id: self.parent_id,
            level: self.level,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_activity(id)
    }
}

/// SurrealDB implementation of the Activity repository.
#[derive(Clone)]
pub struct SurrealActivityRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealActivityRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Reject a parent that is `id` itself or one of its descendants.
    async fn check_new_parent(&self, id: Uuid, parent_id: Uuid) -> DirectoryResult<()> {
        let mut current = Some(parent_id);
        for _ in 0..MAX_ANCESTOR_DEPTH {
            let Some(ancestor) = current else {
                return Ok(());
            };
            if ancestor == id {
                return Err(DirectoryError::validation(format!(
                    "activity {parent_id} is a descendant of {id}; re-parenting would create a cycle"
                )));
            }
            current = self.get_by_id(ancestor).await?.parent_id;
        }
        Err(DirectoryError::validation(format!(
            "ancestor chain of activity {parent_id} exceeds {MAX_ANCESTOR_DEPTH} levels"
        )))
    }
}

impl<C: Connection> ActivityRepository for SurrealActivityRepository<C> {
    async fn create(&self, input: CreateActivity) -> DirectoryResult<Activity> {
        activity::check_name(&input.name)?;
        let level = activity::check_level(input.level)?;
        if let Some(parent_id) = input.parent_id {
            self.get_by_id(parent_id).await?;
        }

        let id = Uuid::now_v7();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('activity', $id) SET \
                 name = $name, parent_id = $parent_id, level = $level",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("parent_id", input.parent_id.map(|p| p.to_string())))
            .bind(("level", u32::from(level)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_check(e, "activity"))?;

        let rows: Vec<ActivityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("activity", &id_str))?;

        debug!(activity_id = %id, level, "Activity created");
        Ok(row.into_activity(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> DirectoryResult<Activity> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('activity', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ActivityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("activity", &id_str))?;

        Ok(row.into_activity(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateActivity) -> DirectoryResult<Activity> {
        let id_str = id.to_string();
        self.get_by_id(id).await?;

        if let Some(name) = &input.name {
            activity::check_name(name)?;
        }
        let level = input.level.map(activity::check_level).transpose()?;
        if let Some(Some(parent_id)) = input.parent_id {
            self.check_new_parent(id, parent_id).await?;
        }

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.parent_id.is_some() {
            sets.push("parent_id = $parent_id");
        }
        if level.is_some() {
            sets.push("level = $level");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('activity', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));
        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(parent_id) = input.parent_id {
            builder = builder.bind(("parent_id", parent_id.map(|p| p.to_string())));
        }
        if let Some(level) = level {
            builder = builder.bind(("level", u32::from(level)));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_check(e, "activity"))?;

        let rows: Vec<ActivityRow> = result.take(0).map_err(DbError::from)?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found("activity", &id_str))?;

        Ok(row.into_activity(id)?)
    }

    async fn delete(&self, id: Uuid) -> DirectoryResult<()> {
        let id_str = id.to_string();

        let query = format!(
            "BEGIN TRANSACTION;\n\
             IF array::len((SELECT VALUE id FROM activity WHERE parent_id = $id LIMIT 1)) > 0 \
             OR array::len((SELECT VALUE id FROM organization \
             WHERE activity_ids CONTAINS $id LIMIT 1)) > 0 \
             {{ THROW '{STILL_REFERENCED}' }};\n\
             DELETE type::record('activity', $id);\n\
             COMMIT TRANSACTION;"
        );

        self.db
            .query(query)
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::from_guarded_delete(e, "activity", &id_str))?;

        debug!(activity_id = %id, "Activity deleted");
        Ok(())
    }

    async fn list(&self, pagination: Pagination) -> DirectoryResult<PaginatedResult<Activity>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM activity GROUP ALL")
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
                    "SELECT meta::id(id) AS record_id, * FROM activity \
                     ORDER BY record_id ASC \
                     LIMIT $limit START $offset",
                )
                .bind(("limit", limit))
                .bind(("offset", start))
                .await
                .map_err(DbError::from)?;

            let rows: Vec<ActivityRowWithId> = result.take(0).map_err(DbError::from)?;
            rows.into_iter()
                .map(ActivityRowWithId::try_into_activity)
                .collect::<Result<Vec<_>, DbError>>()?
        };

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn get_children(&self, parent_id: Uuid) -> DirectoryResult<Vec<Activity>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM activity \
                 WHERE parent_id = $parent_id \
                 ORDER BY record_id ASC",
            )
            .bind(("parent_id", parent_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ActivityRowWithId> = result.take(0).map_err(DbError::from)?;

        rows.into_iter()
            .map(ActivityRowWithId::try_into_activity)
            .collect::<Result<Vec<_>, DbError>>()
            .map_err(Into::into)
    }
}

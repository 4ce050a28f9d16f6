//! Schema definitions and the versioned schema runner for SurrealDB.
//!
//! Tables are SCHEMAFULL. Identifiers are UUID v7 strings used as
//! record keys; relations are stored as id strings. Uniqueness and
//! range invariants are enforced by indexes and ASSERT clauses so they
//! hold for writers that bypass the repositories (e.g. bulk imports).

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct AppliedVersion {
    version: u32,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "directory_schema",
    sql: SCHEMA_V1,
}];

/// Highest schema version this build knows how to apply.
fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

const SCHEMA_V1: &str = "\
-- Buildings
DEFINE TABLE building SCHEMAFULL;
DEFINE FIELD address ON TABLE building TYPE string;
DEFINE FIELD latitude ON TABLE building TYPE float \
    ASSERT $value >= -90 AND $value <= 90;
DEFINE FIELD longitude ON TABLE building TYPE float \
    ASSERT $value >= -180 AND $value <= 180;
DEFINE FIELD created_at ON TABLE building TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE building TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_building_address ON TABLE building \
    COLUMNS address UNIQUE;
DEFINE INDEX idx_building_lat_lon ON TABLE building \
    COLUMNS latitude, longitude;

-- Activities (self-referential tree, levels 1..3)
DEFINE TABLE activity SCHEMAFULL;
DEFINE FIELD name ON TABLE activity TYPE string;
DEFINE FIELD parent_id ON TABLE activity TYPE option<string>;
DEFINE FIELD level ON TABLE activity TYPE int \
    ASSERT $value >= 1 AND $value <= 3;
DEFINE FIELD created_at ON TABLE activity TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE activity TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_activity_parent ON TABLE activity COLUMNS parent_id;
DEFINE INDEX idx_activity_name ON TABLE activity COLUMNS name;

-- Organizations
DEFINE TABLE organization SCHEMAFULL;
DEFINE FIELD name ON TABLE organization TYPE string;
DEFINE FIELD building_id ON TABLE organization TYPE string;
DEFINE FIELD activity_ids ON TABLE organization TYPE array<string> \
    DEFAULT [];
DEFINE FIELD created_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE organization TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_organization_building ON TABLE organization \
    COLUMNS building_id;
DEFINE INDEX idx_organization_name ON TABLE organization COLUMNS name;

-- Phones (owned by an organization, globally unique numbers)
DEFINE TABLE phone SCHEMAFULL;
DEFINE FIELD organization_id ON TABLE phone TYPE string;
DEFINE FIELD number ON TABLE phone TYPE string;
DEFINE INDEX idx_phone_number ON TABLE phone COLUMNS number UNIQUE;
DEFINE INDEX idx_phone_organization ON TABLE phone \
    COLUMNS organization_id;
";

/// Apply every schema version newer than the one recorded in the database.
///
/// The `_migration` tracking table is created on first run. Re-running
/// against an up-to-date database is a no-op.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let applied: Vec<AppliedVersion> = result.take(0)?;
    let current_version = applied.first().map(|m| m.version).unwrap_or(0);

    let pending = MIGRATIONS
        .iter()
        .filter(|migration| migration.version > current_version);

    for migration in pending {
        info!(
            version = migration.version,
            name = migration.name,
            "Applying schema version"
        );

        db.query(migration.sql).await?.check().map_err(|e| {
            DbError::Migration(format!(
                "schema v{} '{}' failed: {e}",
                migration.version, migration.name
            ))
        })?;

        db.query("CREATE _migration SET version = $version, name = $name")
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "recording schema v{} failed: {e}",
                    migration.version
                ))
            })?;
    }

    info!(
        version = latest_version().max(current_version),
        "Schema is up to date"
    );
    Ok(())
}

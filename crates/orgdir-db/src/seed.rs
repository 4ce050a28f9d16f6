//! Demo dataset for local runs and integration tests.
//!
//! Seeding is idempotent: buildings are matched by address, activities
//! and organizations by name, and anything already present is reused.

use std::collections::BTreeMap;

use orgdir_core::error::DirectoryResult;
use orgdir_core::models::activity::CreateActivity;
use orgdir_core::models::building::CreateBuilding;
use orgdir_core::models::organization::CreateOrganization;
use orgdir_core::repository::{ActivityRepository, BuildingRepository, OrganizationRepository};
use surrealdb::{Connection, Surreal};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{
    SurrealActivityRepository, SurrealBuildingRepository, SurrealOrganizationRepository, parse_id,
};

pub const MAIN_STREET: &str = "Main St, 1";
pub const RIVER_ROAD: &str = "River Rd, 5";
pub const HILL_AVENUE: &str = "Hill Ave, 10";
pub const PARK_LANE: &str = "Park Lane, 20";

const BUILDINGS: &[(&str, f64, f64)] = &[
    (MAIN_STREET, 55.751244, 37.618423),
    (RIVER_ROAD, 55.76, 37.62),
    (HILL_AVENUE, 55.74, 37.60),
    (PARK_LANE, 55.77, 37.63),
];

/// `(name, parent, level)`, parents listed before children.
const ACTIVITIES: &[(&str, Option<&str>, u8)] = &[
    ("Food", None, 1),
    ("Meat products", Some("Food"), 2),
    ("Dairy products", Some("Food"), 2),
    ("Technology", None, 1),
    ("Software", Some("Technology"), 2),
    ("AI", Some("Software"), 3),
];

struct DemoOrganization {
    name: &'static str,
    building: &'static str,
    activities: &'static [&'static str],
    phones: &'static [&'static str],
}

const ORGANIZATIONS: &[DemoOrganization] = &[
    DemoOrganization {
        name: "Horns & Hooves LLC",
        building: MAIN_STREET,
        activities: &["Meat products", "Dairy products"],
        phones: &["+7 900 000-00-01", "+7 900 000-00-02"],
    },
    DemoOrganization {
        name: "Tasty Sole Trader",
        building: RIVER_ROAD,
        activities: &["Meat products"],
        phones: &["+7 900 000-00-03"],
    },
    DemoOrganization {
        name: "Milk JSC",
        building: RIVER_ROAD,
        activities: &["Dairy products"],
        phones: &["+7 900 000-00-04"],
    },
    DemoOrganization {
        name: "TechStar LLC",
        building: HILL_AVENUE,
        activities: &["Technology", "Software"],
        phones: &["+7 900 000-00-05"],
    },
    DemoOrganization {
        name: "SoftHub JSC",
        building: HILL_AVENUE,
        activities: &["Software", "AI"],
        phones: &["+7 900 000-00-06"],
    },
    DemoOrganization {
        name: "iLab LLC",
        building: PARK_LANE,
        activities: &["AI"],
        phones: &["+7 900 000-00-07"],
    },
    DemoOrganization {
        name: "Farmer LLC",
        building: MAIN_STREET,
        activities: &["Meat products"],
        phones: &["+7 900 000-00-08"],
    },
    DemoOrganization {
        name: "Cheese Dairy LLC",
        building: PARK_LANE,
        activities: &["Dairy products"],
        phones: &["+7 900 000-00-09"],
    },
    DemoOrganization {
        name: "MeatCo Sole Trader",
        building: MAIN_STREET,
        activities: &["Meat products"],
        phones: &["+7 900 000-00-10"],
    },
    DemoOrganization {
        name: "Innovations LLC",
        building: PARK_LANE,
        activities: &["Technology", "Software", "AI"],
        phones: &[],
    },
];

/// Ids resolved while seeding, keyed by address or name.
#[derive(Debug, Clone, Default)]
pub struct SeedSummary {
    pub buildings: BTreeMap<String, Uuid>,
    pub activities: BTreeMap<String, Uuid>,
    pub organizations: BTreeMap<String, Uuid>,
    /// Number of records inserted by this call (zero on a re-run).
    pub inserted: usize,
}

impl SeedSummary {
    pub fn building(&self, address: &str) -> Option<Uuid> {
        self.buildings.get(address).copied()
    }

    pub fn activity(&self, name: &str) -> Option<Uuid> {
        self.activities.get(name).copied()
    }

    pub fn organization(&self, name: &str) -> Option<Uuid> {
        self.organizations.get(name).copied()
    }
}

async fn find_existing<C: Connection>(
    db: &Surreal<C>,
    query: &'static str,
    value: &str,
) -> Result<Option<Uuid>, DbError> {
    let mut result = db
        .query(query)
        .bind(("value", value.to_string()))
        .await
        .map_err(DbError::from)?;
    let ids: Vec<String> = result.take(0).map_err(DbError::from)?;
    ids.first()
        .map(|raw| parse_id(raw, "seeded record"))
        .transpose()
}

fn resolved(map: &BTreeMap<String, Uuid>, key: &str) -> Result<Uuid, DbError> {
    map.get(key)
        .copied()
        .ok_or_else(|| DbError::Corrupt(format!("seed reference {key} was not resolved")))
}

/// Insert the demo dataset, reusing whatever already exists.
pub async fn seed_demo_data<C: Connection>(db: &Surreal<C>) -> DirectoryResult<SeedSummary> {
    let buildings = SurrealBuildingRepository::new(db.clone());
    let activities = SurrealActivityRepository::new(db.clone());
    let organizations = SurrealOrganizationRepository::new(db.clone());
    let mut summary = SeedSummary::default();

    for &(address, latitude, longitude) in BUILDINGS {
        let existing = find_existing(
            db,
            "SELECT VALUE meta::id(id) FROM building WHERE address = $value LIMIT 1",
            address,
        )
        .await?;
        let id = match existing {
            Some(id) => id,
            None => {
                summary.inserted += 1;
                buildings
                    .create(CreateBuilding {
                        address: address.into(),
                        latitude,
                        longitude,
                    })
                    .await?
                    .id
            }
        };
        summary.buildings.insert(address.into(), id);
    }

    for &(name, parent, level) in ACTIVITIES {
        let existing = find_existing(
            db,
            "SELECT VALUE meta::id(id) FROM activity WHERE name = $value LIMIT 1",
            name,
        )
        .await?;
        let id = match existing {
            Some(id) => id,
            None => {
                let parent_id = parent
                    .map(|p| resolved(&summary.activities, p))
                    .transpose()?;
                summary.inserted += 1;
                activities
                    .create(CreateActivity {
                        name: name.into(),
                        parent_id,
                        level,
                    })
                    .await?
                    .id
            }
        };
        summary.activities.insert(name.into(), id);
    }

    for demo in ORGANIZATIONS {
        let existing = find_existing(
            db,
            "SELECT VALUE meta::id(id) FROM organization WHERE name = $value LIMIT 1",
            demo.name,
        )
        .await?;
        let id = match existing {
            Some(id) => id,
            None => {
                let activity_ids = demo
                    .activities
                    .iter()
                    .map(|name| resolved(&summary.activities, name))
                    .collect::<Result<Vec<_>, _>>()?;
                let input = CreateOrganization {
                    name: demo.name.into(),
                    building_id: resolved(&summary.buildings, demo.building)?,
                    phones: demo.phones.iter().map(|p| p.to_string()).collect(),
                    activity_ids,
                };
                summary.inserted += 1;
                let organization = organizations.create(input).await?;
                debug!(organization_id = %organization.id, name = demo.name, "Seeded organization");
                organization.id
            }
        };
        summary.organizations.insert(demo.name.into(), id);
    }

    info!(
        buildings = summary.buildings.len(),
        activities = summary.activities.len(),
        organizations = summary.organizations.len(),
        inserted = summary.inserted,
        "Demo data seeded"
    );
    Ok(summary)
}

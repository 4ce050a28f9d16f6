//! Integration tests for the Activity repository using in-memory SurrealDB.

use orgdir_core::error::DirectoryError;
use orgdir_core::models::activity::{Activity, CreateActivity, UpdateActivity};
use orgdir_core::models::building::CreateBuilding;
use orgdir_core::models::organization::CreateOrganization;
use orgdir_core::repository::{
    ActivityRepository, BuildingRepository, OrganizationRepository, Pagination,
};
use orgdir_db::repository::{
    SurrealActivityRepository, SurrealBuildingRepository, SurrealOrganizationRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

async fn setup() -> Surreal<Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    orgdir_db::run_migrations(&db).await.unwrap();
    db
}

async fn add(
    repo: &SurrealActivityRepository<Db>,
    name: &str,
    parent: Option<&Activity>,
    level: u8,
) -> Activity {
    repo.create(CreateActivity {
        name: name.into(),
        parent_id: parent.map(|p| p.id),
        level,
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn create_root_and_child() {
    let repo = SurrealActivityRepository::new(setup().await);

    let food = add(&repo, "Food", None, 1).await;
    let meat = add(&repo, "Meat products", Some(&food), 2).await;

    assert_eq!(food.parent_id, None);
    assert_eq!(meat.parent_id, Some(food.id));
    assert_eq!(repo.get_by_id(meat.id).await.unwrap(), meat);
}

#[tokio::test]
async fn level_outside_range_is_rejected() {
    let repo = SurrealActivityRepository::new(setup().await);

    for level in [0, 4] {
        let err = repo
            .create(CreateActivity {
                name: "Too deep".into(),
                parent_id: None,
                level,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Validation { .. }));
    }
}

#[tokio::test]
async fn level_is_not_checked_against_parent() {
    let repo = SurrealActivityRepository::new(setup().await);

    let root = add(&repo, "Root", None, 1).await;
    let odd = add(&repo, "Odd child", Some(&root), 3).await;
    assert_eq!(odd.level, 3);
}

#[tokio::test]
async fn unknown_parent_is_not_found() {
    let repo = SurrealActivityRepository::new(setup().await);

    let err = repo
        .create(CreateActivity {
            name: "Orphan".into(),
            parent_id: Some(Uuid::now_v7()),
            level: 2,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound { .. }));
}

#[tokio::test]
async fn get_children_returns_direct_children_only() {
    let repo = SurrealActivityRepository::new(setup().await);

    let tech = add(&repo, "Technology", None, 1).await;
    let software = add(&repo, "Software", Some(&tech), 2).await;
    let hardware = add(&repo, "Hardware", Some(&tech), 2).await;
    add(&repo, "AI", Some(&software), 3).await;

    let children = repo.get_children(tech.id).await.unwrap();
    let ids: Vec<_> = children.iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![software.id, hardware.id]);

    assert!(repo.get_children(hardware.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn reparenting_under_descendant_is_rejected() {
    let repo = SurrealActivityRepository::new(setup().await);

    let tech = add(&repo, "Technology", None, 1).await;
    let software = add(&repo, "Software", Some(&tech), 2).await;
    let ai = add(&repo, "AI", Some(&software), 3).await;

    let err = repo
        .update(
            tech.id,
            UpdateActivity {
                parent_id: Some(Some(ai.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Validation { .. }));

    let err = repo
        .update(
            tech.id,
            UpdateActivity {
                parent_id: Some(Some(tech.id)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::Validation { .. }));
}

#[tokio::test]
async fn parent_can_be_cleared() {
    let repo = SurrealActivityRepository::new(setup().await);

    let tech = add(&repo, "Technology", None, 1).await;
    let software = add(&repo, "Software", Some(&tech), 2).await;

    let detached = repo
        .update(
            software.id,
            UpdateActivity {
                parent_id: Some(None),
                level: Some(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(detached.parent_id, None);
    assert_eq!(detached.level, 1);
    assert!(repo.get_children(tech.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_is_restricted_by_children_and_tags() {
    let db = setup().await;
    let activities = SurrealActivityRepository::new(db.clone());
    let buildings = SurrealBuildingRepository::new(db.clone());
    let organizations = SurrealOrganizationRepository::new(db);

    let food = add(&activities, "Food", None, 1).await;
    let dairy = add(&activities, "Dairy products", Some(&food), 2).await;

    let err = activities.delete(food.id).await.unwrap_err();
    assert!(matches!(err, DirectoryError::InUse { .. }));

    let site = buildings
        .create(CreateBuilding {
            address: "River Rd, 5".into(),
            latitude: 55.76,
            longitude: 37.62,
        })
        .await
        .unwrap();
    let milk = organizations
        .create(CreateOrganization {
            name: "Milk JSC".into(),
            building_id: site.id,
            phones: vec![],
            activity_ids: vec![dairy.id],
        })
        .await
        .unwrap();

    let err = activities.delete(dairy.id).await.unwrap_err();
    assert!(matches!(err, DirectoryError::InUse { .. }));
    assert_eq!(activities.get_by_id(dairy.id).await.unwrap(), dairy);

    // Once nothing points at them, leaf first, both can go.
    organizations.delete(milk.id).await.unwrap();
    activities.delete(dairy.id).await.unwrap();
    activities.delete(food.id).await.unwrap();
    assert!(matches!(
        activities.get_by_id(food.id).await.unwrap_err(),
        DirectoryError::NotFound { .. }
    ));
}

#[tokio::test]
async fn list_reports_total() {
    let repo = SurrealActivityRepository::new(setup().await);
    let root = add(&repo, "Root", None, 1).await;
    add(&repo, "Leaf", Some(&root), 2).await;

    let page = repo.list(Pagination::new(0, 1)).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, root.id);
}

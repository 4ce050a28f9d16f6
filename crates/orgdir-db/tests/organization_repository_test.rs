//! Integration tests for the Organization repository using in-memory SurrealDB.

use orgdir_core::error::DirectoryError;
use orgdir_core::geo::BoundingBox;
use orgdir_core::models::activity::{Activity, CreateActivity};
use orgdir_core::models::building::{Building, CreateBuilding};
use orgdir_core::models::organization::{CreateOrganization, UpdateOrganization};
use orgdir_core::repository::{
    ActivityRepository, BuildingRepository, OrganizationRepository, Pagination,
};
use orgdir_db::repository::{
    SurrealActivityRepository, SurrealBuildingRepository, SurrealOrganizationRepository,
};
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;

struct Fixture {
    organizations: SurrealOrganizationRepository<Db>,
    main_street: Building,
    river_road: Building,
    meat: Activity,
    dairy: Activity,
}

async fn setup() -> Fixture {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    orgdir_db::run_migrations(&db).await.unwrap();

    let buildings = SurrealBuildingRepository::new(db.clone());
    let main_street = buildings
        .create(CreateBuilding {
            address: "Main St, 1".into(),
            latitude: 55.751244,
            longitude: 37.618423,
        })
        .await
        .unwrap();
    let river_road = buildings
        .create(CreateBuilding {
            address: "River Rd, 5".into(),
            latitude: 55.76,
            longitude: 37.62,
        })
        .await
        .unwrap();

    let activities = SurrealActivityRepository::new(db.clone());
    let food = activities
        .create(CreateActivity {
            name: "Food".into(),
            parent_id: None,
            level: 1,
        })
        .await
        .unwrap();
    let meat = activities
        .create(CreateActivity {
            name: "Meat products".into(),
            parent_id: Some(food.id),
            level: 2,
        })
        .await
        .unwrap();
    let dairy = activities
        .create(CreateActivity {
            name: "Dairy products".into(),
            parent_id: Some(food.id),
            level: 2,
        })
        .await
        .unwrap();

    Fixture {
        organizations: SurrealOrganizationRepository::new(db),
        main_street,
        river_road,
        meat,
        dairy,
    }
}

fn org(
    name: &str,
    building: &Building,
    phones: &[&str],
    activities: &[&Activity],
) -> CreateOrganization {
    CreateOrganization {
        name: name.into(),
        building_id: building.id,
        phones: phones.iter().map(|p| p.to_string()).collect(),
        activity_ids: activities.iter().map(|a| a.id).collect(),
    }
}

#[tokio::test]
async fn create_attaches_building_phones_and_activities() {
    let f = setup().await;

    let created = f
        .organizations
        .create(org(
            "Horns & Hooves LLC",
            &f.main_street,
            &["+7 900 000-00-01", "+7 900 000-00-02"],
            &[&f.dairy, &f.meat],
        ))
        .await
        .unwrap();

    assert_eq!(created.building, f.main_street);
    let numbers: Vec<_> = created.phones.iter().map(|p| p.number.as_str()).collect();
    assert_eq!(numbers, vec!["+7 900 000-00-01", "+7 900 000-00-02"]);
    let activity_ids: Vec<_> = created.activities.iter().map(|a| a.id).collect();
    assert_eq!(activity_ids, vec![f.meat.id, f.dairy.id]);
    assert!(created.phones.iter().all(|p| p.organization_id == created.id));

    let fetched = f.organizations.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn create_with_missing_building_is_not_found() {
    let f = setup().await;
    let mut input = org("Ghost LLC", &f.main_street, &[], &[]);
    input.building_id = Uuid::now_v7();

    let err = f.organizations.create(input).await.unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound { entity, .. } if entity == "building"));
}

#[tokio::test]
async fn create_with_missing_activity_is_not_found() {
    let f = setup().await;
    let mut input = org("Ghost LLC", &f.main_street, &[], &[&f.meat]);
    input.activity_ids.push(Uuid::now_v7());

    let err = f.organizations.create(input).await.unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound { entity, .. } if entity == "activity"));
}

#[tokio::test]
async fn phone_numbers_are_globally_unique() {
    let f = setup().await;
    f.organizations
        .create(org("First LLC", &f.main_street, &["+7 900 000-00-01"], &[]))
        .await
        .unwrap();

    let err = f
        .organizations
        .create(org("Second LLC", &f.river_road, &["+7 900 000-00-01"], &[]))
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::AlreadyExists { .. }));
}

#[tokio::test]
async fn get_missing_organization_is_not_found() {
    let f = setup().await;
    let err = f.organizations.get_by_id(Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound { .. }));
}

#[tokio::test]
async fn update_replaces_phones_and_activities() {
    let f = setup().await;
    let created = f
        .organizations
        .create(org(
            "Farmer LLC",
            &f.main_street,
            &["+7 900 000-00-08"],
            &[&f.meat],
        ))
        .await
        .unwrap();

    let updated = f
        .organizations
        .update(
            created.id,
            UpdateOrganization {
                building_id: Some(f.river_road.id),
                phones: Some(vec!["+7 900 000-00-08".into(), "+7 900 000-00-09".into()]),
                activity_ids: Some(vec![f.dairy.id]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Farmer LLC");
    assert_eq!(updated.building.id, f.river_road.id);
    assert_eq!(updated.phones.len(), 2);
    assert_eq!(updated.activities.len(), 1);
    assert_eq!(updated.activities[0].id, f.dairy.id);
}

#[tokio::test]
async fn update_to_missing_building_is_not_found_and_changes_nothing() {
    let f = setup().await;
    let created = f
        .organizations
        .create(org("Farmer LLC", &f.main_street, &["+7 900 000-00-08"], &[]))
        .await
        .unwrap();

    let err = f
        .organizations
        .update(
            created.id,
            UpdateOrganization {
                name: Some("Moved LLC".into()),
                building_id: Some(Uuid::now_v7()),
                phones: Some(vec![]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DirectoryError::NotFound { entity, .. } if entity == "building"));

    let unchanged = f.organizations.get_by_id(created.id).await.unwrap();
    assert_eq!(unchanged.name, "Farmer LLC");
    assert_eq!(unchanged.building.id, f.main_street.id);
    assert_eq!(unchanged.phones.len(), 1);
}

#[tokio::test]
async fn delete_cascades_phones() {
    let f = setup().await;
    let created = f
        .organizations
        .create(org("Milk JSC", &f.river_road, &["+7 900 000-00-04"], &[&f.dairy]))
        .await
        .unwrap();

    f.organizations.delete(created.id).await.unwrap();
    assert!(matches!(
        f.organizations.get_by_id(created.id).await.unwrap_err(),
        DirectoryError::NotFound { .. }
    ));

    // The number is free again once its owner is gone.
    f.organizations
        .create(org("Milk JSC", &f.river_road, &["+7 900 000-00-04"], &[&f.dairy]))
        .await
        .unwrap();
}

#[tokio::test]
async fn list_by_building_and_activity() {
    let f = setup().await;
    let horns = f
        .organizations
        .create(org("Horns LLC", &f.main_street, &[], &[&f.meat, &f.dairy]))
        .await
        .unwrap();
    let milk = f
        .organizations
        .create(org("Milk JSC", &f.river_road, &[], &[&f.dairy]))
        .await
        .unwrap();

    let at_main = f
        .organizations
        .list_by_building(f.main_street.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(at_main.iter().map(|o| o.id).collect::<Vec<_>>(), vec![horns.id]);

    let dairy = f
        .organizations
        .list_by_activity(f.dairy.id, Pagination::default())
        .await
        .unwrap();
    assert_eq!(
        dairy.iter().map(|o| o.id).collect::<Vec<_>>(),
        vec![horns.id, milk.id]
    );

    let empty = f
        .organizations
        .list_by_activity(f.dairy.id, Pagination::new(0, 0))
        .await
        .unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn list_by_building_honors_offset() {
    let f = setup().await;
    let mut created = Vec::new();
    for name in ["First LLC", "Second LLC", "Third LLC"] {
        let organization = f
            .organizations
            .create(org(name, &f.main_street, &[], &[&f.meat]))
            .await
            .unwrap();
        created.push(organization.id);
    }

    let mut paged = Vec::new();
    for offset in 0..4 {
        let page = f
            .organizations
            .list_by_building(f.main_street.id, Pagination::new(offset, 1))
            .await
            .unwrap();
        paged.extend(page.iter().map(|o| o.id));
    }
    assert_eq!(paged, created);

    let tail = f
        .organizations
        .list_by_activity(f.meat.id, Pagination::new(2, 5))
        .await
        .unwrap();
    assert_eq!(tail.iter().map(|o| o.id).collect::<Vec<_>>(), vec![created[2]]);
}

#[tokio::test]
async fn list_in_area_is_inclusive() {
    let f = setup().await;
    let horns = f
        .organizations
        .create(org("Horns LLC", &f.main_street, &[], &[]))
        .await
        .unwrap();
    f.organizations
        .create(org("Milk JSC", &f.river_road, &[], &[]))
        .await
        .unwrap();

    let exact = BoundingBox::from_corners(
        f.main_street.latitude,
        f.main_street.longitude,
        55.70,
        37.60,
    );
    let found = f
        .organizations
        .list_in_area(exact, Pagination::default())
        .await
        .unwrap();
    assert_eq!(found.iter().map(|o| o.id).collect::<Vec<_>>(), vec![horns.id]);

    let wide = BoundingBox::from_corners(55.80, 37.70, 55.70, 37.50);
    let found = f
        .organizations
        .list_in_area(wide, Pagination::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn search_by_name_is_case_insensitive_substring() {
    let f = setup().await;
    f.organizations
        .create(org("Horns & Hooves LLC", &f.main_street, &[], &[]))
        .await
        .unwrap();
    f.organizations
        .create(org("Milk JSC", &f.river_road, &[], &[]))
        .await
        .unwrap();

    let found = f
        .organizations
        .search_by_name("HOOVES", Pagination::default())
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Horns & Hooves LLC");

    let none = f
        .organizations
        .search_by_name("bakery", Pagination::default())
        .await
        .unwrap();
    assert!(none.is_empty());
}

//! Integration tests for demo-data seeding using in-memory SurrealDB.

use orgdir_core::repository::{OrganizationRepository, Pagination};
use orgdir_db::repository::SurrealOrganizationRepository;
use orgdir_db::seed::{MAIN_STREET, seed_demo_data};
use surrealdb::Surreal;
use surrealdb::engine::local::Mem;

#[tokio::test]
async fn seeding_populates_the_demo_dataset() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    orgdir_db::run_migrations(&db).await.unwrap();

    let summary = seed_demo_data(&db).await.unwrap();
    assert_eq!(summary.buildings.len(), 4);
    assert_eq!(summary.activities.len(), 6);
    assert_eq!(summary.organizations.len(), 10);
    assert_eq!(summary.inserted, 20);

    let horns = summary.organization("Horns & Hooves LLC").unwrap();
    let horns = SurrealOrganizationRepository::new(db.clone())
        .get_by_id(horns)
        .await
        .unwrap();
    assert_eq!(horns.building.address, MAIN_STREET);
    assert_eq!(horns.phones.len(), 2);
    assert_eq!(horns.activities.len(), 2);
}

#[tokio::test]
async fn seeding_twice_reuses_existing_records() {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    orgdir_db::run_migrations(&db).await.unwrap();

    let first = seed_demo_data(&db).await.unwrap();
    let second = seed_demo_data(&db).await.unwrap();

    assert_eq!(second.inserted, 0);
    assert_eq!(first.organizations, second.organizations);

    let at_main = SurrealOrganizationRepository::new(db)
        .list_by_building(second.building(MAIN_STREET).unwrap(), Pagination::default())
        .await
        .unwrap();
    assert_eq!(at_main.len(), 3);
}

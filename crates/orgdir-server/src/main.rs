//! Organization directory: process entry point.

mod cli;
mod logging;

use clap::Parser;
use orgdir_core::repository::Pagination;
use orgdir_db::DbManager;
use orgdir_db::seed::seed_demo_data;
use orgdir_search::DirectoryService;
use tracing::info;

use crate::cli::Args;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init(args.json_logs);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting organization directory");

    let db = DbManager::connect(&args.db_config()).await?;

    if args.seed {
        let summary = seed_demo_data(db.client()).await?;
        info!(inserted = summary.inserted, "Seeding finished");
    }

    let repos = db.repositories();
    let service = DirectoryService::new(
        repos.organizations,
        repos.activities,
        repos.buildings,
        args.search_config(),
    );

    let buildings = service.list_buildings(Pagination::new(0, 1)).await?;
    info!(buildings = buildings.total, "Directory ready; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}

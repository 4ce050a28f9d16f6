//! Store connection: engine selection, root sign-in, namespace selection
//! and schema application.

use std::fmt;

use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use surrealdb::opt::auth::Root;
use tracing::{debug, info};

use crate::error::DbError;
use crate::repository::{
    SurrealActivityRepository, SurrealBuildingRepository, SurrealOrganizationRepository,
};
use crate::schema::run_migrations;

/// Where and how to reach the store.
///
/// `url` carries the engine scheme: `mem://` for an in-process store,
/// `ws://host:port` for a remote server.
#[derive(Clone)]
pub struct DbConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    /// Root credentials, ignored by the in-memory engine.
    pub username: String,
    pub password: String,
}

impl DbConfig {
    fn is_embedded(&self) -> bool {
        self.url.starts_with("mem://")
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8000".into(),
            namespace: "orgdir".into(),
            database: "directory".into(),
            username: "root".into(),
            password: "root".into(),
        }
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("url", &self.url)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The three repositories sharing one connection.
#[derive(Clone)]
pub struct Repositories {
    pub buildings: SurrealBuildingRepository<Any>,
    pub activities: SurrealActivityRepository<Any>,
    pub organizations: SurrealOrganizationRepository<Any>,
}

/// An open, migrated store connection.
#[derive(Clone)]
pub struct DbManager {
    db: Surreal<Any>,
}

impl DbManager {
    /// Open the store described by `config` and bring its schema up to date.
    pub async fn connect(config: &DbConfig) -> Result<Self, DbError> {
        info!(
            url = %config.url,
            namespace = %config.namespace,
            database = %config.database,
            "Connecting to store"
        );

        let db = any::connect(config.url.as_str()).await?;

        if config.is_embedded() {
            debug!("Embedded engine, skipping sign-in");
        } else {
            db.signin(Root {
                username: config.username.clone(),
                password: config.password.clone(),
            })
            .await?;
        }

        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await?;

        run_migrations(&db).await?;
        info!("Store ready");

        Ok(Self { db })
    }

    pub fn client(&self) -> &Surreal<Any> {
        &self.db
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            buildings: SurrealBuildingRepository::new(self.db.clone()),
            activities: SurrealActivityRepository::new(self.db.clone()),
            organizations: SurrealOrganizationRepository::new(self.db.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_password() {
        let config = DbConfig {
            password: "hunter2".into(),
            ..DbConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn mem_scheme_is_embedded() {
        let config = DbConfig {
            url: "mem://".into(),
            ..DbConfig::default()
        };
        assert!(config.is_embedded());
        assert!(!DbConfig::default().is_embedded());
    }
}

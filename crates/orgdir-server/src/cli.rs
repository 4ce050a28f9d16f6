//! Command-line arguments.

use clap::Parser;
use orgdir_db::DbConfig;
use orgdir_search::SearchConfig;

#[derive(Parser, Debug)]
#[command(name = "orgdir")]
#[command(about = "Organization directory: buildings, activities and geo search")]
pub struct Args {
    /// Store URL, `mem://` for an in-process store or `ws://host:port`
    #[arg(long, default_value = "ws://127.0.0.1:8000")]
    pub db_url: String,

    /// Store namespace
    #[arg(long, default_value = "orgdir")]
    pub namespace: String,

    /// Store database
    #[arg(long, default_value = "directory")]
    pub database: String,

    /// Root user for remote stores
    #[arg(long, default_value = "root")]
    pub db_user: String,

    /// Root password for remote stores
    #[arg(long, default_value = "root", hide_default_value = true)]
    pub db_password: String,

    /// Shared secret expected in the X-API-Key header
    #[arg(long)]
    pub api_key: String,

    /// Insert the demo dataset after applying the schema
    #[arg(long)]
    pub seed: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json_logs: bool,
}

impl Args {
    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            url: self.db_url.clone(),
            namespace: self.namespace.clone(),
            database: self.database.clone(),
            username: self.db_user.clone(),
            password: self.db_password.clone(),
        }
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            api_key: self.api_key.clone(),
            ..SearchConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_configs() {
        let args = Args::parse_from(["orgdir", "--api-key", "k", "--db-url", "mem://"]);
        assert!(!args.seed);
        assert!(!args.json_logs);

        let db = args.db_config();
        assert_eq!(db.url, "mem://");
        assert_eq!(db.namespace, "orgdir");
        assert_eq!(db.database, "directory");

        let search = args.search_config();
        assert_eq!(search.api_key, "k");
        assert_eq!(search.radius_candidate_cap, 10_000);
    }

    #[test]
    fn api_key_is_required() {
        assert!(Args::try_parse_from(["orgdir"]).is_err());
    }
}

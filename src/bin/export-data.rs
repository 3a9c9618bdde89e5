//! Dumps every collection, its documents and their direct subcollections to a JSON file.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use hrm_functions::config::Config;
use hrm_functions::db::init_db;
use hrm_functions::services::export::{export_all, write_export};
use hrm_functions::store::MySqlDocumentStore;
use hrm_functions::telemetry;

#[actix_web::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    telemetry::init_stdout(config.log_level);

    let url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set to export data")?;
    let store = MySqlDocumentStore::new(init_db(url).await?);

    let tree = export_all(&store).await.context("Failed to read documents")?;
    write_export(&tree, Path::new(&config.export_file))?;

    info!("Export complete: {}", config.export_file);
    Ok(())
}

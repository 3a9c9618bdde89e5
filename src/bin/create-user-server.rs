//! Standalone server exposing only identity creation.

use std::env;
use std::sync::Arc;

use actix_web::{App, HttpServer, web};
use anyhow::{Context, Result};
use tracing::info;

use hrm_functions::config::Config;
use hrm_functions::db::init_db;
use hrm_functions::identity::{IdentityProvider, MemoryIdentityProvider, SqlIdentityProvider};
use hrm_functions::routes;
use hrm_functions::telemetry;

#[actix_web::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    telemetry::init_stdout(config.log_level);

    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .context("PORT is not valid")?;

    let identity: Arc<dyn IdentityProvider> = match &config.database_url {
        Some(url) => Arc::new(SqlIdentityProvider::new(init_db(url).await?)),
        None => Arc::new(MemoryIdentityProvider::new()),
    };
    let identity = web::Data::from(identity);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(identity.clone())
            .configure(routes::configure_identity)
    })
    .bind(("0.0.0.0", port))?;

    info!("Server running at http://localhost:{port}");
    server.run().await?;
    Ok(())
}

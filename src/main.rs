use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Result;
use tracing::{info, warn};
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use hrm_functions::config::Config;
use hrm_functions::db::init_db;
use hrm_functions::docs::ApiDoc;
use hrm_functions::identity::{IdentityProvider, MemoryIdentityProvider, SqlIdentityProvider};
use hrm_functions::routes;
use hrm_functions::services::{AttendanceMaterializer, UserAdmin};
use hrm_functions::store::{DocumentStore, MemoryStore, MySqlDocumentStore};
use hrm_functions::telemetry;

#[get("/")]
async fn index() -> impl Responder {
    "Hello World!"
}

#[actix_web::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let _guard = telemetry::init_file(&config.log_dir, config.log_level);

    info!("Server starting...");

    let (store, identity): (Arc<dyn DocumentStore>, Arc<dyn IdentityProvider>) =
        match &config.database_url {
            Some(url) => {
                let pool = init_db(url).await?;
                (
                    Arc::new(MySqlDocumentStore::new(pool.clone())),
                    Arc::new(SqlIdentityProvider::new(pool)),
                )
            }
            None => {
                warn!("DATABASE_URL not set, using in-memory backends; data is lost on exit");
                (
                    Arc::new(MemoryStore::new()),
                    Arc::new(MemoryIdentityProvider::new()),
                )
            }
        };

    let user_admin = Data::new(UserAdmin::new(
        store.clone(),
        identity,
        config.default_password.clone(),
    ));
    let materializer = Data::new(AttendanceMaterializer::new(
        store,
        config.attendance_clock()?,
    ));

    let server_addr = config.server_addr.clone();
    info!(addr = %server_addr, prefix = %config.api_prefix, "Listening");

    HttpServer::new(move || {
        App::new()
            .wrap(routes::cors(&config))
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(user_admin.clone())
            .app_data(materializer.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}

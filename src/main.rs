use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod store;

use auth::guard::GuardedStore;
use config::Config;
use model::directory::Directory;
use store::AttendanceStore;

use crate::docs::ApiDoc;
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Office Attendance"
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let directory = Data::new(Directory::load(config.directory_file.as_deref())?);
    info!(
        offices = directory.rosters.len(),
        accounts = directory.credentials.len(),
        "Directory loaded"
    );

    let attendance = AttendanceStore::load(&config.data_file);
    // fail at startup rather than on the first save if the location is not writable
    if attendance
        .ensure_persisted()
        .with_context(|| format!("creating {}", attendance.path().display()))?
    {
        info!(path = %attendance.path().display(), "Created empty attendance document");
    }
    let store = Data::new(GuardedStore::new(attendance));
    let limiter = routes::build_limiter(config.rate_protected_per_min)?;

    let server_addr = config.server_addr.clone();
    let config_data = Data::new(config.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(config_data.clone())
            .app_data(directory.clone())
            .app_data(store.clone())
            .service(index)
            .configure(|cfg| routes::configure(cfg, &config.api_prefix, &limiter))
    })
    .bind(&server_addr)
    .with_context(|| format!("binding {server_addr}"))?
    .run()
    .await?;

    Ok(())
}

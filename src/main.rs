use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer, Responder, get};
use anyhow::Context;
use dotenvy::dotenv;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod oracle;
mod photo;
mod routes;
mod session;
mod store;

use config::Config;
use db::init_db;

use crate::docs::ApiDoc;
use crate::oracle::http::HttpOracle;
use crate::session::state::SessionHandle;
use crate::store::{kv::SqliteStore, seed::seed_demo_data};
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/")]
async fn index() -> impl Responder {
    "Guardian attendance is running"
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

    let pool = init_db(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    let store = SqliteStore::new(pool);

    if config.seed_demo_data {
        if let Err(e) = seed_demo_data(&store).await {
            warn!(error = %e, "Failed to seed demo data");
        }
    }

    let oracle = HttpOracle::new(config.oracle_url.clone(), config.oracle_api_key.clone());
    // one session per process, shared by every worker
    let session = SessionHandle::default();

    let server_addr = config.server_addr.clone();
    info!(%server_addr, probability = config.verification_probability, "Listening");

    HttpServer::new(move || {
        let config_data = config.clone();
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(store.clone()))
            .app_data(Data::new(oracle.clone()))
            .app_data(Data::new(session.clone()))
            .app_data(Data::new(config.clone()))
            .service(index)
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config_data))
    })
    .bind(&server_addr)?
    .run()
    .await?;

    Ok(())
}

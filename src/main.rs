use std::sync::Arc;

use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use anyhow::{Context, Result};
use tracing::info;
use tracing_appender::rolling;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use geo_attend::api::AppState;
use geo_attend::config::Config;
use geo_attend::docs::ApiDoc;
use geo_attend::report::Reports;
use geo_attend::routes::{self, Limiters};
use geo_attend::store::{JsonBindingStore, JsonLinesRecordStore};
use geo_attend::{AttendanceVerifier, CodeEngine, DeviceRegistry, SystemClock};

#[actix_web::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "attendance.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .init();

    info!("Server starting...");

    let geofence = config.load_geofence()?;
    let keys = config.load_registration_keys()?;
    info!(
        zones = geofence.zones().len(),
        employees = keys.len(),
        radius_meters = geofence.radius_meters(),
        policy = %config.device_policy,
        "Configuration loaded"
    );

    let bindings = JsonBindingStore::open(&config.bindings_file)
        .with_context(|| format!("failed to open {}", config.bindings_file.display()))?;
    let records = Arc::new(
        JsonLinesRecordStore::open(&config.records_file)
            .with_context(|| format!("failed to open {}", config.records_file.display()))?,
    );

    let verifier = AttendanceVerifier::new(
        geofence,
        CodeEngine::new(config.code_secret.clone(), config.code_policy),
        DeviceRegistry::new(Arc::new(bindings), Arc::new(keys), config.device_policy),
        records.clone(),
        Arc::new(SystemClock),
    );
    let state = Data::new(AppState::new(verifier, Reports::new(records)));

    let limiters = Limiters::from_config(&config).context("invalid rate limit configuration")?;
    let api_prefix = config.api_prefix.clone();
    let server_addr = config.server_addr.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(state.clone())
            .configure(|cfg| routes::configure(cfg, &api_prefix, &limiters))
    })
    .bind(&server_addr)
    .with_context(|| format!("failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}

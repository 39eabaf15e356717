// src/main.rs
use actix_web::{
    middleware::{Compress, DefaultHeaders, Logger},
    web, App, HttpServer,
};
use actix_web::http::header;
use actix_cors::Cors;
use anyhow::Context;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use strum::IntoEnumIterator;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Module declarations
mod config;
mod db;
mod error;
mod handlers;
mod kit_handlers;
mod models;
mod monitoring;
mod patient_handlers;
pub mod query_builders;
mod report_handlers;
pub mod reports;
pub mod repositories;
mod result_handlers;
pub mod validator;

use config::{load_config, Config};
use error::ApiError;
use models::ResultKind;
use monitoring::{Metrics, RequestLogger};
use reports::render::{build_renderer, ReportRenderer};
use reports::LicenseRegistry;

pub struct AppState {
    pub db_pool: SqlitePool,
    pub config: Config,
    pub renderer: Arc<dyn ReportRenderer>,
    pub licenses: Arc<LicenseRegistry>,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (this calls load_env_file internally)
    let config = load_config()?;

    setup_logging(&config)?;
    config.print_startup_info();

    let pool = create_database_pool(&config.database).await?;
    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let licenses = LicenseRegistry::load(config.reports.licenses_file.as_deref().map(Path::new))
        .context("Failed to load technologist licenses")?;
    tracing::info!("Loaded {} technologist licenses", licenses.len());

    let renderer = build_renderer(&config.reports)?;

    let app_state = Arc::new(AppState {
        db_pool: pool.clone(),
        config: config.clone(),
        renderer,
        licenses: Arc::new(licenses),
    });

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting server at http://{}", bind_address);

    let metrics_arc = Arc::new(Metrics::new());
    let server_config = config.server.clone();

    let mut server = HttpServer::new(move || {
        let cors = setup_cors(&config.security.allowed_origins);
        let security_headers = setup_security_headers(&config.security);

        App::new()
            .wrap(cors)
            .wrap(security_headers)
            .wrap(Logger::default())
            .wrap(Compress::default())
            .wrap(RequestLogger::new(metrics_arc.clone()))
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::Data::new(metrics_arc.clone()))
            .app_data(json_config(config.security.max_request_size))
            .configure(configure_routes)
    })
        .keep_alive(Duration::from_secs(server_config.keep_alive))
        .client_request_timeout(Duration::from_secs(server_config.client_timeout))
        .client_disconnect_timeout(Duration::from_secs(server_config.client_shutdown));

    if let Some(workers) = server_config.workers {
        server = server.workers(workers);
    }

    server
        .bind(&bind_address)
        .with_context(|| format!("Failed to bind {}", bind_address))?
        .run()
        .await
        .context("Server failed to run")?;

    Ok(())
}

// ==================== ROUTES ====================

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(monitoring::health_check))
            .route("/ready", web::get().to(monitoring::readiness_check))
            .route("/metrics", web::get().to(monitoring::metrics_endpoint)),
    );

    let mut api = web::scope("/api/v1")
        .service(
            web::scope("/patients")
                .route("", web::get().to(patient_handlers::get_patients))
                .route("", web::post().to(patient_handlers::create_patient))
                .route("/{id}", web::get().to(patient_handlers::get_patient))
                .route("/{id}", web::put().to(patient_handlers::update_patient))
                .route("/{id}", web::delete().to(patient_handlers::delete_patient)),
        )
        .service(
            web::scope("/kits")
                .route("", web::get().to(kit_handlers::get_kits))
                .route("", web::post().to(kit_handlers::create_kit))
                .route("/{id}", web::get().to(kit_handlers::get_kit))
                .route("/{id}", web::put().to(kit_handlers::update_kit))
                .route("/{id}", web::delete().to(kit_handlers::delete_kit)),
        );

    for kind in ResultKind::iter() {
        api = api.service(result_scope(kind));
    }

    cfg.service(api);
}

/// One scope per result category; the handlers read the category from app data.
fn result_scope(kind: ResultKind) -> actix_web::Scope {
    let mut scope = web::scope(&format!("/{}", kind)).app_data(web::Data::new(kind));

    if kind == ResultKind::Serology {
        scope = scope.route("/import", web::post().to(result_handlers::import_serology));
    }

    scope
        .route("", web::get().to(result_handlers::list_results))
        .route("", web::post().to(result_handlers::create_result))
        .route("/patient/{patient_id}", web::get().to(result_handlers::list_patient_results))
        .route("/{id}", web::get().to(result_handlers::get_result))
        .route("/{id}", web::put().to(result_handlers::update_result))
        .route("/{id}", web::delete().to(result_handlers::delete_result))
        .route("/{id}/{report}", web::get().to(report_handlers::get_report))
}

// ==================== HELPER FUNCTIONS ====================

/// Malformed JSON bodies get the regular error envelope.
fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| {
            log::warn!("Rejected request body: {}", err);
            ApiError::BadRequest(err.to_string()).into()
        })
}

pub fn setup_cors(allowed_origins: &[String]) -> Cors {
    let mut cors = Cors::default()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::USER_AGENT,
            header::REFERER,
        ])
        .expose_headers(vec![header::CONTENT_LENGTH, header::CONTENT_DISPOSITION])
        .max_age(3600);

    if allowed_origins.iter().any(|o| o == "*") {
        log::warn!("Using wildcard CORS (*)");
        cors = cors.allow_any_origin().allow_any_header().allow_any_method();
    } else {
        for origin in allowed_origins.iter().filter(|o| !o.is_empty()) {
            log::debug!("Adding CORS origin: {}", origin);
            cors = cors.allowed_origin(origin);
        }
    }

    cors
}

fn setup_logging(config: &Config) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let level = config.logging.level.as_str();
            tracing_subscriber::EnvFilter::new(level)
        });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .context("Failed to initialise logging")?;

    Ok(())
}

async fn create_database_pool(db_config: &config::DatabaseConfig) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&db_config.url)
        .with_context(|| format!("Invalid database url: {}", db_config.url))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .acquire_timeout(Duration::from_secs(db_config.connect_timeout))
        .idle_timeout(Duration::from_secs(db_config.idle_timeout))
        .connect_with(options)
        .await
        .with_context(|| format!("Failed to open database {}", db_config.url))?;
    Ok(pool)
}

fn setup_security_headers(config: &config::SecurityConfig) -> DefaultHeaders {
    let mut headers = DefaultHeaders::new()
        .add(("X-Content-Type-Options", "nosniff"))
        .add(("X-Frame-Options", "DENY"))
        .add(("X-XSS-Protection", "1; mode=block"))
        .add(("Referrer-Policy", "strict-origin-when-cross-origin"));

    if config.require_https {
        headers = headers.add((
            "Strict-Transport-Security",
            "max-age=31536000; includeSubDomains; preload"
        ));
    }

    headers
}

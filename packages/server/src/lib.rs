#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the traffic log dashboard.
//!
//! Serves the REST API for reading and submitting stop records, running
//! insight queries, and static files for the frontend. The active stop
//! table is reconciled once at startup before the first request is
//! accepted.

mod handlers;

use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use switchy_database::Database;
use traffic_log_database::{db, reconcile};
use traffic_log_database_models::{SqlDialect, StopSchema};
use traffic_log_insights::InsightKind;

/// Shared application state.
pub struct AppState {
    /// Database connection.
    pub db: Arc<dyn Database>,
    /// SQL dialect of the connection.
    pub dialect: SqlDialect,
    /// Active stop-table schema.
    pub schema: StopSchema,
    /// Currently selected insight. Selecting a new one replaces this.
    pub selected: Mutex<InsightKind>,
}

/// Starts the traffic log API server.
///
/// Connects to the store from the environment, reconciles the active
/// stop table, and starts the Actix-Web HTTP server. This is a regular
/// async function — the caller is responsible for providing the async
/// runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind
/// or encounters a runtime error.
///
/// # Panics
///
/// Panics if the database connection or the startup reconciliation
/// fails.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    // The CLI installs the logger before delegating to `serve`.
    let _ = pretty_env_logger::try_init_custom_env("RUST_LOG");

    log::info!("Connecting to database...");
    let (db_conn, dialect) = db::connect_from_env()
        .await
        .expect("Failed to connect to database");
    let schema = db::schema_from_env();

    log::info!("Reconciling {} schema...", schema.table());
    reconcile::reconcile(db_conn.as_ref(), dialect, schema)
        .await
        .expect("Failed to reconcile schema");

    let state = web::Data::new(AppState {
        db: Arc::from(db_conn),
        dialect,
        schema,
        selected: Mutex::new(InsightKind::default()),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/stops", web::get().to(handlers::stops))
                    .route("/stops", web::post().to(handlers::submit_stop))
                    .route("/filters", web::get().to(handlers::filters))
                    .route("/insights", web::get().to(handlers::insights))
                    .route(
                        "/insights/selected",
                        web::get().to(handlers::selected_insight),
                    )
                    .route(
                        "/insights/selected",
                        web::put().to(handlers::select_insight),
                    ),
            )
            // Serve frontend static files (production)
            .service(Files::new("/", "app/dist").index_file("index.html"))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

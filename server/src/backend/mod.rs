//! # Backend Module
//!
//! Server side of the housing unit inventory, organized in three layers:
//!
//! ## Architecture
//!
//! - **storage**: persistence behind the `InventoryRepository` trait (SQLite
//!   in production, in-memory for tests)
//! - **domain**: business rules: the estado lifecycle, import validation,
//!   filtering, exports and read models
//! - **io**: REST endpoints that translate HTTP into domain calls
//!
//! ## Responsibilities
//!
//! - Wire the repository, notifier and services into an [`AppState`]
//! - Set up the REST API router with CORS for the web frontend

pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use log::info;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::backend::domain::notification_service::{HttpNotifier, NoopNotifier, Notifier};
use crate::backend::domain::{
    DashboardService, ExportService, HistoryService, HousingUnitService, ImportService,
    NotificationDispatcher, NotificationLog, PersonService, StateChangeService,
};
use crate::backend::io::rest::{
    dashboard_apis, history_apis, housing_unit_apis, import_apis, notification_apis,
    person_apis, state_change_apis,
};
use crate::backend::storage::{DbConnection, SharedRepository, SqliteRepository};
use crate::config::Config;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub housing_unit_service: HousingUnitService,
    pub state_change_service: StateChangeService,
    pub history_service: HistoryService,
    pub import_service: ImportService,
    pub export_service: ExportService,
    pub dashboard_service: DashboardService,
    pub person_service: PersonService,
    pub notification_log: NotificationLog,
}

/// Build every service on top of one repository and notifier
pub fn build_state(repository: SharedRepository, notifier: Arc<dyn Notifier>) -> AppState {
    let notification_log = NotificationLog::new();
    let dispatcher = NotificationDispatcher::new(notifier, repository.clone(), notification_log.clone());
    let history_service = HistoryService::new(repository.clone());

    AppState {
        housing_unit_service: HousingUnitService::new(repository.clone()),
        state_change_service: StateChangeService::new(repository.clone(), dispatcher),
        dashboard_service: DashboardService::new(repository.clone(), history_service.clone()),
        history_service,
        import_service: ImportService::new(repository.clone()),
        export_service: ExportService::new(repository.clone()),
        person_service: PersonService::new(repository),
        notification_log,
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Setting up database at {}", config.database_url);
    let db_conn = DbConnection::new(&config.database_url).await?;
    let repository: SharedRepository = Arc::new(SqliteRepository::new(db_conn));

    let notifier: Arc<dyn Notifier> = match &config.notify_url {
        Some(url) => {
            info!("Notifications go to {}", url);
            Arc::new(HttpNotifier::new(
                url.clone(),
                config.notify_token.clone(),
                config.notify_timeout,
            )?)
        }
        None => {
            info!("No NOTIFY_URL set, notifications disabled");
            Arc::new(NoopNotifier)
        }
    };

    info!("Setting up application state");
    Ok(build_state(repository, notifier))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;

    // CORS setup to allow frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .nest(
            "/housing-units",
            housing_unit_apis::router().merge(state_change_apis::router()),
        )
        .nest("/history", history_apis::router())
        .nest("/import", import_apis::router())
        .nest("/persons", person_apis::router())
        .nest("/notifications", notification_apis::router())
        .merge(dashboard_apis::router());

    Ok(Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state))
}

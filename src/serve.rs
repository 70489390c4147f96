use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::admin::{
    dashboard_stats_handler, delete_submission_handler, get_submission_handler,
    list_submissions_handler,
};
use crate::config::Config;
use crate::credentials::load_credentials;
use crate::db::{DynError, Store};
use crate::prices::{get_prices_handler, initialize_prices_handler, update_prices_handler};
use crate::submit::submit_listing_handler;
use crate::uploads::{content_type_for, UploadStore};

const INDEX_HTML: &str = include_str!("../web/index.html");
const ADMIN_HTML: &str = include_str!("../web/admin.html");

/// Shared state handed to every handler
pub struct AppState {
    pub store: Store,
    pub uploads: UploadStore,
}

impl AppState {
    pub fn new(store: Store, uploads: UploadStore) -> Self {
        Self { store, uploads }
    }
}

/// Build the router with every route of the marketplace
pub fn app(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/admin", get(admin_page_handler))
        .route("/submit_listing", post(submit_listing_handler))
        .route("/uploads/{filename}", get(uploaded_file_handler))
        .route("/admin/submissions", get(list_submissions_handler))
        .route("/admin/dashboard-stats", get(dashboard_stats_handler))
        .route(
            "/admin/submission/{id}",
            get(get_submission_handler).delete(delete_submission_handler),
        )
        .route(
            "/admin/prices",
            get(get_prices_handler).post(update_prices_handler),
        )
        .route("/admin/prices/initialize", post(initialize_prices_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(cors)
        .with_state(state)
}

/// Open the database named by the config, creating tables if needed
pub async fn open_store(config: &Config) -> Result<Store, DynError> {
    let credentials = match config.database.credential_profile {
        Some(_) => load_credentials()?,
        None => None,
    };
    let url = config.database_url(&credentials)?;
    let store = Store::connect(&url).await?;
    store.init_schema().await?;
    Ok(store)
}

/// Serve the marketplace (for serve command)
pub fn serve_market(config: Config, port_override: Option<u16>) -> Result<(), DynError> {
    let port = port_override.unwrap_or(config.port);
    let max_body_bytes = config.max_upload_bytes();

    println!("Upload folder: {}", config.upload_dir.display());
    println!("Max upload size: {} MB", config.max_upload_mb);
    println!("Listening on: http://{}:{}", config.host, port);
    println!("Endpoints:");
    println!("  GET    /  - Listing submission form");
    println!("  GET    /admin  - Admin dashboard");
    println!("  POST   /submit_listing  - Submit a listing (multipart)");
    println!("  GET    /uploads/<filename>  - Uploaded photo");
    println!("  GET    /admin/submissions?search=&material=&limit=&offset=  - Listings");
    println!("  GET    /admin/dashboard-stats  - Dashboard statistics");
    println!("  GET    /admin/submission/<id>  - Listing detail");
    println!("  DELETE /admin/submission/<id>  - Delete listing and photos");
    println!("  GET    /admin/prices  - Price list");
    println!("  POST   /admin/prices  - Update prices");
    println!("  POST   /admin/prices/initialize  - Seed default prices");
    println!("  GET    /health  - Health check");

    // Create tokio runtime and run server
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let store = open_store(&config).await?;

        let uploads = UploadStore::new(&config.upload_dir, &config.allowed_extensions);
        uploads.ensure_dir().await.map_err(|e| {
            format!(
                "Failed to create upload folder '{}': {}",
                config.upload_dir.display(),
                e
            )
        })?;

        let app_state = Arc::new(AppState::new(store, uploads));
        let router = app(app_state, max_body_bytes);

        let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.host, port))
            .await
            .map_err(|e| format!("Failed to bind to port {}: {}", port, e))?;
        info!("Server started on {}:{}", config.host, port);
        axum::serve(listener, router)
            .await
            .map_err(|e| format!("Server error: {}", e))?;

        Ok::<(), DynError>(())
    })
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn admin_page_handler() -> Html<&'static str> {
    Html(ADMIN_HTML)
}

async fn uploaded_file_handler(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Response {
    let Some(path) = state.uploads.resolve(&filename) else {
        warn!("Rejected upload path: {}", filename);
        return (StatusCode::NOT_FOUND, "File not found").into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(data) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, content_type_for(&filename))],
            data,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "File not found").into_response(),
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub upload_folder: String,
    pub database: String,
}

async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let database = if state.store.ping().await {
        "connected"
    } else {
        "unreachable"
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Local::now().to_rfc3339(),
        upload_folder: state.uploads.dir().display().to_string(),
        database: database.to_string(),
    })
}

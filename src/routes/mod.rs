//! Rutas HTTP
//!
//! Todas las rutas bajo `/api` exigen un token Bearer; `/health` es pública.

pub mod maintenance_routes;
pub mod trip_routes;
pub mod vehicle_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/trips", trip_routes::create_trip_router())
        .nest("/api/vehicles", vehicle_routes::create_vehicle_router())
        .nest("/api/maintenance", maintenance_routes::create_maintenance_router())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

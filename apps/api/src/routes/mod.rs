pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::geofence::enforce_geofence;
use crate::guide::handlers as guide_handlers;
use crate::render::handlers as render_handlers;
use crate::state::AppState;

/// Uploads arrive as base64 data URLs inside JSON, so bodies run large.
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    let geofence = state.geofence.clone();

    let router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/health", get(health::health_handler))
        .route(
            "/api/generate-guide",
            post(guide_handlers::handle_generate_guide),
        )
        .route("/api/export-pdf", post(render_handlers::handle_export_pdf))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state);

    match geofence {
        Some(fence) => router.layer(middleware::from_fn_with_state(fence, enforce_geofence)),
        None => router,
    }
}

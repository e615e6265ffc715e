use std::sync::Arc;

use crate::geofence::Geofence;
use crate::guide::GuideService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub guide_service: GuideService,
    /// `None` when no GeoIP database is configured; requests then pass unchecked.
    pub geofence: Option<Arc<Geofence>>,
}

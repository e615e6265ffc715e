mod config;
mod errors;
mod geofence;
mod guide;
mod layout;
mod llm_client;
mod models;
mod render;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::geofence::{AllowList, Geofence, MaxMindLookup};
use crate::guide::GuideService;
use crate::llm_client::{GeminiClient, VisionModel};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Docent API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the vision model; without a key the service still starts and
    // guide requests fail with a configuration error.
    let model: Option<Arc<dyn VisionModel>> = match &config.gemini_api_key {
        Some(key) => {
            let client = GeminiClient::new(key.clone(), config.gemini_model.clone())?;
            info!("Gemini client initialized (model: {})", client.model());
            let model: Arc<dyn VisionModel> = Arc::new(client);
            Some(model)
        }
        None => {
            warn!("GEMINI_API_KEY is not set; guide generation is disabled");
            None
        }
    };

    // Initialize geofencing
    let geofence = match &config.geoip_db_path {
        Some(db_path) => {
            let lookup = MaxMindLookup::open(db_path)?;
            let allow_list = AllowList::new(config.allowed_states_path.clone());
            info!(
                "Geofencing enabled (database: {}, allow-list: {})",
                db_path.display(),
                allow_list.path().display()
            );
            Some(Arc::new(Geofence::new(allow_list, Arc::new(lookup))))
        }
        None => {
            info!("GEOIP_DB_PATH is not set; geofencing is disabled");
            None
        }
    };

    let guide_service = GuideService::new(model);
    info!(
        "Guide service ready (provider configured: {})",
        guide_service.is_configured()
    );

    let state = AppState {
        guide_service,
        geofence,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

//! Ridgeline - aggregation service for mountain-area geospatial and
//! weather data.
//!
//! # API Endpoints
//!
//! - `GET /api/v1/stations` - cellular base stations by park
//! - `GET /api/v1/weather` - mountain weather observations
//! - `GET /api/v1/hazards` - hazard points of interest
//! - `GET /api/v1/geocode` - forward geocoding
//! - `GET /api/v1/geocode/reverse` - reverse geocoding
//! - `GET /api/v1/probe` - one-page connectivity probe of all sources
//! - `POST /api/v1/snapshot` - collect and persist all three datasets
//! - `GET /api/v1/mock/*` - deterministic mock data
//! - `GET /health` - health check

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use ridgeline::api::{AppState, router};
use ridgeline::config::Settings;
use ridgeline::geocoding::SgisClient;
use ridgeline::sources::{BaseStationClient, HazardPoiClient, MountainWeatherClient};
use ridgeline::transport::Transport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("ridgeline=info".parse()?))
        .init();

    // Load configuration from environment
    let settings = Settings::from_env();
    info!(
        port = settings.port,
        export_dir = %settings.export_dir,
        "Starting Ridgeline server"
    );

    // One transport, shared by every client
    let transport = Transport::new()?;
    let state = AppState {
        stations: BaseStationClient::new(transport.clone(), &settings.base_station_api_key),
        weather: MountainWeatherClient::new(transport.clone(), &settings.public_data_api_key),
        hazards: HazardPoiClient::new(transport.clone(), &settings.public_data_api_key),
        geocoder: SgisClient::new(
            transport,
            &settings.sgis_consumer_key,
            &settings.sgis_consumer_secret,
        ),
        export_dir: PathBuf::from(&settings.export_dir),
    };

    let app = router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
    let listener = TcpListener::bind(addr).await?;

    info!(%addr, "Ridgeline is listening");

    axum::serve(listener, app).await?;

    Ok(())
}

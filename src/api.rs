//! HTTP API handlers.
//!
//! Thin dispatch over the source clients: handlers translate query
//! parameters into client filters, decode raw records into the typed
//! schemas, and wrap everything in the uniform response envelope. Failures
//! are logged with structured fields and mapped to a 500; geocoding
//! endpoints never fail because the client folds errors into the result.

use std::path::PathBuf;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument, warn};

use crate::export;
use crate::geocoding::{GeocodeResult, ReverseGeocodeResult, SgisClient};
use crate::mock::{DEFAULT_SEED, MockDataGenerator};
use crate::model::{
    ApiResponse, BaseStation, GeocodeQuery, HazardPoi, MockQuery, MountainWeather, ParkClass,
    ReverseGeocodeQuery, SnapshotRequest, SnapshotSummary, StationsQuery, WeatherQuery,
    decode_records,
};
use crate::sources::{
    BaseStationClient, FetchOptions, HazardPoiClient, MountainWeatherClient, Record,
    StationFilter, WeatherFilter,
};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub stations: BaseStationClient,
    pub weather: MountainWeatherClient,
    pub hazards: HazardPoiClient,
    pub geocoder: SgisClient,
    pub export_dir: PathBuf,
}

/// Build the full router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/v1/stations", get(get_stations))
        .route("/api/v1/stations/:park_name", get(get_stations_by_park))
        .route("/api/v1/weather", get(get_weather))
        .route("/api/v1/weather/area/:area_code", get(get_weather_by_area))
        .route("/api/v1/hazards", get(get_hazards))
        .route("/api/v1/geocode", get(geocode_address))
        .route("/api/v1/geocode/reverse", get(reverse_geocode))
        .route("/api/v1/probe", get(probe_sources))
        .route("/api/v1/snapshot", post(create_snapshot))
        .route("/api/v1/snapshot/:park_name", get(create_snapshot_for_park))
        .route("/api/v1/mock/stations/:park_name", get(get_mock_stations))
        .route("/api/v1/mock/weather", get(get_mock_weather))
        .route("/api/v1/mock/hazards", get(get_mock_hazards))
        .route("/api/v1/mock/snapshot", post(create_mock_snapshot))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - service readiness.
pub async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok(
        "ridgeline is running",
        json!({"version": env!("CARGO_PKG_VERSION")}),
        0,
    ))
}

// ============================================================================
// Source endpoints
// ============================================================================

/// GET /api/v1/stations - query the base-station registry.
#[instrument(skip(state))]
pub async fn get_stations(
    State(state): State<AppState>,
    Query(query): Query<StationsQuery>,
) -> Result<Json<ApiResponse<Vec<BaseStation>>>, StatusCode> {
    let filter = StationFilter {
        park_name: query.park_name.clone(),
        park_class: ParkClass::from_code(query.park_type).unwrap_or(ParkClass::National),
        carrier: query.carrier.clone(),
        service: query.service.clone(),
    };

    let records = state
        .stations
        .fetch(&filter, FetchOptions::with_max_pages(3))
        .await;
    stations_response(records)
}

/// GET /api/v1/stations/:park_name - every station in one park.
#[instrument(skip(state))]
pub async fn get_stations_by_park(
    State(state): State<AppState>,
    Path(park_name): Path<String>,
) -> Result<Json<ApiResponse<Vec<BaseStation>>>, StatusCode> {
    let records = state.stations.stations_in_park(&park_name).await;
    stations_response(records)
}

fn stations_response(
    records: Vec<Record>,
) -> Result<Json<ApiResponse<Vec<BaseStation>>>, StatusCode> {
    let stations: Vec<BaseStation> = decode_records(records).map_err(|e| {
        warn!(error = %e, "base-station records did not match schema");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let count = stations.len();
    info!(count, "stations queried");
    Ok(Json(ApiResponse::ok(
        format!("{count} base stations fetched"),
        stations,
        count,
    )))
}

/// GET /api/v1/weather - query mountain weather observations.
#[instrument(skip(state))]
pub async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<ApiResponse<Vec<MountainWeather>>>, StatusCode> {
    let filter = WeatherFilter {
        local_area: query.local_area.clone(),
        obs_id: query.obs_id.clone(),
        obs_time: query.obs_time.clone(),
    };

    let records = state.weather.fetch(&filter, FetchOptions::default()).await;
    weather_response(records)
}

/// GET /api/v1/weather/area/:area_code - observations for one area.
#[instrument(skip(state))]
pub async fn get_weather_by_area(
    State(state): State<AppState>,
    Path(area_code): Path<String>,
) -> Result<Json<ApiResponse<Vec<MountainWeather>>>, StatusCode> {
    let records = state.weather.weather_for_area(&area_code).await;
    weather_response(records)
}

fn weather_response(
    records: Vec<Record>,
) -> Result<Json<ApiResponse<Vec<MountainWeather>>>, StatusCode> {
    let observations: Vec<MountainWeather> = decode_records(records).map_err(|e| {
        warn!(error = %e, "weather records did not match schema");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let count = observations.len();
    info!(count, "weather queried");
    Ok(Json(ApiResponse::ok(
        format!("{count} weather observations fetched"),
        observations,
        count,
    )))
}

/// GET /api/v1/hazards - query the hazard POI registry.
#[instrument(skip(state))]
pub async fn get_hazards(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<HazardPoi>>>, StatusCode> {
    let records = state.hazards.fetch(FetchOptions::default()).await;

    let hazards: Vec<HazardPoi> = decode_records(records).map_err(|e| {
        warn!(error = %e, "hazard records did not match schema");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let count = hazards.len();
    info!(count, "hazards queried");
    Ok(Json(ApiResponse::ok(
        format!("{count} hazard POIs fetched"),
        hazards,
        count,
    )))
}

// ============================================================================
// Geocoding endpoints
// ============================================================================

/// GET /api/v1/geocode - forward geocode a single address.
///
/// Always answers 200; a failed lookup carries `success: false` and an
/// error message.
#[instrument(skip(state))]
pub async fn geocode_address(
    State(state): State<AppState>,
    Query(query): Query<GeocodeQuery>,
) -> Json<GeocodeResult> {
    let result = state.geocoder.geocode(&query.address).await;
    info!(
        address = %query.address,
        success = result.success,
        "address geocoded"
    );
    Json(result)
}

/// GET /api/v1/geocode/reverse - resolve coordinates to an address.
#[instrument(skip(state))]
pub async fn reverse_geocode(
    State(state): State<AppState>,
    Query(query): Query<ReverseGeocodeQuery>,
) -> Json<ReverseGeocodeResult> {
    let result = state
        .geocoder
        .reverse_geocode(query.x, query.y, query.addr_type)
        .await;
    info!(
        x = query.x,
        y = query.y,
        success = result.success,
        "coordinates reverse geocoded"
    );
    Json(result)
}

// ============================================================================
// Probe and snapshot endpoints
// ============================================================================

/// GET /api/v1/probe - one-page connectivity probe of all three sources.
#[instrument(skip(state))]
pub async fn probe_sources(State(state): State<AppState>) -> Json<ApiResponse<Value>> {
    let mut results = serde_json::Map::new();
    let mut all_ok = true;

    let outcomes = [
        ("base_station", state.stations.probe().await),
        ("mountain_weather", state.weather.probe().await),
        ("hazard_poi", state.hazards.probe().await),
    ];

    for (source, outcome) in outcomes {
        let entry = match outcome {
            Ok(records) => json!({"status": "ok", "records": records}),
            Err(e) => {
                all_ok = false;
                json!({"status": "error", "message": e.to_string()})
            }
        };
        results.insert(source.to_string(), entry);
    }

    let message = if all_ok {
        "all sources reachable"
    } else {
        "some sources unreachable"
    };
    info!(all_ok, "sources probed");
    Json(ApiResponse::new(all_ok, message, Value::Object(results), 0))
}

/// POST /api/v1/snapshot - collect from all three sources and optionally
/// persist the result to files.
#[instrument(skip(state))]
pub async fn create_snapshot(
    State(state): State<AppState>,
    Json(request): Json<SnapshotRequest>,
) -> Result<Json<ApiResponse<SnapshotSummary>>, StatusCode> {
    let summary = collect_snapshot(&state, &request).await?;
    Ok(Json(ApiResponse::ok(
        "snapshot collected",
        summary,
        0,
    )))
}

/// GET /api/v1/snapshot/:park_name - snapshot with default options.
#[instrument(skip(state))]
pub async fn create_snapshot_for_park(
    State(state): State<AppState>,
    Path(park_name): Path<String>,
) -> Result<Json<ApiResponse<SnapshotSummary>>, StatusCode> {
    let request = SnapshotRequest {
        park_name,
        save_to_file: true,
    };
    let summary = collect_snapshot(&state, &request).await?;
    Ok(Json(ApiResponse::ok(
        "snapshot collected",
        summary,
        0,
    )))
}

async fn collect_snapshot(
    state: &AppState,
    request: &SnapshotRequest,
) -> Result<SnapshotSummary, StatusCode> {
    let options = FetchOptions::with_max_pages(2);

    let filter = StationFilter {
        park_name: request.park_name.clone(),
        ..StationFilter::default()
    };
    let stations = state.stations.fetch(&filter, options).await;
    let weather = state
        .weather
        .fetch(&WeatherFilter::default(), options)
        .await;
    let hazards = state.hazards.fetch(options).await;

    let file_paths = if request.save_to_file {
        match export::write_snapshot(
            &state.export_dir,
            &request.park_name,
            &stations,
            &weather,
            &hazards,
        ) {
            Ok(paths) => paths.iter().map(|p| p.display().to_string()).collect(),
            Err(e) => {
                warn!(error = %e, "snapshot export failed");
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    } else {
        Vec::new()
    };

    info!(
        park = %request.park_name,
        stations = stations.len(),
        weather = weather.len(),
        hazards = hazards.len(),
        files = file_paths.len(),
        "snapshot collected"
    );

    Ok(summarize(
        &request.park_name,
        &stations,
        &weather,
        &hazards,
        file_paths,
    ))
}

fn summarize(
    park_name: &str,
    stations: &[Record],
    weather: &[Record],
    hazards: &[Record],
    file_paths: Vec<String>,
) -> SnapshotSummary {
    SnapshotSummary {
        park_name: park_name.to_string(),
        station_count: stations.len(),
        weather_count: weather.len(),
        hazard_count: hazards.len(),
        file_paths,
        samples: json!({
            "stations": sample(stations),
            "weather": sample(weather),
            "hazards": sample(hazards),
        }),
    }
}

fn sample(records: &[Record]) -> Vec<Record> {
    records.iter().take(3).cloned().collect()
}

// ============================================================================
// Mock endpoints
// ============================================================================

/// GET /api/v1/mock/stations/:park_name - deterministic mock stations.
#[instrument]
pub async fn get_mock_stations(
    Path(park_name): Path<String>,
    Query(query): Query<MockQuery>,
) -> Result<Json<ApiResponse<Vec<BaseStation>>>, StatusCode> {
    let records =
        MockDataGenerator::new(DEFAULT_SEED).base_stations(&park_name, query.count.unwrap_or(50));
    stations_response(records)
}

/// GET /api/v1/mock/weather - deterministic mock observations.
#[instrument]
pub async fn get_mock_weather(
    Query(query): Query<MockQuery>,
) -> Result<Json<ApiResponse<Vec<MountainWeather>>>, StatusCode> {
    let records = MockDataGenerator::new(DEFAULT_SEED)
        .mountain_weather(query.count.unwrap_or(30), query.local_area.as_deref());
    weather_response(records)
}

/// GET /api/v1/mock/hazards - deterministic mock hazard POIs.
#[instrument]
pub async fn get_mock_hazards(
    Query(query): Query<MockQuery>,
) -> Result<Json<ApiResponse<Vec<HazardPoi>>>, StatusCode> {
    let records = MockDataGenerator::new(DEFAULT_SEED).hazard_pois(query.count.unwrap_or(40));

    let hazards: Vec<HazardPoi> = decode_records(records).map_err(|e| {
        warn!(error = %e, "mock hazard records did not match schema");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let count = hazards.len();
    Ok(Json(ApiResponse::ok(
        format!("{count} mock hazard POIs generated"),
        hazards,
        count,
    )))
}

/// POST /api/v1/mock/snapshot - generate a full mock snapshot, optionally
/// persisting it the same way the live snapshot does.
#[instrument(skip(state))]
pub async fn create_mock_snapshot(
    State(state): State<AppState>,
    Json(request): Json<SnapshotRequest>,
) -> Result<Json<ApiResponse<SnapshotSummary>>, StatusCode> {
    let mut generator = MockDataGenerator::new(DEFAULT_SEED);
    let stations = generator.base_stations(&request.park_name, 50);
    let weather = generator.mountain_weather(30, None);
    let hazards = generator.hazard_pois(40);

    let file_paths = if request.save_to_file {
        let written = export::write_dataset(
            &state.export_dir,
            &format!("mock_stations_{}", request.park_name),
            &stations,
        )
        .and_then(|mut paths| {
            paths.extend(export::write_dataset(&state.export_dir, "mock_weather", &weather)?);
            paths.extend(export::write_dataset(&state.export_dir, "mock_hazards", &hazards)?);
            Ok(paths)
        });
        match written {
            Ok(paths) => paths.iter().map(|p| p.display().to_string()).collect(),
            Err(e) => {
                warn!(error = %e, "mock snapshot export failed");
                return Err(StatusCode::INTERNAL_SERVER_ERROR);
            }
        }
    } else {
        Vec::new()
    };

    let summary = summarize(&request.park_name, &stations, &weather, &hazards, file_paths);
    Ok(Json(ApiResponse::ok("mock snapshot generated", summary, 0)))
}

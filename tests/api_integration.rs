//! Integration tests for the Ridgeline API endpoints.
//!
//! These verify the full request/response cycle through the HTTP API. The
//! mock endpoints need no network; the live-source tests point a client at
//! a wiremock server.

use axum_test::TestServer;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ridgeline::api::{AppState, router};
use ridgeline::geocoding::SgisClient;
use ridgeline::sources::{BaseStationClient, HazardPoiClient, MountainWeatherClient};
use ridgeline::transport::{RetryPolicy, Transport};

/// A port nothing listens on, so live-source calls fail fast.
const DEAD_END: &str = "http://127.0.0.1:9";

fn test_state(export_dir: &TempDir) -> AppState {
    test_state_with_station_url(export_dir, DEAD_END)
}

fn test_state_with_station_url(export_dir: &TempDir, station_url: &str) -> AppState {
    let transport = Transport::with_policy(RetryPolicy::immediate()).unwrap();
    AppState {
        stations: BaseStationClient::with_base_url(transport.clone(), station_url, "key"),
        weather: MountainWeatherClient::with_base_url(transport.clone(), DEAD_END, "key"),
        hazards: HazardPoiClient::with_base_url(transport.clone(), DEAD_END, "key"),
        geocoder: SgisClient::with_base_url(transport, DEAD_END, "ck", "cs"),
        export_dir: export_dir.path().to_path_buf(),
    }
}

fn create_test_server(state: AppState) -> TestServer {
    TestServer::new(router(state)).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(test_state(&dir));

    let response = server.get("/health").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert!(body["data"]["version"].is_string());
}

#[tokio::test]
async fn test_mock_stations_respect_count_and_park() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(test_state(&dir));

    let response = server.get("/api/v1/mock/stations/Seoraksan?count=5").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 5);

    let stations = body["data"].as_array().unwrap();
    assert_eq!(stations.len(), 5);
    for station in stations {
        assert_eq!(station["park_name"], "Seoraksan");
        assert!(station["lat"].is_f64());
        assert!(station["carrier"].is_string());
    }
}

#[tokio::test]
async fn test_mock_stations_are_deterministic() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(test_state(&dir));

    let first: Value = server.get("/api/v1/mock/stations/Jirisan?count=10").await.json();
    let second: Value = server.get("/api/v1/mock/stations/Jirisan?count=10").await.json();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_mock_weather_area_filter() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(test_state(&dir));

    let response = server.get("/api/v1/mock/weather?count=12&local_area=06").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 12);
    for observation in body["data"].as_array().unwrap() {
        assert_eq!(observation["local_area"], "06");
    }
}

#[tokio::test]
async fn test_mock_hazards_default_count() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(test_state(&dir));

    let response = server.get("/api/v1/mock/hazards").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 40);

    let hazards = body["data"].as_array().unwrap();
    assert_eq!(hazards.len(), 40);
    assert!(hazards[0]["danger_id"].is_string());
    assert!(hazards[0]["severity"].is_string());
}

#[tokio::test]
async fn test_mock_snapshot_writes_files() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(test_state(&dir));

    let response = server
        .post("/api/v1/mock/snapshot")
        .json(&json!({"park_name": "Jirisan"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);

    let summary = &body["data"];
    assert_eq!(summary["station_count"], 50);
    assert_eq!(summary["weather_count"], 30);
    assert_eq!(summary["hazard_count"], 40);

    // Three datasets, each as JSON plus CSV.
    let paths = summary["file_paths"].as_array().unwrap();
    assert_eq!(paths.len(), 6);
    for file_path in paths {
        assert!(std::path::Path::new(file_path.as_str().unwrap()).exists());
    }
}

#[tokio::test]
async fn test_mock_snapshot_without_persistence() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(test_state(&dir));

    let response = server
        .post("/api/v1/mock/snapshot")
        .json(&json!({"park_name": "Hallasan", "save_to_file": false}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert!(body["data"]["file_paths"].as_array().unwrap().is_empty());

    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn test_stations_endpoint_decodes_provider_records() {
    let upstream = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("pIndex", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"LAT": 35.3373, "LON": 127.7307, "CUS_CD": "KT", "PARK_NM": "Jirisan"},
                {"LAT": 35.3401, "LON": 127.7355, "CUS_CD": "SK", "PARK_NM": "Jirisan"}
            ]
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("pIndex", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .expect(1)
        .mount(&upstream)
        .await;

    let dir = TempDir::new().unwrap();
    let server = create_test_server(test_state_with_station_url(&dir, &upstream.uri()));

    let response = server.get("/api/v1/stations?park_name=Jirisan").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"][0]["lat"], 35.3373);
    assert_eq!(body["data"][0]["carrier"], "KT");
    assert_eq!(body["data"][1]["carrier"], "SK");
}

#[tokio::test]
async fn test_probe_reports_unreachable_sources() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(test_state(&dir));

    let response = server.get("/api/v1/probe").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    for source in ["base_station", "mountain_weather", "hazard_poi"] {
        assert_eq!(body["data"][source]["status"], "error");
    }
}

#[tokio::test]
async fn test_geocode_endpoint_never_fails() {
    let dir = TempDir::new().unwrap();
    let server = create_test_server(test_state(&dir));

    // The geocoding provider is unreachable; the endpoint still answers 200
    // with a failed result.
    let response = server.get("/api/v1/geocode?address=Seoul").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["address"], "Seoul");
    assert!(body["error"].is_string());
}

//! Record schemas and HTTP envelope types.
//!
//! Providers return records under their own field names (upstream aliases
//! like `LAT` or `obsid`); the types here accept both the upstream alias
//! and the normalized name, and serialize with the normalized name. All
//! record fields are optional because the providers omit them freely; shape
//! is the only thing validated.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::sources::Record;

/// Uniform response envelope shared by every list endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request resolved.
    pub success: bool,

    /// Human-readable outcome summary.
    pub message: String,

    /// The payload.
    pub data: T,

    /// Number of records in the payload, where that makes sense.
    pub count: usize,
}

impl<T> ApiResponse<T> {
    /// Successful envelope.
    pub fn ok(message: impl Into<String>, data: T, count: usize) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
            count,
        }
    }

    /// Envelope with an explicit success flag.
    pub fn new(success: bool, message: impl Into<String>, data: T, count: usize) -> Self {
        Self {
            success,
            message: message.into(),
            data,
            count,
        }
    }
}

/// Park classification used by the base-station registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParkClass {
    /// National park.
    National,
    /// Provincial park.
    Provincial,
    /// County park.
    County,
}

impl ParkClass {
    /// Numeric code the registry expects.
    pub fn code(self) -> u8 {
        match self {
            ParkClass::National => 1,
            ParkClass::Provincial => 2,
            ParkClass::County => 3,
        }
    }

    /// Parse the registry's numeric code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(ParkClass::National),
            2 => Some(ParkClass::Provincial),
            3 => Some(ParkClass::County),
            _ => None,
        }
    }
}

/// A mobile base-station record from the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaseStation {
    /// Latitude.
    #[serde(alias = "LAT")]
    pub lat: Option<f64>,

    /// Longitude.
    #[serde(alias = "LON")]
    pub lon: Option<f64>,

    /// Transmit frequency in MHz.
    #[serde(alias = "FRQ")]
    pub frequency: Option<i64>,

    /// Transmit power in watts.
    #[serde(alias = "PWR")]
    pub power: Option<f64>,

    /// Antenna form (omni, directional, sector).
    #[serde(alias = "ANT_FORM")]
    pub antenna_form: Option<String>,

    /// Antenna gain in dBi.
    #[serde(alias = "ANT_GAIN")]
    pub antenna_gain: Option<f64>,

    /// Site elevation above sea level in metres.
    #[serde(alias = "SEA_ALT")]
    pub sea_altitude: Option<f64>,

    /// Antenna height above ground in metres.
    #[serde(alias = "GRD_ALT")]
    pub ground_altitude: Option<f64>,

    /// Carrier code.
    #[serde(alias = "CUS_CD")]
    pub carrier: Option<String>,

    /// Service generation.
    #[serde(alias = "SERVICE_CD")]
    pub service: Option<String>,

    /// Park the station serves.
    #[serde(alias = "PARK_NM")]
    pub park_name: Option<String>,

    /// Registry station identifier.
    #[serde(alias = "STATION_ID")]
    pub station_id: Option<String>,
}

/// A mountain weather observation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MountainWeather {
    /// Observation station id.
    #[serde(alias = "obsid")]
    pub obs_id: Option<String>,

    /// Mountain name of the station.
    #[serde(alias = "obsname")]
    pub obs_name: Option<String>,

    /// Administrative area code.
    #[serde(alias = "localarea")]
    pub local_area: Option<String>,

    /// Observation time as reported by the provider.
    #[serde(alias = "tm")]
    pub timestamp: Option<String>,

    /// Cumulative precipitation in mm.
    #[serde(alias = "cprn")]
    pub cumulative_precipitation: Option<f64>,

    /// Same-day precipitation in mm.
    #[serde(alias = "rn")]
    pub daily_precipitation: Option<f64>,

    /// Relative humidity at 10m in percent.
    #[serde(alias = "hm10m")]
    pub humidity_10m: Option<f64>,

    /// Relative humidity at 2m in percent.
    #[serde(alias = "hm2m")]
    pub humidity_2m: Option<f64>,

    /// Pressure in hPa.
    #[serde(alias = "pa")]
    pub pressure: Option<f64>,

    /// Air temperature in degrees Celsius.
    #[serde(alias = "ta")]
    pub temperature: Option<f64>,

    /// Wind speed in m/s.
    #[serde(alias = "ws")]
    pub wind_speed: Option<f64>,
}

/// A hazard point-of-interest record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HazardPoi {
    /// Registry hazard identifier.
    pub danger_id: Option<String>,

    /// Hazard category (rockfall, steep slope, ...).
    pub danger_type: Option<String>,

    /// Human-readable location.
    pub location_name: Option<String>,

    /// Latitude.
    pub lat: Option<f64>,

    /// Longitude.
    pub lon: Option<f64>,

    /// Free-text description.
    pub description: Option<String>,

    /// Mountain the POI belongs to.
    pub mountain_name: Option<String>,

    /// Elevation in metres.
    pub altitude: Option<f64>,

    /// Severity label.
    pub severity: Option<String>,

    /// Registration date, `YYYY-MM-DD`.
    pub registered_date: Option<String>,
}

/// Decode raw provider records into a typed schema.
///
/// # Errors
///
/// Fails on the first record whose shape does not match the schema.
pub fn decode_records<T: DeserializeOwned>(
    records: Vec<Record>,
) -> Result<Vec<T>, serde_json::Error> {
    records
        .into_iter()
        .map(|record| serde_json::from_value(Value::Object(record)))
        .collect()
}

/// Summary returned by the snapshot endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    /// Park the snapshot was scoped to.
    pub park_name: String,

    /// Base-station records collected.
    pub station_count: usize,

    /// Weather observations collected.
    pub weather_count: usize,

    /// Hazard POIs collected.
    pub hazard_count: usize,

    /// Files written, empty when persistence was skipped.
    pub file_paths: Vec<String>,

    /// First few records of each dataset.
    pub samples: Value,
}

// ============================================================================
// Query and request types
// ============================================================================

/// Query parameters for GET /api/v1/stations.
#[derive(Debug, Deserialize)]
pub struct StationsQuery {
    /// Park name, "ALL" for every park (default).
    #[serde(default = "default_park_name")]
    pub park_name: String,

    /// Park class code: 1 national (default), 2 provincial, 3 county.
    #[serde(default = "default_park_type")]
    pub park_type: u8,

    /// Carrier code or "ALL" (default).
    #[serde(default = "default_all")]
    pub carrier: String,

    /// Service generation or "ALL" (default).
    #[serde(default = "default_all")]
    pub service: String,
}

fn default_park_name() -> String {
    "ALL".to_string()
}

fn default_park_type() -> u8 {
    1
}

fn default_all() -> String {
    "ALL".to_string()
}

/// Query parameters for GET /api/v1/weather.
#[derive(Debug, Default, Deserialize)]
pub struct WeatherQuery {
    /// Administrative area code.
    pub local_area: Option<String>,

    /// Observation station id.
    pub obs_id: Option<String>,

    /// Observation time, `YYYYMMDDHHMM`.
    pub obs_time: Option<String>,
}

/// Query parameters for GET /api/v1/geocode.
#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    /// Address to resolve.
    pub address: String,
}

/// Query parameters for GET /api/v1/geocode/reverse.
#[derive(Debug, Deserialize)]
pub struct ReverseGeocodeQuery {
    /// Longitude (WGS84).
    pub x: f64,

    /// Latitude (WGS84).
    pub y: f64,

    /// Address type code (default 20, administrative neighborhoods).
    #[serde(default = "default_addr_type")]
    pub addr_type: u32,
}

fn default_addr_type() -> u32 {
    20
}

/// Request body for the snapshot endpoints.
#[derive(Debug, Deserialize)]
pub struct SnapshotRequest {
    /// Park to scope the base-station query to.
    #[serde(default = "default_park_name")]
    pub park_name: String,

    /// Whether to persist the snapshot to files (default true).
    #[serde(default = "default_true")]
    pub save_to_file: bool,
}

fn default_true() -> bool {
    true
}

/// Query parameters for the mock listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct MockQuery {
    /// Number of records to generate.
    pub count: Option<usize>,

    /// Area-code filter (mock weather only).
    pub local_area: Option<String>,
}

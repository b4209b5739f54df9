//! Seeded mock data generation.
//!
//! Produces records with the same keys the live providers return, so the
//! rest of the pipeline (schema decoding, snapshots, CSV export) can run
//! when the external APIs are unreachable. A generator seeded with the same
//! value always produces the same records.

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Value, json};

use crate::sources::Record;

/// Default seed used by the mock endpoints.
pub const DEFAULT_SEED: u64 = 42;

/// Mountain parks the generator places records around.
const PARKS: [(&str, f64, f64, &str); 10] = [
    ("Jirisan", 35.3373, 127.7307, "11"),
    ("Seoraksan", 38.1194, 128.4656, "06"),
    ("Bukhansan", 37.6597, 126.9778, "01"),
    ("Hallasan", 33.3617, 126.5292, "16"),
    ("Deogyusan", 35.8673, 127.7469, "11"),
    ("Odaesan", 37.7986, 128.5431, "06"),
    ("Sobaeksan", 36.9573, 128.4867, "07"),
    ("Gayasan", 35.8219, 128.1189, "10"),
    ("Naejangsan", 35.4833, 126.8917, "12"),
    ("Mudeungsan", 35.1344, 126.9886, "13"),
];

const CARRIERS: [&str; 3] = ["SK", "KT", "LG"];
const SERVICES: [&str; 3] = ["LTE", "5G", "3G"];
const ANTENNA_FORMS: [&str; 3] = ["omni", "directional", "sector"];
const FREQUENCIES_MHZ: [i64; 6] = [700, 850, 1800, 2100, 2600, 3500];
const HAZARD_TYPES: [&str; 6] = [
    "rockfall",
    "steep slope",
    "lightning",
    "footing loss",
    "high altitude",
    "valley",
];
const RIDGE_SECTIONS: [&str; 7] = [
    "north ridge",
    "south ridge",
    "east ridge",
    "west ridge",
    "summit area",
    "valley",
    "crest trail",
];
const SEVERITIES: [&str; 3] = ["high", "medium", "low"];

/// Deterministic generator for provider-shaped mock records.
pub struct MockDataGenerator {
    rng: StdRng,
}

impl MockDataGenerator {
    /// Create a generator with an explicit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Base-station records for `park_name` ("ALL" spreads them across
    /// every park; unknown names fall back to Jirisan).
    pub fn base_stations(&mut self, park_name: &str, count: usize) -> Vec<Record> {
        let parks = park_pool(park_name);
        let mut stations = Vec::with_capacity(count);

        for index in 0..count {
            let (park, lat, lon, _) = parks[self.rng.random_range(0..parks.len())];
            let lat_offset = self.rng.random_range(-0.05..0.05);
            let lon_offset = self.rng.random_range(-0.05..0.05);

            stations.push(as_record(json!({
                "LAT": round6(lat + lat_offset),
                "LON": round6(lon + lon_offset),
                "FRQ": FREQUENCIES_MHZ[self.rng.random_range(0..FREQUENCIES_MHZ.len())],
                "PWR": round1(self.rng.random_range(5.0..40.0)),
                "ANT_FORM": ANTENNA_FORMS[self.rng.random_range(0..ANTENNA_FORMS.len())],
                "ANT_GAIN": round1(self.rng.random_range(10.0..20.0)),
                "SEA_ALT": round1(self.rng.random_range(200.0..1500.0)),
                "GRD_ALT": round1(self.rng.random_range(10.0..50.0)),
                "CUS_CD": CARRIERS[self.rng.random_range(0..CARRIERS.len())],
                "SERVICE_CD": SERVICES[self.rng.random_range(0..SERVICES.len())],
                "PARK_NM": park,
                "STATION_ID": format!("BS-{}-{:04}", &park[..2], index + 1),
            })));
        }

        stations
    }

    /// Hourly weather observations, optionally restricted to one area code.
    pub fn mountain_weather(&mut self, count: usize, local_area: Option<&str>) -> Vec<Record> {
        let stations: Vec<(String, &str, &str)> = PARKS
            .iter()
            .enumerate()
            .filter(|(_, (_, _, _, area))| local_area.is_none_or(|wanted| *area == wanted))
            .map(|(index, (park, _, _, area))| (format!("OBS{index:04}"), *park, *area))
            .collect();

        if stations.is_empty() {
            return Vec::new();
        }

        let base_time = Utc::now() - Duration::hours(count as i64);
        let mut observations = Vec::with_capacity(count);

        for hour in 0..count {
            let (obs_id, park, area) = &stations[self.rng.random_range(0..stations.len())];
            let timestamp = base_time + Duration::hours(hour as i64);

            observations.push(as_record(json!({
                "obsid": obs_id,
                "obsname": park,
                "localarea": area,
                "tm": timestamp.format("%Y-%m-%d %H:%M").to_string(),
                "cprn": round1(self.rng.random_range(0.0..50.0)),
                "rn": round1(self.rng.random_range(0.0..20.0)),
                "hm10m": round1(self.rng.random_range(40.0..95.0)),
                "hm2m": round1(self.rng.random_range(45.0..98.0)),
                "pa": round1(self.rng.random_range(950.0..1030.0)),
                "ta": round1(self.rng.random_range(-10.0..30.0)),
                "ws": round1(self.rng.random_range(0.0..15.0)),
            })));
        }

        observations
    }

    /// Hazard POI records spread across every park.
    pub fn hazard_pois(&mut self, count: usize) -> Vec<Record> {
        let mut hazards = Vec::with_capacity(count);

        for index in 0..count {
            let (park, lat, lon, _) = PARKS[self.rng.random_range(0..PARKS.len())];
            let lat_offset = self.rng.random_range(-0.03..0.03);
            let lon_offset = self.rng.random_range(-0.03..0.03);
            let hazard_type = HAZARD_TYPES[self.rng.random_range(0..HAZARD_TYPES.len())];
            let section = RIDGE_SECTIONS[self.rng.random_range(0..RIDGE_SECTIONS.len())];
            let registered =
                Utc::now() - Duration::days(self.rng.random_range(0..=365));

            hazards.push(as_record(json!({
                "danger_id": format!("DNG-{:05}", index + 1),
                "danger_type": hazard_type,
                "location_name": format!("{park} {section}"),
                "lat": round6(lat + lat_offset),
                "lon": round6(lon + lon_offset),
                "mountain_name": park,
                "altitude": round1(self.rng.random_range(300.0..1800.0)),
                "severity": SEVERITIES[self.rng.random_range(0..SEVERITIES.len())],
                "description": format!("{hazard_type} caution zone"),
                "registered_date": registered.format("%Y-%m-%d").to_string(),
            })));
        }

        hazards
    }
}

fn park_pool(park_name: &str) -> Vec<(&'static str, f64, f64, &'static str)> {
    if park_name == "ALL" {
        return PARKS.to_vec();
    }
    match PARKS.iter().find(|(name, _, _, _)| *name == park_name) {
        Some(park) => vec![*park],
        // Unknown parks fall back to the default park.
        None => vec![PARKS[0]],
    }
}

fn as_record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        _ => Record::new(),
    }
}

fn round6(value: f64) -> f64 {
    (value * 1_000_000.0).round() / 1_000_000.0
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_records() {
        let a = MockDataGenerator::new(7).base_stations("Jirisan", 10);
        let b = MockDataGenerator::new(7).base_stations("Jirisan", 10);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = MockDataGenerator::new(1).base_stations("ALL", 10);
        let b = MockDataGenerator::new(2).base_stations("ALL", 10);
        assert_ne!(a, b);
    }

    #[test]
    fn test_station_records_carry_upstream_keys() {
        let stations = MockDataGenerator::new(DEFAULT_SEED).base_stations("Seoraksan", 5);

        assert_eq!(stations.len(), 5);
        for station in &stations {
            assert!(station.contains_key("LAT"));
            assert!(station.contains_key("CUS_CD"));
            assert_eq!(
                station.get("PARK_NM").and_then(Value::as_str),
                Some("Seoraksan")
            );
        }
    }

    #[test]
    fn test_unknown_park_falls_back() {
        let stations = MockDataGenerator::new(DEFAULT_SEED).base_stations("Atlantis", 3);
        for station in &stations {
            assert_eq!(
                station.get("PARK_NM").and_then(Value::as_str),
                Some("Jirisan")
            );
        }
    }

    #[test]
    fn test_weather_area_filter() {
        let observations =
            MockDataGenerator::new(DEFAULT_SEED).mountain_weather(20, Some("06"));

        assert_eq!(observations.len(), 20);
        for observation in &observations {
            assert_eq!(
                observation.get("localarea").and_then(Value::as_str),
                Some("06")
            );
        }
    }

    #[test]
    fn test_weather_unknown_area_is_empty() {
        let observations = MockDataGenerator::new(DEFAULT_SEED).mountain_weather(10, Some("99"));
        assert!(observations.is_empty());
    }

    #[test]
    fn test_hazard_ids_are_sequential() {
        let hazards = MockDataGenerator::new(DEFAULT_SEED).hazard_pois(3);

        let ids: Vec<&str> = hazards
            .iter()
            .filter_map(|h| h.get("danger_id").and_then(Value::as_str))
            .collect();
        assert_eq!(ids, ["DNG-00001", "DNG-00002", "DNG-00003"]);
    }
}

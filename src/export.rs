//! Snapshot persistence for fetched and generated datasets.
//!
//! Each dataset is written twice: a pretty-printed JSON file for fidelity
//! and a CSV rendering for spreadsheet consumers. File names carry a
//! timestamp so repeated snapshots never clobber each other.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use chrono::Utc;
use serde_json::Value;
use tracing::info;

use crate::geocoding::{MatchQuality, SgisClient};
use crate::sources::Record;

/// Write one dataset as `<name>_<stamp>.json` plus `<name>_<stamp>.csv`
/// under `dir`, creating the directory if needed.
///
/// Empty datasets write nothing. Returns the paths written.
///
/// # Errors
///
/// Fails if the directory or either file cannot be written.
pub fn write_dataset(dir: &Path, name: &str, records: &[Record]) -> anyhow::Result<Vec<PathBuf>> {
    if records.is_empty() {
        return Ok(Vec::new());
    }

    fs::create_dir_all(dir)
        .with_context(|| format!("creating export directory {}", dir.display()))?;

    let stamp = Utc::now().format("%Y%m%d_%H%M%S");

    let json_path = dir.join(format!("{name}_{stamp}.json"));
    let json_file = fs::File::create(&json_path)
        .with_context(|| format!("creating {}", json_path.display()))?;
    serde_json::to_writer_pretty(json_file, records)?;

    let csv_path = dir.join(format!("{name}_{stamp}.csv"));
    write_csv(&csv_path, records)?;

    info!(name, records = records.len(), "dataset exported");
    Ok(vec![json_path, csv_path])
}

/// Persist a full snapshot (stations, weather, hazards) and return every
/// file path written.
///
/// # Errors
///
/// Fails on the first dataset that cannot be written.
pub fn write_snapshot(
    dir: &Path,
    park_name: &str,
    stations: &[Record],
    weather: &[Record],
    hazards: &[Record],
) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths = write_dataset(dir, &format!("stations_{park_name}"), stations)?;
    paths.extend(write_dataset(dir, "weather", weather)?);
    paths.extend(write_dataset(dir, "hazards", hazards)?);
    Ok(paths)
}

/// The CSV header is the union of record keys in first-seen order, so
/// heterogeneous records still land in one table.
fn write_csv(path: &Path, records: &[Record]) -> anyhow::Result<()> {
    let mut headers: Vec<String> = Vec::new();
    for record in records {
        for key in record.keys() {
            if !headers.iter().any(|h| h == key) {
                headers.push(key.clone());
            }
        }
    }

    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    writer.write_record(&headers)?;

    for record in records {
        let row: Vec<String> = headers
            .iter()
            .map(|header| record.get(header).map(cell_text).unwrap_or_default())
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Outcome counts for a batch geocoding job.
#[derive(Debug, Clone, Copy)]
pub struct BatchStats {
    /// Addresses processed.
    pub total: usize,
    /// Addresses that resolved.
    pub succeeded: usize,
    /// Addresses that failed.
    pub failed: usize,
}

/// Geocode the `address` column of a CSV file and write a results CSV.
///
/// Duplicate addresses in the input are looked up once. Progress is logged
/// every 50 addresses.
///
/// # Errors
///
/// Fails if the input cannot be read, has no `address` column, or the
/// output cannot be written. Individual geocoding failures do not fail the
/// job; they appear as failed rows in the output.
pub async fn geocode_address_file(
    client: &SgisClient,
    input: &Path,
    output: &Path,
    delay: Duration,
) -> anyhow::Result<BatchStats> {
    let mut reader =
        csv::Reader::from_path(input).with_context(|| format!("reading {}", input.display()))?;
    let headers = reader.headers()?.clone();
    let address_column = headers
        .iter()
        .position(|h| h == "address")
        .context("input file has no 'address' column")?;

    let mut addresses: Vec<String> = Vec::new();
    for row in reader.records() {
        let row = row?;
        if let Some(address) = row.get(address_column) {
            let address = address.trim();
            if !address.is_empty() && !addresses.iter().any(|a| a == address) {
                addresses.push(address.to_string());
            }
        }
    }

    info!(addresses = addresses.len(), "starting batch geocoding");

    let progress = |done: usize, total: usize, _address: &str, _success: bool| {
        if done % 50 == 0 || done == total {
            info!(done, total, "geocoding progress");
        }
    };
    let results = client
        .batch_geocode(&addresses, delay, Some(&progress))
        .await;

    let mut writer =
        csv::Writer::from_path(output).with_context(|| format!("creating {}", output.display()))?;
    writer.write_record([
        "address",
        "lon",
        "lat",
        "sido",
        "sgg",
        "emdong",
        "full_address",
        "matching",
        "success",
        "error",
    ])?;

    for result in &results {
        writer.write_record([
            result.address.clone(),
            result.x.map(|v| v.to_string()).unwrap_or_default(),
            result.y.map(|v| v.to_string()).unwrap_or_default(),
            result.sido_name.clone().unwrap_or_default(),
            result.sgg_name.clone().unwrap_or_default(),
            result.emdong_name.clone().unwrap_or_default(),
            result.full_address.clone().unwrap_or_default(),
            match result.matching {
                Some(MatchQuality::Exact) => "exact".to_string(),
                Some(MatchQuality::Approximate) => "approximate".to_string(),
                None => String::new(),
            },
            result.success.to_string(),
            result.error.clone().unwrap_or_default(),
        ])?;
    }
    writer.flush()?;

    let succeeded = results.iter().filter(|r| r.success).count();
    let stats = BatchStats {
        total: results.len(),
        succeeded,
        failed: results.len() - succeeded,
    };
    info!(
        total = stats.total,
        succeeded = stats.succeeded,
        failed = stats.failed,
        "batch geocoding finished"
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_write_dataset_creates_json_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            record(json!({"LAT": 35.3, "PARK_NM": "Jirisan"})),
            record(json!({"LAT": 38.1, "PARK_NM": "Seoraksan"})),
        ];

        let paths = write_dataset(dir.path(), "stations_test", &records).unwrap();

        assert_eq!(paths.len(), 2);
        assert!(paths[0].extension().is_some_and(|e| e == "json"));
        assert!(paths[1].extension().is_some_and(|e| e == "csv"));
        for path in &paths {
            assert!(path.exists());
        }

        let reparsed: Vec<Record> =
            serde_json::from_str(&fs::read_to_string(&paths[0]).unwrap()).unwrap();
        assert_eq!(reparsed, records);
    }

    #[test]
    fn test_empty_dataset_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_dataset(dir.path(), "empty", &[]).unwrap();
        assert!(paths.is_empty());
    }

    #[test]
    fn test_csv_header_is_key_union_in_first_seen_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let records = vec![
            record(json!({"a": 1, "b": "two"})),
            record(json!({"b": "three", "c": null})),
        ];

        write_csv(&path, &records).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next(), Some("a,b,c"));
        assert_eq!(lines.next(), Some("1,two,"));
        assert_eq!(lines.next(), Some(",three,"));
    }

    #[test]
    fn test_cell_text_renders_scalars() {
        assert_eq!(cell_text(&json!(null)), "");
        assert_eq!(cell_text(&json!("text")), "text");
        assert_eq!(cell_text(&json!(3.5)), "3.5");
        assert_eq!(cell_text(&json!(true)), "true");
    }
}

//! Clients for the external mountain-data providers.
//!
//! Each provider exposes a paginated collection with its own envelope shape
//! and its own way of signalling "no more data". The clients share one page
//! loop ([`collect_pages`]) and differ only in how they build request
//! parameters and decode response envelopes.
//!
//! # Providers
//!
//! - [`base_station`]: cellular base-station registry (flat `data` array)
//! - [`mountain_weather`]: mountain weather observations (nested envelope,
//!   total-count pagination)
//! - [`hazard_poi`]: hazard point-of-interest registry (nested envelope,
//!   short-page pagination)
//!
//! # Failure semantics
//!
//! A transport error mid-pagination never fails the aggregate call. The
//! loop logs a warning and returns whatever was accumulated before the
//! failure, so callers always get the records that did arrive.

pub mod base_station;
pub mod hazard_poi;
pub mod mountain_weather;

pub use base_station::{BaseStationClient, StationFilter};
pub use hazard_poi::HazardPoiClient;
pub use mountain_weather::{MountainWeatherClient, WeatherFilter};

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::transport::Transport;

/// A raw record as returned by a provider, before any schema typing.
pub type Record = Map<String, Value>;

/// Default records requested per page.
const DEFAULT_PAGE_SIZE: u32 = 100;

/// Default cap on the number of pages fetched in one call.
const DEFAULT_MAX_PAGES: u32 = 3;

/// Page-size and page-cap knobs for one fetch call.
#[derive(Debug, Clone, Copy)]
pub struct FetchOptions {
    /// Records requested per page.
    pub page_size: u32,
    /// Hard cap on the number of pages fetched.
    pub max_pages: u32,
}

impl FetchOptions {
    /// Options with an explicit page cap and the default page size.
    pub fn with_max_pages(max_pages: u32) -> Self {
        Self {
            max_pages,
            ..Self::default()
        }
    }
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// How a provider signals that more pages remain after the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Continuation {
    /// No signal beyond an empty page; the loop runs to the page cap.
    Unbounded,
    /// The envelope carries a total record count; fetching stops once the
    /// pages requested so far cover it.
    TotalCount(u64),
    /// A page shorter than the requested size is the last one.
    ShortPage,
}

/// Decodes one response body into items plus a continuation signal.
///
/// A body that does not match the expected envelope decodes as an empty
/// page, which ends the loop.
pub(crate) trait PageDecoder {
    fn decode(&self, body: &Value) -> (Vec<Record>, Continuation);
}

/// Envelope with a flat top-level `data` array and no continuation signal.
pub(crate) struct FlatDataDecoder;

impl PageDecoder for FlatDataDecoder {
    fn decode(&self, body: &Value) -> (Vec<Record>, Continuation) {
        let items = body
            .get("data")
            .and_then(Value::as_array)
            .map(|array| {
                array
                    .iter()
                    .filter_map(|v| v.as_object().cloned())
                    .collect()
            })
            .unwrap_or_default();

        (items, Continuation::Unbounded)
    }
}

/// The `response.body.items.item` envelope family used by the public data
/// portal, where a single-record page arrives as a bare object rather than
/// a one-element array.
pub(crate) struct NestedItemDecoder {
    /// Whether the envelope's `totalCount` drives pagination. When false,
    /// a short page is the end-of-collection signal instead.
    pub count_based: bool,
}

impl PageDecoder for NestedItemDecoder {
    fn decode(&self, body: &Value) -> (Vec<Record>, Continuation) {
        let envelope_body = body.get("response").and_then(|r| r.get("body"));

        let items = match envelope_body
            .and_then(|b| b.get("items"))
            .and_then(|i| i.get("item"))
        {
            Some(Value::Array(array)) => array
                .iter()
                .filter_map(|v| v.as_object().cloned())
                .collect(),
            Some(Value::Object(object)) => vec![object.clone()],
            _ => Vec::new(),
        };

        let continuation = if self.count_based {
            let total = envelope_body
                .and_then(|b| b.get("totalCount"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            Continuation::TotalCount(total)
        } else {
            Continuation::ShortPage
        };

        (items, continuation)
    }
}

/// The shared page loop.
///
/// Fetches pages until the provider signals the end of the collection, the
/// page cap is reached, or a transport error occurs. Records keep page
/// order, then within-page order; duplicates across overlapping pages are
/// not filtered.
pub(crate) async fn collect_pages<D, F>(
    transport: &Transport,
    source: &str,
    url: &str,
    options: FetchOptions,
    decoder: &D,
    mut page_params: F,
) -> Vec<Record>
where
    D: PageDecoder,
    F: FnMut(u32) -> Vec<(String, String)>,
{
    let mut records = Vec::new();

    for page in 1..=options.max_pages {
        let params = page_params(page);

        let body = match transport.execute(url, &params).await {
            Ok(body) => body,
            Err(e) => {
                warn!(source, page, error = %e, "fetch aborted, returning partial results");
                break;
            }
        };

        let (items, continuation) = decoder.decode(&body);
        if items.is_empty() {
            break;
        }

        let fetched = items.len();
        records.extend(items);
        info!(source, page, fetched, "page fetched");

        match continuation {
            Continuation::Unbounded => {}
            Continuation::TotalCount(total) => {
                if u64::from(page) * u64::from(options.page_size) >= total {
                    break;
                }
            }
            Continuation::ShortPage => {
                if (fetched as u64) < u64::from(options.page_size) {
                    break;
                }
            }
        }
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_decoder_reads_data_array() {
        let body = json!({"data": [{"LAT": 35.3}, {"LAT": 38.1}]});
        let (items, continuation) = FlatDataDecoder.decode(&body);

        assert_eq!(items.len(), 2);
        assert_eq!(continuation, Continuation::Unbounded);
    }

    #[test]
    fn test_flat_decoder_missing_envelope_is_empty() {
        let (items, _) = FlatDataDecoder.decode(&json!({"rows": []}));
        assert!(items.is_empty());

        let (items, _) = FlatDataDecoder.decode(&json!("not an object"));
        assert!(items.is_empty());
    }

    #[test]
    fn test_nested_decoder_reads_item_array() {
        let body = json!({
            "response": {
                "body": {
                    "items": {"item": [{"obsid": "OBS0001"}, {"obsid": "OBS0002"}]},
                    "totalCount": 250
                }
            }
        });

        let decoder = NestedItemDecoder { count_based: true };
        let (items, continuation) = decoder.decode(&body);

        assert_eq!(items.len(), 2);
        assert_eq!(continuation, Continuation::TotalCount(250));
    }

    #[test]
    fn test_nested_decoder_wraps_single_object() {
        let body = json!({
            "response": {
                "body": {
                    "items": {"item": {"obsid": "OBS0001"}},
                    "totalCount": 1
                }
            }
        });

        let decoder = NestedItemDecoder { count_based: true };
        let (items, _) = decoder.decode(&body);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].get("obsid"), Some(&json!("OBS0001")));
    }

    #[test]
    fn test_nested_decoder_short_page_mode() {
        let body = json!({
            "response": {"body": {"items": {"item": [{"danger_id": "DNG-00001"}]}}}
        });

        let decoder = NestedItemDecoder { count_based: false };
        let (items, continuation) = decoder.decode(&body);

        assert_eq!(items.len(), 1);
        assert_eq!(continuation, Continuation::ShortPage);
    }

    #[test]
    fn test_nested_decoder_missing_total_count_reads_zero() {
        let body = json!({
            "response": {"body": {"items": {"item": [{"obsid": "OBS0001"}]}}}
        });

        let decoder = NestedItemDecoder { count_based: true };
        let (_, continuation) = decoder.decode(&body);

        assert_eq!(continuation, Continuation::TotalCount(0));
    }

    #[test]
    fn test_nested_decoder_malformed_body_is_empty() {
        let decoder = NestedItemDecoder { count_based: false };

        let (items, _) = decoder.decode(&json!({"response": {}}));
        assert!(items.is_empty());

        let (items, _) = decoder.decode(&json!({"response": {"body": {"items": null}}}));
        assert!(items.is_empty());
    }

    #[test]
    fn test_fetch_options_defaults() {
        let options = FetchOptions::default();
        assert_eq!(options.page_size, 100);
        assert_eq!(options.max_pages, 3);

        let options = FetchOptions::with_max_pages(5);
        assert_eq!(options.page_size, 100);
        assert_eq!(options.max_pages, 5);
    }
}

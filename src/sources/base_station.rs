//! Cellular base-station registry client.
//!
//! The registry publishes mobile base-station records for mountain parks
//! through a single search endpoint with a flat `data` envelope. Pagination
//! carries no explicit end marker: the loop runs until a page comes back
//! empty or the page cap is hit.

use crate::model::ParkClass;
use crate::sources::{FetchOptions, FlatDataDecoder, PageDecoder, Record, collect_pages};
use crate::transport::{Transport, TransportError};

/// Base URL for the base-station registry.
const BASE_STATION_API_BASE: &str = "https://spectrummap.kr/openapiNew.do";

/// Registry queries default to a deeper page cap than the other sources.
const BASE_STATION_MAX_PAGES: u32 = 5;

/// Search identifier for the mobile base-station dataset.
const SEARCH_ID: &str = "07";

/// Filters for a base-station query.
#[derive(Debug, Clone)]
pub struct StationFilter {
    /// Park name, or "ALL" for every park.
    pub park_name: String,
    /// Park classification.
    pub park_class: ParkClass,
    /// Carrier code (SK/KT/LG) or "ALL".
    pub carrier: String,
    /// Service generation (2G/3G/4G/5G) or "ALL".
    pub service: String,
}

impl Default for StationFilter {
    fn default() -> Self {
        Self {
            park_name: "ALL".to_string(),
            park_class: ParkClass::National,
            carrier: "ALL".to_string(),
            service: "ALL".to_string(),
        }
    }
}

impl StationFilter {
    /// Filter matching every station in one park.
    pub fn for_park(park_name: &str) -> Self {
        Self {
            park_name: park_name.to_string(),
            ..Self::default()
        }
    }
}

/// Client for querying the base-station registry.
#[derive(Clone)]
pub struct BaseStationClient {
    transport: Transport,
    base_url: String,
    api_key: String,
}

impl BaseStationClient {
    /// Create a new registry client.
    pub fn new(transport: Transport, api_key: &str) -> Self {
        Self::with_base_url(transport, BASE_STATION_API_BASE, api_key)
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(transport: Transport, base_url: &str, api_key: &str) -> Self {
        Self {
            transport,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Default paging for this source.
    pub fn default_options() -> FetchOptions {
        FetchOptions::with_max_pages(BASE_STATION_MAX_PAGES)
    }

    /// Fetch base-station records matching `filter`.
    ///
    /// Returns whatever was accumulated if a page fails mid-way.
    pub async fn fetch(&self, filter: &StationFilter, options: FetchOptions) -> Vec<Record> {
        collect_pages(
            &self.transport,
            "base_station",
            &self.base_url,
            options,
            &FlatDataDecoder,
            |page| self.page_params(filter, page, options.page_size),
        )
        .await
    }

    /// Every station recorded for a single park, with default paging.
    pub async fn stations_in_park(&self, park_name: &str) -> Vec<Record> {
        self.fetch(&StationFilter::for_park(park_name), Self::default_options())
            .await
    }

    /// Fetch a single page and report how many records it carried.
    ///
    /// # Errors
    ///
    /// Returns the [`TransportError`] if the registry is unreachable.
    pub async fn probe(&self) -> Result<usize, TransportError> {
        let params = self.page_params(&StationFilter::default(), 1, FetchOptions::default().page_size);
        let body = self.transport.execute(&self.base_url, &params).await?;
        let (items, _) = FlatDataDecoder.decode(&body);
        Ok(items.len())
    }

    fn page_params(
        &self,
        filter: &StationFilter,
        page: u32,
        page_size: u32,
    ) -> Vec<(String, String)> {
        vec![
            ("key".to_string(), self.api_key.clone()),
            ("searchId".to_string(), SEARCH_ID.to_string()),
            ("type".to_string(), "json".to_string()),
            ("SCH_CD".to_string(), "MOBILE".to_string()),
            ("PARK_CD".to_string(), filter.park_class.code().to_string()),
            ("QUERY".to_string(), filter.park_name.clone()),
            ("CUS_CD".to_string(), filter.carrier.clone()),
            ("SERVICE_CD".to_string(), filter.service.clone()),
            ("pIndex".to_string(), page.to_string()),
            ("pSize".to_string(), page_size.to_string()),
        ]
    }
}

//! Hazard point-of-interest registry client.
//!
//! Hazard POIs share the nested `response.body.items.item` envelope with
//! the weather API but signal the end of the collection differently: a page
//! shorter than the requested size is the last one. The registry exposes
//! several list endpoints under one service root; the default is the
//! general hazard listing.

use crate::sources::{FetchOptions, NestedItemDecoder, PageDecoder, Record, collect_pages};
use crate::transport::{Transport, TransportError};

/// Base URL for the hazard POI service.
const HAZARD_POI_API_BASE: &str = "https://apis.data.go.kr/B553662/dangerInfoService";

/// Endpoint for the general hazard listing.
const DEFAULT_ENDPOINT: &str = "getDangerInfoList";

/// Client for querying the hazard POI registry.
#[derive(Clone)]
pub struct HazardPoiClient {
    transport: Transport,
    base_url: String,
    service_key: String,
}

impl HazardPoiClient {
    /// Create a new hazard client.
    pub fn new(transport: Transport, service_key: &str) -> Self {
        Self::with_base_url(transport, HAZARD_POI_API_BASE, service_key)
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(transport: Transport, base_url: &str, service_key: &str) -> Self {
        Self {
            transport,
            base_url: base_url.to_string(),
            service_key: service_key.to_string(),
        }
    }

    /// Fetch hazard POI records from the default listing endpoint.
    pub async fn fetch(&self, options: FetchOptions) -> Vec<Record> {
        self.fetch_endpoint(DEFAULT_ENDPOINT, &[], options).await
    }

    /// Fetch from a specific endpoint with extra query parameters.
    ///
    /// Returns whatever was accumulated if a page fails mid-way.
    pub async fn fetch_endpoint(
        &self,
        endpoint: &str,
        extra: &[(String, String)],
        options: FetchOptions,
    ) -> Vec<Record> {
        let url = format!("{}/{}", self.base_url, endpoint);
        let decoder = NestedItemDecoder { count_based: false };

        collect_pages(
            &self.transport,
            "hazard_poi",
            &url,
            options,
            &decoder,
            |page| self.page_params(extra, page, options.page_size),
        )
        .await
    }

    /// Fetch a single page and report how many records it carried.
    ///
    /// # Errors
    ///
    /// Returns the [`TransportError`] if the registry is unreachable.
    pub async fn probe(&self) -> Result<usize, TransportError> {
        let url = format!("{}/{}", self.base_url, DEFAULT_ENDPOINT);
        let params = self.page_params(&[], 1, FetchOptions::default().page_size);
        let body = self.transport.execute(&url, &params).await?;
        let (items, _) = NestedItemDecoder { count_based: false }.decode(&body);
        Ok(items.len())
    }

    fn page_params(
        &self,
        extra: &[(String, String)],
        page: u32,
        page_size: u32,
    ) -> Vec<(String, String)> {
        let mut params = vec![
            ("serviceKey".to_string(), self.service_key.clone()),
            ("pageNo".to_string(), page.to_string()),
            ("numOfRows".to_string(), page_size.to_string()),
            ("returnType".to_string(), "JSON".to_string()),
        ];
        params.extend(extra.iter().cloned());
        params
    }
}

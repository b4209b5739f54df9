//! Mountain weather observation client.
//!
//! Observations come wrapped in the public data portal's nested
//! `response.body.items.item` envelope, with a `totalCount` field that
//! drives pagination: fetching stops once the pages requested so far cover
//! the reported total, even when the last page is full.

use crate::sources::{FetchOptions, NestedItemDecoder, PageDecoder, Record, collect_pages};
use crate::transport::{Transport, TransportError};

/// Base URL for the mountain weather observation API.
const MOUNTAIN_WEATHER_API_BASE: &str =
    "https://apis.data.go.kr/1400377/mtweather/mountListSearch";

/// Filters for a weather query. All fields are optional; an empty filter
/// returns the latest observations across every station.
#[derive(Debug, Clone, Default)]
pub struct WeatherFilter {
    /// Administrative area code (e.g. "01" for Seoul).
    pub local_area: Option<String>,
    /// Observation station id.
    pub obs_id: Option<String>,
    /// Observation time in `YYYYMMDDHHMM`.
    pub obs_time: Option<String>,
}

impl WeatherFilter {
    /// Filter matching one administrative area.
    pub fn for_area(area_code: &str) -> Self {
        Self {
            local_area: Some(area_code.to_string()),
            ..Self::default()
        }
    }
}

/// Client for querying mountain weather observations.
#[derive(Clone)]
pub struct MountainWeatherClient {
    transport: Transport,
    base_url: String,
    service_key: String,
}

impl MountainWeatherClient {
    /// Create a new weather client.
    pub fn new(transport: Transport, service_key: &str) -> Self {
        Self::with_base_url(transport, MOUNTAIN_WEATHER_API_BASE, service_key)
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(transport: Transport, base_url: &str, service_key: &str) -> Self {
        Self {
            transport,
            base_url: base_url.to_string(),
            service_key: service_key.to_string(),
        }
    }

    /// Fetch weather observations matching `filter`.
    ///
    /// Returns whatever was accumulated if a page fails mid-way.
    pub async fn fetch(&self, filter: &WeatherFilter, options: FetchOptions) -> Vec<Record> {
        let decoder = NestedItemDecoder { count_based: true };
        collect_pages(
            &self.transport,
            "mountain_weather",
            &self.base_url,
            options,
            &decoder,
            |page| self.page_params(filter, page, options.page_size),
        )
        .await
    }

    /// Observations for one administrative area, with default paging.
    pub async fn weather_for_area(&self, area_code: &str) -> Vec<Record> {
        self.fetch(&WeatherFilter::for_area(area_code), FetchOptions::default())
            .await
    }

    /// Fetch a single page and report how many records it carried.
    ///
    /// # Errors
    ///
    /// Returns the [`TransportError`] if the API is unreachable.
    pub async fn probe(&self) -> Result<usize, TransportError> {
        let params = self.page_params(&WeatherFilter::default(), 1, FetchOptions::default().page_size);
        let body = self.transport.execute(&self.base_url, &params).await?;
        let (items, _) = NestedItemDecoder { count_based: true }.decode(&body);
        Ok(items.len())
    }

    fn page_params(
        &self,
        filter: &WeatherFilter,
        page: u32,
        page_size: u32,
    ) -> Vec<(String, String)> {
        let mut params = vec![
            ("ServiceKey".to_string(), self.service_key.clone()),
            ("pageNo".to_string(), page.to_string()),
            ("numOfRows".to_string(), page_size.to_string()),
            ("_type".to_string(), "json".to_string()),
        ];

        if let Some(local_area) = &filter.local_area {
            params.push(("localArea".to_string(), local_area.clone()));
        }
        if let Some(obs_id) = &filter.obs_id {
            params.push(("obsid".to_string(), obs_id.clone()));
        }
        if let Some(obs_time) = &filter.obs_time {
            params.push(("tm".to_string(), obs_time.clone()));
        }

        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::RetryPolicy;

    fn test_client() -> MountainWeatherClient {
        let transport = Transport::with_policy(RetryPolicy::immediate()).unwrap();
        MountainWeatherClient::new(transport, "service-key")
    }

    #[test]
    fn test_page_params_omit_unset_filters() {
        let client = test_client();
        let params = client.page_params(&WeatherFilter::default(), 1, 100);

        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["ServiceKey", "pageNo", "numOfRows", "_type"]);
    }

    #[test]
    fn test_page_params_carry_set_filters() {
        let client = test_client();
        let filter = WeatherFilter {
            local_area: Some("06".to_string()),
            obs_id: Some("OBS0002".to_string()),
            obs_time: Some("202103221952".to_string()),
        };

        let params = client.page_params(&filter, 3, 50);

        let get = |key: &str| {
            params
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("pageNo"), Some("3"));
        assert_eq!(get("numOfRows"), Some("50"));
        assert_eq!(get("localArea"), Some("06"));
        assert_eq!(get("obsid"), Some("OBS0002"));
        assert_eq!(get("tm"), Some("202103221952"));
    }

    #[test]
    fn test_area_filter() {
        let filter = WeatherFilter::for_area("11");
        assert_eq!(filter.local_area.as_deref(), Some("11"));
        assert!(filter.obs_id.is_none());
        assert!(filter.obs_time.is_none());
    }
}

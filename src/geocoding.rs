//! SGIS geocoding client with token-based authentication.
//!
//! The geocoding provider issues bearer tokens from a consumer-key pair,
//! valid for four hours. [`SgisClient`] caches one token per process and
//! refreshes it behind a lock before it can lapse, so concurrent callers
//! never race duplicate authentication calls. Clones share the cache.
//!
//! Forward and reverse lookups never return `Err`: every failure is folded
//! into a result object with a populated error field, which keeps batch
//! jobs running across individual bad addresses.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::transport::{Transport, TransportError};

/// Base URL for the SGIS open API.
const SGIS_API_BASE: &str = "https://sgisapi.mods.go.kr/OpenAPI3";

/// How long an issued token stays valid.
const TOKEN_VALIDITY: Duration = Duration::from_secs(4 * 60 * 60);

/// Trailing window before expiry during which a token is treated as
/// already expired and refreshed instead of returned.
const TOKEN_SAFETY_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Geocoding authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider rejected the credentials or returned an unusable body.
    #[error("authentication rejected: {0}")]
    Rejected(String),

    /// The request itself failed after retries.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    /// A token is usable only while it outlives the safety margin.
    fn usable(&self, margin: Duration) -> bool {
        Instant::now() + margin < self.expires_at
    }
}

/// Match quality reported by the forward geocoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchQuality {
    /// The address matched a record exactly.
    Exact,
    /// The address matched partially.
    Approximate,
}

impl MatchQuality {
    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(MatchQuality::Exact),
            1 => Some(MatchQuality::Approximate),
            _ => None,
        }
    }
}

/// Result of a forward geocode for one address.
///
/// `success` and `error` are mutually exclusive: a failed lookup carries an
/// error message and no coordinates.
#[derive(Debug, Clone, Serialize)]
pub struct GeocodeResult {
    /// The address as submitted.
    pub address: String,

    /// Longitude (WGS84).
    pub x: Option<f64>,

    /// Latitude (WGS84).
    pub y: Option<f64>,

    /// Province-level region name.
    pub sido_name: Option<String>,

    /// District-level region name.
    pub sgg_name: Option<String>,

    /// Neighborhood-level region name.
    pub emdong_name: Option<String>,

    /// Full normalized address returned by the provider.
    pub full_address: Option<String>,

    /// Match quality, when the provider reported one.
    pub matching: Option<MatchQuality>,

    /// Whether the lookup resolved.
    pub success: bool,

    /// Error detail for failed lookups.
    pub error: Option<String>,
}

impl GeocodeResult {
    fn failure(address: &str, error: impl Into<String>) -> Self {
        Self {
            address: address.to_string(),
            x: None,
            y: None,
            sido_name: None,
            sgg_name: None,
            emdong_name: None,
            full_address: None,
            matching: None,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Result of a reverse geocode lookup.
#[derive(Debug, Clone, Serialize)]
pub struct ReverseGeocodeResult {
    /// Whether the lookup resolved.
    pub success: bool,

    /// The provider's address record, on success.
    pub data: Option<Value>,

    /// Error detail for failed lookups.
    pub error: Option<String>,
}

impl ReverseGeocodeResult {
    fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Progress callback for batch geocoding: (done, total, address, success).
pub type ProgressFn<'a> = dyn Fn(usize, usize, &str, bool) + Send + Sync + 'a;

/// Client for the SGIS geocoding API.
#[derive(Clone)]
pub struct SgisClient {
    transport: Transport,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
    token_ttl: Duration,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl SgisClient {
    /// Create a new geocoding client.
    pub fn new(transport: Transport, consumer_key: &str, consumer_secret: &str) -> Self {
        Self::with_base_url(transport, SGIS_API_BASE, consumer_key, consumer_secret)
    }

    /// Create a client with a custom base URL (for testing).
    pub fn with_base_url(
        transport: Transport,
        base_url: &str,
        consumer_key: &str,
        consumer_secret: &str,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.to_string(),
            consumer_key: consumer_key.to_string(),
            consumer_secret: consumer_secret.to_string(),
            token_ttl: TOKEN_VALIDITY,
            token: Arc::new(Mutex::new(None)),
        }
    }

    /// Override the assumed token validity window, e.g. for short-lived
    /// credentials.
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Return a token that outlives the safety margin, authenticating or
    /// re-authenticating as needed.
    ///
    /// The cache lock is held across the refresh, so at most one
    /// authentication request is in flight at a time.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the provider rejects the credentials or the
    /// request fails; there is no stale-token fallback.
    async fn access_token(&self) -> Result<String, AuthError> {
        let mut slot = self.token.lock().await;

        if let Some(token) = slot.as_ref()
            && token.usable(TOKEN_SAFETY_MARGIN)
        {
            return Ok(token.value.clone());
        }

        let url = format!("{}/auth/authentication.json", self.base_url);
        let params = vec![
            ("consumer_key".to_string(), self.consumer_key.clone()),
            ("consumer_secret".to_string(), self.consumer_secret.clone()),
        ];
        let body = self.transport.execute(&url, &params).await?;

        if body.get("errCd").and_then(Value::as_i64) != Some(0) {
            let message = body
                .get("errMsg")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(AuthError::Rejected(message.to_string()));
        }

        let value = body
            .pointer("/result/accessToken")
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::Rejected("response carried no access token".to_string()))?
            .to_string();

        info!("geocoding access token issued");
        *slot = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + self.token_ttl,
        });

        Ok(value)
    }

    /// Resolve an address to WGS84 coordinates.
    ///
    /// Never returns an error: transport and authentication failures are
    /// folded into a failed [`GeocodeResult`].
    pub async fn geocode(&self, address: &str) -> GeocodeResult {
        match self.try_geocode(address).await {
            Ok(result) => result,
            Err(e) => {
                warn!(address, error = %e, "geocoding failed");
                GeocodeResult::failure(address, e.to_string())
            }
        }
    }

    async fn try_geocode(&self, address: &str) -> Result<GeocodeResult, AuthError> {
        let token = self.access_token().await?;

        let url = format!("{}/addr/geocodewgs84.json", self.base_url);
        let params = vec![
            ("accessToken".to_string(), token),
            ("address".to_string(), address.to_string()),
            ("resultcount".to_string(), "1".to_string()),
        ];
        let body = self.transport.execute(&url, &params).await?;

        if body.get("errCd").and_then(Value::as_i64) != Some(0) {
            let message = body
                .get("errMsg")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Ok(GeocodeResult::failure(address, message));
        }

        let Some(item) = body.pointer("/result/resultdata/0") else {
            return Ok(GeocodeResult::failure(address, "no result"));
        };

        let matching = body
            .pointer("/result/matching")
            .and_then(Value::as_i64)
            .and_then(MatchQuality::from_code);

        Ok(GeocodeResult {
            address: address.to_string(),
            x: field_f64(item, "x"),
            y: field_f64(item, "y"),
            sido_name: field_string(item, "sido_nm"),
            sgg_name: field_string(item, "sgg_nm"),
            emdong_name: field_string(item, "emdong_nm"),
            full_address: field_string(item, "full_addr"),
            matching,
            success: true,
            error: None,
        })
    }

    /// Resolve WGS84 coordinates to an address record. `addr_type` 20
    /// selects administrative neighborhoods.
    ///
    /// Never returns an error; failures are folded into the result.
    pub async fn reverse_geocode(&self, x: f64, y: f64, addr_type: u32) -> ReverseGeocodeResult {
        match self.try_reverse_geocode(x, y, addr_type).await {
            Ok(result) => result,
            Err(e) => {
                warn!(x, y, error = %e, "reverse geocoding failed");
                ReverseGeocodeResult::failure(e.to_string())
            }
        }
    }

    async fn try_reverse_geocode(
        &self,
        x: f64,
        y: f64,
        addr_type: u32,
    ) -> Result<ReverseGeocodeResult, AuthError> {
        let token = self.access_token().await?;

        let url = format!("{}/addr/rgeocodewgs84.json", self.base_url);
        let params = vec![
            ("accessToken".to_string(), token),
            ("x_coor".to_string(), x.to_string()),
            ("y_coor".to_string(), y.to_string()),
            ("addr_type".to_string(), addr_type.to_string()),
        ];
        let body = self.transport.execute(&url, &params).await?;

        if body.get("errCd").and_then(Value::as_i64) != Some(0) {
            let message = body
                .get("errMsg")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Ok(ReverseGeocodeResult::failure(message));
        }

        match body.pointer("/result/0") {
            Some(item) => Ok(ReverseGeocodeResult {
                success: true,
                data: Some(item.clone()),
                error: None,
            }),
            None => Ok(ReverseGeocodeResult::failure("no result")),
        }
    }

    /// Geocode a list of addresses sequentially.
    ///
    /// Sleeps `delay` between calls (not after the last) to stay under the
    /// provider's rate limits. Results keep input order; repeated addresses
    /// are looked up repeatedly; individual failures do not stop the batch.
    /// The optional `progress` callback runs after each address.
    pub async fn batch_geocode(
        &self,
        addresses: &[String],
        delay: Duration,
        progress: Option<&ProgressFn<'_>>,
    ) -> Vec<GeocodeResult> {
        let total = addresses.len();
        let mut results = Vec::with_capacity(total);

        for (index, address) in addresses.iter().enumerate() {
            let result = self.geocode(address).await;

            if let Some(progress) = progress {
                progress(index + 1, total, address, result.success);
            }
            results.push(result);

            if index + 1 < total {
                tokio::time::sleep(delay).await;
            }
        }

        results
    }
}

/// Providers hand back numeric fields as either numbers or strings.
fn field_f64(item: &Value, key: &str) -> Option<f64> {
    match item.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
}

fn field_string(item: &Value, key: &str) -> Option<String> {
    item.get(key).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_match_quality_codes() {
        assert_eq!(MatchQuality::from_code(0), Some(MatchQuality::Exact));
        assert_eq!(MatchQuality::from_code(1), Some(MatchQuality::Approximate));
        assert_eq!(MatchQuality::from_code(2), None);
        assert_eq!(MatchQuality::from_code(-1), None);
    }

    #[test]
    fn test_cached_token_respects_margin() {
        let token = CachedToken {
            value: "tok".to_string(),
            expires_at: Instant::now() + Duration::from_secs(60),
        };

        assert!(token.usable(Duration::from_secs(30)));
        assert!(!token.usable(Duration::from_secs(120)));
    }

    #[test]
    fn test_failure_result_has_no_coordinates() {
        let result = GeocodeResult::failure("Seoul Gangnam", "no result");

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("no result"));
        assert!(result.x.is_none());
        assert!(result.y.is_none());
        assert!(result.matching.is_none());
    }

    #[test]
    fn test_numeric_fields_parse_from_strings() {
        let item = json!({"x": "127.0276", "y": 37.4979, "bad": "abc"});

        assert_eq!(field_f64(&item, "x"), Some(127.0276));
        assert_eq!(field_f64(&item, "y"), Some(37.4979));
        assert_eq!(field_f64(&item, "bad"), None);
        assert_eq!(field_f64(&item, "missing"), None);
    }

    #[test]
    fn test_match_quality_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&MatchQuality::Exact).unwrap(),
            "\"exact\""
        );
        assert_eq!(
            serde_json::to_string(&MatchQuality::Approximate).unwrap(),
            "\"approximate\""
        );
    }
}

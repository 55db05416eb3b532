//! Nominatim / OpenStreetMap geocoder client.
//!
//! The public instance allows **1 request per second**; the delay between
//! requests comes from `rate_limit_ms` in the service TOML.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use std::time::Instant;

use async_trait::async_trait;
use psc_dashboard_inspection_models::Coordinates;
use tokio::sync::Mutex;

use crate::retry::{RetryPolicy, with_retry};
use crate::service_registry::GeocodingService;
use crate::{GeocodeError, Geocoder};

/// Geocodes a free-form query (e.g. a port name) using Nominatim.
///
/// The caller is responsible for rate limiting.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the HTTP request fails, the service answers
/// with a non-success status, or the response cannot be parsed.
pub async fn geocode_freeform(
    client: &reqwest::Client,
    base_url: &str,
    query: &str,
    country_codes: Option<&str>,
) -> Result<Option<Coordinates>, GeocodeError> {
    let mut params = vec![("q", query), ("format", "jsonv2"), ("limit", "1")];
    if let Some(codes) = country_codes {
        params.push(("countrycodes", codes));
    }

    let resp = client.get(base_url).query(&params).send().await?;

    let status = resp.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(GeocodeError::RateLimited);
    }
    if !status.is_success() {
        return Err(GeocodeError::Status {
            status: status.as_u16(),
        });
    }

    let text = resp.text().await?;
    let body: serde_json::Value = serde_json::from_str(&text).map_err(|e| GeocodeError::Parse {
        message: format!("Nominatim response is not valid JSON: {e}"),
    })?;
    parse_response(&body)
}

/// Parses a Nominatim JSON response, taking the first result.
fn parse_response(body: &serde_json::Value) -> Result<Option<Coordinates>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim response is not an array".to_string(),
    })?;

    let Some(first) = results.first() else {
        return Ok(None);
    };

    let lat = first["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lat in Nominatim response".to_string(),
        })?;

    let lon = first["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lon in Nominatim response".to_string(),
        })?;

    Coordinates::new(lat, lon)
        .map(Some)
        .ok_or_else(|| GeocodeError::Parse {
            message: format!("Nominatim returned out-of-range coordinates ({lat}, {lon})"),
        })
}

/// A [`Geocoder`] backed by a Nominatim instance, with rate limiting and
/// retry.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    service: GeocodingService,
    retry: RetryPolicy,
    last_request: Mutex<Option<Instant>>,
}

impl NominatimGeocoder {
    /// Builds a client from a service configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] if the service is disabled, or
    /// [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(service: GeocodingService) -> Result<Self, GeocodeError> {
        if !service.enabled {
            return Err(GeocodeError::Config {
                message: format!("geocoding service '{}' is disabled", service.id),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(service.timeout())
            .user_agent(service.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            retry: service.retry_policy(),
            service,
            last_request: Mutex::new(None),
        })
    }

    /// Waits until at least `rate_limit_ms` has passed since the previous
    /// request.
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let wait = self.service.rate_limit().saturating_sub(previous.elapsed());
            if !wait.is_zero() {
                tokio::time::sleep(wait).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    fn name(&self) -> &str {
        &self.service.id
    }

    async fn lookup(&self, place: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let label = format!("{}:{place}", self.service.id);
        let result = with_retry(&self.retry, &label, || async move {
            self.throttle().await;
            log::debug!("[{}] querying '{place}'", self.service.id);
            geocode_freeform(
                &self.client,
                &self.service.base_url,
                place,
                self.service.country_codes.as_deref(),
            )
            .await
        })
        .await?;

        if result.is_none() {
            log::debug!("[{}] no match for '{place}'", self.service.id);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};
    use tokio::net::TcpListener;

    use super::*;
    use crate::service_registry::default_service;

    const YOKOHAMA: &str = r#"[{"lat":"35.4437","lon":"139.6380"}]"#;

    /// Serves the scripted `(status, body)` responses in order, repeating
    /// the last one, and counts requests.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let (status, body) = responses[n.min(responses.len() - 1)];

                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(read) => request.extend_from_slice(&buf[..read]),
                    }
                }

                let response = format!(
                    "HTTP/1.1 {status} Scripted\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{addr}/search"), hits)
    }

    fn local_geocoder(base_url: String, rate_limit_ms: u64) -> NominatimGeocoder {
        let mut service = default_service();
        service.base_url = base_url;
        service.country_codes = None;
        service.rate_limit_ms = rate_limit_ms;
        service.max_retries = 3;
        service.retry_base_delay_ms = 0;
        NominatimGeocoder::new(service).unwrap()
    }

    #[test]
    fn parses_nominatim_result() {
        let body = serde_json::json!([{
            "lat": "35.4437",
            "lon": "139.6380",
            "display_name": "Yokohama, Kanagawa Prefecture, Japan"
        }]);
        let result = parse_response(&body).unwrap().unwrap();
        assert!((result.latitude - 35.4437).abs() < 1e-4);
        assert!((result.longitude - 139.638).abs() < 1e-4);
    }

    #[test]
    fn parses_nominatim_empty() {
        let body = serde_json::json!([]);
        assert!(parse_response(&body).unwrap().is_none());
    }

    #[test]
    fn rejects_malformed_response() {
        assert!(parse_response(&serde_json::json!({"error": "nope"})).is_err());
        assert!(parse_response(&serde_json::json!([{"lat": "x", "lon": "1"}])).is_err());
        assert!(parse_response(&serde_json::json!([{"lat": "95", "lon": "1"}])).is_err());
    }

    #[test]
    fn builds_client_from_default_service() {
        let geocoder = NominatimGeocoder::new(default_service()).unwrap();
        assert_eq!(geocoder.name(), "nominatim");
    }

    #[test]
    fn refuses_disabled_service() {
        let mut service = default_service();
        service.enabled = false;
        assert!(matches!(
            NominatimGeocoder::new(service),
            Err(GeocodeError::Config { .. })
        ));
    }

    #[tokio::test]
    async fn retries_server_errors_until_success() {
        let (url, hits) = serve(vec![(503, ""), (503, ""), (200, YOKOHAMA)]).await;
        let geocoder = local_geocoder(url, 0);

        let coords = geocoder.lookup("Yokohama").await.unwrap().unwrap();
        assert!((coords.latitude - 35.4437).abs() < 1e-4);
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retries_rate_limited_responses() {
        let (url, hits) = serve(vec![(429, ""), (200, "[]")]).await;
        let geocoder = local_geocoder(url, 0);

        assert!(geocoder.lookup("Atlantis").await.unwrap().is_none());
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn gives_up_after_persistent_server_errors() {
        let (url, hits) = serve(vec![(503, "")]).await;
        let geocoder = local_geocoder(url, 0);

        assert!(matches!(
            geocoder.lookup("Kobe").await,
            Err(GeocodeError::Status { status: 503 })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let (url, hits) = serve(vec![(404, "")]).await;
        let geocoder = local_geocoder(url, 0);

        assert!(matches!(
            geocoder.lookup("Kobe").await,
            Err(GeocodeError::Status { status: 404 })
        ));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_error_without_retry() {
        let (url, hits) = serve(vec![(200, "not json")]).await;
        let geocoder = local_geocoder(url, 0);

        let result = geocoder.lookup("Kobe").await;
        assert!(matches!(result, Err(GeocodeError::Parse { .. })));
        assert!(!result.unwrap_err().is_transient());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn connection_refused_is_transient() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = reqwest::Client::new();
        let err = geocode_freeform(&client, &format!("http://{addr}/search"), "Kobe", None)
            .await
            .unwrap_err();
        assert!(matches!(err, GeocodeError::Http(_)));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn enforces_rate_limit_between_lookups() {
        let (url, hits) = serve(vec![(200, YOKOHAMA)]).await;
        let geocoder = local_geocoder(url, 200);

        let start = Instant::now();
        geocoder.lookup("Yokohama").await.unwrap();
        geocoder.lookup("Yokohama").await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(200));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }
}

//! IP-based geolocation
//!
//! Asks a public IP geolocation service (ipapi.co by default) where the
//! caller's address is. Only the `latitude`/`longitude` fields are used.

use crate::config::LocationConfig;
use crate::constants::api::{IP_API_URL, USER_AGENT};
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Something that can locate the caller by IP address
pub trait IpLocationBackend: Send + Sync {
    /// Coordinates of the caller, `None` if the service gave no usable position
    fn locate(&self) -> impl Future<Output = Result<Option<Coordinates>>> + Send;
}

/// HTTP IP location service
#[derive(Debug, Clone)]
pub struct IpLocator {
    client: reqwest::Client,
    url: String,
}

impl IpLocator {
    /// Create an IP locator against the default service
    pub fn new() -> Result<Self> {
        Self::with_url(IP_API_URL)
    }

    /// Create an IP locator against a specific service URL
    pub fn with_url(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Create an IP locator from the `[location]` config section
    pub fn from_config(config: &LocationConfig) -> Result<Self> {
        Self::with_url(&config.ip_url)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Pull validated coordinates out of a response body
    ///
    /// Missing, non-numeric, non-finite or out-of-range fields give `Ok(None)`;
    /// an explicit error flag from the service is an error.
    fn parse_response(body: &Value) -> Result<Option<Coordinates>> {
        if body.get("error").and_then(Value::as_bool) == Some(true) {
            let reason = body
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or("unknown reason");
            return Err(Error::Geo(format!("IP location lookup failed: {}", reason)));
        }

        let lat = body.get("latitude").and_then(parse_degrees);
        let lng = body.get("longitude").and_then(parse_degrees);

        match (lat, lng) {
            (Some(lat), Some(lng)) => {
                let coords = Coordinates::new(lat, lng);
                if coords.is_valid() {
                    Ok(Some(coords))
                } else {
                    debug!(lat, lng, "IP location out of range");
                    Ok(None)
                }
            }
            _ => {
                debug!("IP location response has no usable latitude/longitude");
                Ok(None)
            }
        }
    }
}

/// A degree value sent either as a JSON number or a numeric string
fn parse_degrees(value: &Value) -> Option<f64> {
    let degrees = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    degrees.is_finite().then_some(degrees)
}

impl IpLocationBackend for IpLocator {
    async fn locate(&self) -> Result<Option<Coordinates>> {
        let response = self.client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::Geo(format!("IP location request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Geo(format!(
                "IP location API returned status: {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::Geo(format!("Failed to parse IP location response: {}", e)))?;

        Self::parse_response(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ip_locator_creation() {
        let locator = IpLocator::new().unwrap();
        assert_eq!(locator.url(), IP_API_URL);
    }

    #[test]
    fn test_parse_numbers() {
        let body = json!({"ip": "203.0.113.7", "latitude": 10.0, "longitude": 20.0, "city": "X"});
        assert_eq!(
            IpLocator::parse_response(&body).unwrap(),
            Some(Coordinates::new(10.0, 20.0))
        );
    }

    #[test]
    fn test_parse_numeric_strings() {
        let body = json!({"latitude": "21.0285", "longitude": " 105.8542 "});
        assert_eq!(
            IpLocator::parse_response(&body).unwrap(),
            Some(Coordinates::new(21.0285, 105.8542))
        );
    }

    #[test]
    fn test_parse_missing_or_bad_fields() {
        assert_eq!(IpLocator::parse_response(&json!({})).unwrap(), None);
        assert_eq!(
            IpLocator::parse_response(&json!({"latitude": 10.0})).unwrap(),
            None
        );
        assert_eq!(
            IpLocator::parse_response(&json!({"latitude": "abc", "longitude": 1.0})).unwrap(),
            None
        );
        assert_eq!(
            IpLocator::parse_response(&json!({"latitude": null, "longitude": 1.0})).unwrap(),
            None
        );
        assert_eq!(
            IpLocator::parse_response(&json!({"latitude": 120.0, "longitude": 1.0})).unwrap(),
            None
        );
    }

    #[test]
    fn test_parse_non_finite_string() {
        assert_eq!(parse_degrees(&json!("inf")), None);
        assert_eq!(parse_degrees(&json!("NaN")), None);
        assert_eq!(parse_degrees(&json!(true)), None);
    }

    #[test]
    fn test_parse_service_error() {
        let body = json!({"error": true, "reason": "RateLimited"});
        let err = IpLocator::parse_response(&body).unwrap_err();
        assert!(err.to_string().contains("RateLimited"));
    }
}

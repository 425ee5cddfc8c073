//! Nominatim geocoding backend (OpenStreetMap)
//!
//! Uses the free Nominatim search API, restricted to one country.
//! Rate limit: 1 request per second; the resolver spaces requests out.

use crate::config::GeocoderConfig;
use crate::constants::api::{NOMINATIM_URL, USER_AGENT};
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::geo::{GeoBackend, GeoLocation};
use serde::Deserialize;
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Nominatim geocoding backend
#[derive(Debug, Clone)]
pub struct NominatimBackend {
    client: reqwest::Client,
    base_url: String,
    country_code: String,
}

/// Nominatim search response item
#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    #[serde(default)]
    display_name: String,
}

impl NominatimBackend {
    /// Create a backend against the public Nominatim instance
    pub fn new(country_code: impl Into<String>) -> Result<Self> {
        Self::with_base_url(NOMINATIM_URL, country_code, USER_AGENT)
    }

    /// Create a backend against a specific Nominatim instance
    pub fn with_base_url(
        base_url: impl Into<String>,
        country_code: impl Into<String>,
        user_agent: &str,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            country_code: country_code.into(),
        })
    }

    /// Create a backend from the `[geocoder]` config section
    pub fn from_config(config: &GeocoderConfig) -> Result<Self> {
        Self::with_base_url(&config.base_url, &config.country_code, &config.user_agent)
    }

    /// Country the searches are restricted to
    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Build the search URL for a free-text query
    fn search_url(&self, query: &str) -> String {
        let mut url = format!("{}/search?format=json&limit=1", self.base_url);
        if !self.country_code.is_empty() {
            url.push_str(&format!(
                "&countrycodes={}",
                urlencoding::encode(&self.country_code)
            ));
        }
        url.push_str(&format!("&q={}", urlencoding::encode(query)));
        url
    }

    /// Parse lat/lng strings into validated coordinates
    fn parse_coords(lat: &str, lng: &str) -> Result<Coordinates> {
        let lat: f64 = lat.trim().parse().map_err(|_| {
            Error::Geocoding(format!("Invalid latitude: {}", lat))
        })?;
        let lng: f64 = lng.trim().parse().map_err(|_| {
            Error::Geocoding(format!("Invalid longitude: {}", lng))
        })?;
        Coordinates::checked(lat, lng)
    }
}

impl GeoBackend for NominatimBackend {
    async fn geocode(&self, query: &str) -> Result<Option<GeoLocation>> {
        let response = self.client
            .get(self.search_url(query))
            .send()
            .await
            .map_err(|e| Error::Geocoding(format!("Nominatim request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Geocoding(format!(
                "Nominatim returned status: {}",
                response.status()
            )));
        }

        let results: Vec<NominatimResult> = response
            .json()
            .await
            .map_err(|e| Error::Geocoding(format!("Failed to parse Nominatim response: {}", e)))?;

        match results.into_iter().next() {
            Some(result) => {
                let coords = Self::parse_coords(&result.lat, &result.lon)?;
                Ok(Some(GeoLocation {
                    lat: coords.lat,
                    lng: coords.lng,
                    display_name: result.display_name,
                }))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coords() {
        let coords = NominatimBackend::parse_coords("10.7769", "106.7009").unwrap();
        assert!((coords.lat - 10.7769).abs() < 0.0001);
        assert!((coords.lng - 106.7009).abs() < 0.0001);
    }

    #[test]
    fn test_parse_coords_invalid() {
        assert!(NominatimBackend::parse_coords("invalid", "0").is_err());
        assert!(NominatimBackend::parse_coords("0", "invalid").is_err());
        assert!(NominatimBackend::parse_coords("95.0", "0").is_err());
        assert!(NominatimBackend::parse_coords("NaN", "0").is_err());
    }

    #[test]
    fn test_search_url() {
        let backend =
            NominatimBackend::with_base_url("https://geo.example/", "vn", "test-agent").unwrap();
        assert_eq!(
            backend.search_url("12 Nguyễn Huệ, Q1"),
            "https://geo.example/search?format=json&limit=1&countrycodes=vn&q=12%20Nguy%E1%BB%85n%20Hu%E1%BB%87%2C%20Q1"
        );
    }

    #[test]
    fn test_search_url_without_country() {
        let backend = NominatimBackend::with_base_url("https://geo.example", "", "t").unwrap();
        assert_eq!(
            backend.search_url("Hanoi"),
            "https://geo.example/search?format=json&limit=1&q=Hanoi"
        );
    }

    #[test]
    fn test_result_deserialization() {
        let body = r#"[{"lat": "21.0285", "lon": "105.8542", "display_name": "Hà Nội, Việt Nam", "importance": 0.8}]"#;
        let results: Vec<NominatimResult> = serde_json::from_str(body).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].lat, "21.0285");
    }

    #[test]
    fn test_backend_creation() {
        let backend = NominatimBackend::new("vn").unwrap();
        assert_eq!(backend.country_code(), "vn");
        assert!(format!("{:?}", backend).contains("NominatimBackend"));
    }
}

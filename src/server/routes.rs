//! HTTP API routes
//!
//! Defines all REST API endpoints for the server.

use crate::coord::distance::{haversine_km, rank_by_distance, NamedPlace};
use crate::coord::Coordinates;
use crate::error::Error;
use crate::geo::cache::CacheStats;
use crate::geo::location::ResolvedLocation;
use crate::server::state::AppState;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/status", get(status_handler))
        .route("/api/geocode", get(geocode_handler))
        .route("/api/distance", get(distance_handler))
        .route("/api/nearest", post(nearest_handler))
        .route("/api/location", get(location_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::BAD_REQUEST, Json(self)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let code = match &err {
            Error::InvalidCoordinates(_) => "INVALID_COORDINATES",
            Error::Config(_) => "CONFIG_ERROR",
            Error::Geocoding(_) => "GEOCODING_ERROR",
            Error::Geo(_) => "LOCATION_ERROR",
            _ => "INTERNAL_ERROR",
        };
        ApiError {
            error: err.to_string(),
            code: code.to_string(),
        }
    }
}

fn not_found(error: String, code: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiError {
            error,
            code: code.to_string(),
        }),
    )
}

/// Status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server is running
    pub running: bool,
    /// Server version
    pub version: String,
    /// Geocode cache entry counts
    pub cache: CacheStats,
    /// Uptime in seconds
    pub uptime_secs: u64,
}

/// Server status endpoint
///
/// GET /api/status
async fn status_handler(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    // Reads and parses the whole cache blob
    let cache = state.service.cache().clone();
    let stats = tokio::task::spawn_blocking(move || cache.stats())
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "cache stats task failed");
            CacheStats::default()
        });

    Json(StatusResponse {
        running: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        cache: stats,
        uptime_secs: state.uptime_secs(),
    })
}

/// Geocode query parameters
#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub name: String,
}

/// Geocode response
#[derive(Debug, Serialize, Deserialize)]
pub struct GeocodeResponse {
    pub address: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

/// Resolve an address to coordinates
///
/// GET /api/geocode?address=...&name=...
async fn geocode_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<GeocodeResponse>, (StatusCode, Json<ApiError>)> {
    let coords = state
        .service
        .geocode(&query.address, &query.name)
        .await
        .ok_or_else(|| {
            not_found(
                format!("No coordinates found for \"{}\"", query.address),
                "NOT_FOUND",
            )
        })?;

    Ok(Json(GeocodeResponse {
        address: query.address,
        name: query.name,
        lat: coords.lat,
        lng: coords.lng,
    }))
}

/// Distance query parameters
#[derive(Debug, Deserialize)]
pub struct DistanceQuery {
    pub from_lat: f64,
    pub from_lng: f64,
    pub to_lat: f64,
    pub to_lng: f64,
}

/// Distance response
#[derive(Debug, Serialize, Deserialize)]
pub struct DistanceResponse {
    pub km: f64,
}

/// Great-circle distance between two points
///
/// GET /api/distance?from_lat=..&from_lng=..&to_lat=..&to_lng=..
async fn distance_handler(
    Query(query): Query<DistanceQuery>,
) -> Result<Json<DistanceResponse>, ApiError> {
    let from = Coordinates::checked(query.from_lat, query.from_lng)?;
    let to = Coordinates::checked(query.to_lat, query.to_lng)?;

    Ok(Json(DistanceResponse {
        km: haversine_km(from, to),
    }))
}

/// Nearest request body
#[derive(Debug, Serialize, Deserialize)]
pub struct NearestRequest {
    pub origin: Coordinates,
    pub places: Vec<NamedPlace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// A place with its distance from the origin
#[derive(Debug, Serialize, Deserialize)]
pub struct RankedPlace {
    #[serde(flatten)]
    pub place: NamedPlace,
    pub km: f64,
}

/// Rank places by distance from an origin, nearest first
///
/// POST /api/nearest
async fn nearest_handler(
    Json(request): Json<NearestRequest>,
) -> Result<Json<Vec<RankedPlace>>, ApiError> {
    request.origin.validate()?;
    for place in &request.places {
        place.coords.validate()?;
    }

    let mut ranked: Vec<RankedPlace> = rank_by_distance(request.origin, request.places)
        .into_iter()
        .map(|(place, km)| RankedPlace { place, km })
        .collect();
    if let Some(limit) = request.limit {
        ranked.truncate(limit);
    }

    Ok(Json(ranked))
}

/// Get the server's current location
///
/// GET /api/location
async fn location_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ResolvedLocation>, (StatusCode, Json<ApiError>)> {
    state
        .service
        .locate()
        .await
        .map(Json)
        .ok_or_else(|| not_found("Location unavailable".to_string(), "LOCATION_UNAVAILABLE"))
}

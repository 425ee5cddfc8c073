//! Great-circle distance
//!
//! Haversine distance in kilometers, and ranking of places by distance
//! from an origin (nearest service center first).

use crate::constants::geo::EARTH_RADIUS_KM;
use crate::coord::Coordinates;
use serde::{Deserialize, Serialize};

/// Calculate the distance between two points in kilometers (Haversine formula)
///
/// # Arguments
/// * `p1` - First point
/// * `p2` - Second point
///
/// # Returns
/// Distance in kilometers on a sphere of radius 6371 km
pub fn haversine_km(p1: Coordinates, p2: Coordinates) -> f64 {
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();
    let delta_lat = (p2.lat - p1.lat).to_radians();
    let delta_lng = (p2.lng - p1.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Anything with a position that can be ranked by distance
pub trait Located {
    fn coordinates(&self) -> Coordinates;
}

impl Located for Coordinates {
    fn coordinates(&self) -> Coordinates {
        *self
    }
}

/// A named place such as a service center
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPlace {
    pub name: String,
    #[serde(flatten)]
    pub coords: Coordinates,
}

impl Located for NamedPlace {
    fn coordinates(&self) -> Coordinates {
        self.coords
    }
}

/// Order items by ascending distance from `origin`
///
/// Returns each item paired with its distance in kilometers. Ties keep
/// their input order.
pub fn rank_by_distance<T: Located>(origin: Coordinates, items: Vec<T>) -> Vec<(T, f64)> {
    let mut ranked: Vec<(T, f64)> = items
        .into_iter()
        .map(|item| {
            let km = haversine_km(origin, item.coordinates());
            (item, km)
        })
        .collect();

    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    ranked
}

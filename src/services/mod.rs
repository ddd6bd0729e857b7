use serde::{Deserialize, Serialize};

pub mod api;
pub mod geocoding;
pub mod recommend;
pub mod routing;
pub mod session;
#[cfg(test)]
pub mod testing;
pub mod tickets;

pub use api::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// A named stop sent to the routing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

/// Backend-computed path between ordered waypoints. `points` are
/// `[lng, lat]` pairs, GeoJSON order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default)]
    pub points: Vec<[f64; 2]>,
    pub distance_km: f64,
    pub time_min: f64,
}

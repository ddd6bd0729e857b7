use async_trait::async_trait;
use log::*;
use serde::{Deserialize, Serialize};

use super::{api, ApiClient, Route, Waypoint};
use crate::{GenericError, WertigoError};

#[async_trait]
pub trait RoutingService {
    /// Routes through `waypoints` in the given order.
    async fn route(&self, waypoints: &[Waypoint]) -> Result<Route, GenericError>;
}

#[derive(Debug, Serialize)]
pub struct RouteRequest {
    pub points: Vec<[f64; 2]>,
    pub names: Vec<String>,
}

impl RouteRequest {
    pub fn new(waypoints: &[Waypoint]) -> Self {
        RouteRequest {
            points: waypoints.iter().map(|w| [w.lng, w.lat]).collect(),
            names: waypoints.iter().map(|w| w.name.clone()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    route: Option<Route>,
}

#[async_trait]
impl RoutingService for ApiClient {
    async fn route(&self, waypoints: &[Waypoint]) -> Result<Route, GenericError> {
        if waypoints.len() < 2 {
            return Err(WertigoError::validation("Need at least 2 destinations to create a route").into());
        }
        let request = self
            .http()
            .post(self.url("/route"))
            .json(&RouteRequest::new(waypoints));
        let response: RouteResponse =
            api::decode(self.send(request).await?, "Error calculating route").await?;
        let route = response.route.ok_or_else(|| {
            WertigoError::NotFound(
                "Could not calculate a route between these destinations.".to_string(),
            )
        })?;
        debug!(
            "Route calculated: {:.1} km, {} minutes",
            route.distance_km,
            route.time_min.round()
        );
        Ok(route)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_request_uses_lng_lat_order() {
        let request = RouteRequest::new(&[
            Waypoint {
                name: "Intramuros".to_string(),
                lat: 14.59,
                lng: 120.97,
            },
            Waypoint {
                name: "BGC".to_string(),
                lat: 14.55,
                lng: 121.05,
            },
        ]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["points"][0][0], 120.97);
        assert_eq!(json["points"][0][1], 14.59);
        assert_eq!(json["names"][1], "BGC");
    }
}

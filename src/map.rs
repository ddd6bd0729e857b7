//! Map layers as data: markers, a route line and the box that fits them,
//! emitted as a GeoJSON `FeatureCollection`.

use serde::Serialize;
use serde_json::{json, Value};

use crate::{
    planner::TripPlanner,
    services::{Coordinates, Route},
    tracker::{self, TicketView},
};

pub const DEFAULT_CENTER: Coordinates = Coordinates {
    lat: 14.5995,
    lng: 120.9842,
};
pub const DEFAULT_ZOOM: u8 = 10;
const ROUTE_COLOR: &str = "#0066cc";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub name: String,
    pub position: Coordinates,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    fn around(point: Coordinates) -> Self {
        Bounds {
            south: point.lat,
            west: point.lng,
            north: point.lat,
            east: point.lng,
        }
    }

    fn extend(&mut self, point: Coordinates) {
        self.south = self.south.min(point.lat);
        self.north = self.north.max(point.lat);
        self.west = self.west.min(point.lng);
        self.east = self.east.max(point.lng);
    }

    pub fn center(&self) -> Coordinates {
        Coordinates {
            lat: (self.south + self.north) / 2.0,
            lng: (self.west + self.east) / 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    markers: Vec<Marker>,
    /// `[lng, lat]` pairs as the routing endpoint returns them.
    route: Vec<[f64; 2]>,
    route_summary: Option<String>,
}

impl Default for MapView {
    fn default() -> Self {
        MapView::new()
    }
}

fn stop_label(index: usize) -> String {
    if index == 0 {
        "Starting Point".to_string()
    } else {
        format!("Stop {index}")
    }
}

impl MapView {
    pub fn new() -> Self {
        MapView {
            markers: Vec::new(),
            route: Vec::new(),
            route_summary: None,
        }
    }

    /// Planned destinations that have coordinates, plus the calculated
    /// route when there is one.
    pub fn from_planner(planner: &TripPlanner) -> Self {
        let mut view = MapView::new();
        for destination in planner.destinations() {
            if let Some(position) = destination.coordinates() {
                let label = stop_label(view.markers.len());
                view.add_marker(&destination.name, position, label);
            }
        }
        for activity in planner.activities() {
            if let Some(position) = activity.coordinates {
                view.add_marker(&activity.name, position, format!("Day {} activity", activity.day));
            }
        }
        if let Some(route) = &planner.trip().route_info {
            view.set_route(&route.points, route.distance_km, route.time_min);
        }
        view
    }

    pub fn from_ticket(ticket: &TicketView, route: Option<&Route>) -> Self {
        let mut view = MapView::new();
        for (index, waypoint) in tracker::route_waypoints(ticket).iter().enumerate() {
            let position = Coordinates {
                lat: waypoint.lat,
                lng: waypoint.lng,
            };
            view.add_marker(&waypoint.name, position, stop_label(index));
        }
        if let Some(route) = route {
            view.set_route(&route.points, route.distance_km, route.time_min);
        }
        view
    }

    pub fn add_marker(&mut self, name: &str, position: Coordinates, label: impl Into<String>) {
        self.markers.push(Marker {
            name: name.to_string(),
            position,
            label: label.into(),
        });
    }

    pub fn set_route(&mut self, points: &[[f64; 2]], distance_km: f64, time_min: f64) {
        self.route = points.to_vec();
        self.route_summary = Some(format!(
            "{distance_km:.1} km, {}",
            tracker::format_travel_time(time_min)
        ));
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Box around every marker and route point, if there is anything to show.
    pub fn bounds(&self) -> Option<Bounds> {
        let mut points = self
            .markers
            .iter()
            .map(|m| m.position)
            .chain(self.route.iter().map(|[lng, lat]| Coordinates { lat: *lat, lng: *lng }));
        let mut bounds = Bounds::around(points.next()?);
        for point in points {
            bounds.extend(point);
        }
        Some(bounds)
    }

    pub fn center(&self) -> Coordinates {
        self.bounds().map_or(DEFAULT_CENTER, |b| b.center())
    }

    pub fn to_geojson(&self) -> Value {
        let mut features: Vec<Value> = self
            .markers
            .iter()
            .map(|marker| {
                json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "Point",
                        "coordinates": [marker.position.lng, marker.position.lat],
                    },
                    "properties": {
                        "name": marker.name,
                        "label": marker.label,
                    },
                })
            })
            .collect();
        if self.route.len() >= 2 {
            features.push(json!({
                "type": "Feature",
                "geometry": {
                    "type": "LineString",
                    "coordinates": self.route,
                },
                "properties": {
                    "name": "Route",
                    "summary": self.route_summary,
                    "stroke": ROUTE_COLOR,
                },
            }));
        }

        let center = self.center();
        let mut collection = json!({
            "type": "FeatureCollection",
            "features": features,
            "properties": {
                "center": [center.lng, center.lat],
                "zoom": DEFAULT_ZOOM,
            },
        });
        if let Some(b) = self.bounds() {
            collection["bbox"] = json!([b.west, b.south, b.east, b.north]);
        }
        collection
    }
}

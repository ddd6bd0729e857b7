//! In-memory stand-in for the backend, shared by unit tests.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;

use super::{
    geocoding::GeocodingService,
    recommend::{RecommendRequest, RecommendResponse, RecommendationService},
    routing::RoutingService,
    tickets::{
        CreateTicketRequest, CreateTripRequest, CreateTripResponse, Ticket, TicketId,
        TripStorageService,
    },
    Coordinates, Route, Waypoint,
};
use crate::{GenericError, WertigoError};

#[derive(Default)]
pub struct FakeBackend {
    pub places: HashMap<String, Coordinates>,
    pub route: Option<Route>,
    pub recommendation: Option<RecommendResponse>,
    pub recommend_error: Option<fn() -> GenericError>,
    pub trip_response: Option<CreateTripResponse>,
    pub tickets: Vec<Ticket>,
    pub geocode_calls: Mutex<Vec<String>>,
    pub route_calls: Mutex<Vec<Vec<Waypoint>>>,
    pub recommend_calls: Mutex<Vec<RecommendRequest>>,
    pub trip_requests: Mutex<Vec<CreateTripRequest>>,
    pub ticket_requests: Mutex<Vec<CreateTicketRequest>>,
}

impl FakeBackend {
    pub fn with_place(mut self, query: &str, lat: f64, lng: f64) -> Self {
        self.places.insert(query.to_string(), Coordinates { lat, lng });
        self
    }

    pub fn with_route(mut self, distance_km: f64, time_min: f64) -> Self {
        self.route = Some(Route {
            points: vec![[120.98, 14.59], [121.05, 14.55]],
            distance_km,
            time_min,
        });
        self
    }
}

#[async_trait]
impl GeocodingService for FakeBackend {
    async fn geocode(&self, query: &str) -> Result<Coordinates, GenericError> {
        self.geocode_calls.lock().unwrap().push(query.to_string());
        self.places
            .get(query)
            .copied()
            .ok_or_else(|| WertigoError::LocationNotFound().into())
    }
}

#[async_trait]
impl RoutingService for FakeBackend {
    async fn route(&self, waypoints: &[Waypoint]) -> Result<Route, GenericError> {
        self.route_calls.lock().unwrap().push(waypoints.to_vec());
        self.route
            .clone()
            .ok_or_else(|| WertigoError::NotFound("no route".to_string()).into())
    }
}

#[async_trait]
impl RecommendationService for FakeBackend {
    async fn recommend(&self, request: &RecommendRequest) -> Result<RecommendResponse, GenericError> {
        self.recommend_calls.lock().unwrap().push(request.clone());
        if let Some(make_error) = self.recommend_error {
            return Err(make_error());
        }
        Ok(self.recommendation.clone().unwrap_or_default())
    }
}

#[async_trait]
impl TripStorageService for FakeBackend {
    async fn create_trip(&self, request: &CreateTripRequest) -> Result<CreateTripResponse, GenericError> {
        self.trip_requests.lock().unwrap().push(request.clone());
        Ok(self.trip_response.clone().unwrap_or_default())
    }

    async fn create_ticket(&self, request: &CreateTicketRequest) -> Result<TicketId, GenericError> {
        self.ticket_requests.lock().unwrap().push(request.clone());
        Ok(TicketId::from("WT-0001"))
    }

    async fn get_ticket(&self, id: &TicketId, _email: Option<&str>) -> Result<Ticket, GenericError> {
        self.tickets
            .iter()
            .find(|t| &t.ticket_id == id)
            .cloned()
            .ok_or_else(|| WertigoError::NotFound("Ticket not found".to_string()).into())
    }

    async fn list_tickets(&self, _email: &str) -> Result<Vec<Ticket>, GenericError> {
        Ok(self.tickets.clone())
    }
}

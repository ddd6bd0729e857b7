use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use derive_more::{Display, From};
use log::*;
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::{api, ApiClient};
use crate::{
    planner::{Budget, Destination, RouteInfo},
    GenericError, WertigoError,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketId(String);

impl TicketId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TicketId {
    fn from(id: &str) -> Self {
        TicketId(id.to_string())
    }
}

/// Identifier the backend uses to drop duplicate submissions.
pub fn request_id(prefix: &str) -> String {
    format!("{prefix}_{}_{}", unix_millis(), Uuid::new_v4().simple())
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[async_trait]
pub trait TripStorageService {
    async fn create_trip(&self, request: &CreateTripRequest) -> Result<CreateTripResponse, GenericError>;
    async fn create_ticket(&self, request: &CreateTicketRequest) -> Result<TicketId, GenericError>;
    async fn get_ticket(&self, id: &TicketId, email: Option<&str>) -> Result<Ticket, GenericError>;
    async fn list_tickets(&self, email: &str) -> Result<Vec<Ticket>, GenericError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTripRequest {
    pub destination: String,
    pub travelers: u32,
    pub budget: String,
    pub interests: Vec<String>,
    pub selected_destination_data: Option<Destination>,
    pub all_selected_destinations: Vec<Destination>,
    pub request_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTripResponse {
    #[serde(default)]
    pub trip: Option<SavedTrip>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<Value>,
}

/// A trip as the backend returns it, inside `/create_trip` answers and
/// inside tickets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedTrip {
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub travelers: Option<u32>,
    #[serde(default)]
    pub budget: Option<Budget>,
    #[serde(default)]
    pub budget_numeric: Option<f64>,
    #[serde(default)]
    pub selected_destinations: Option<Vec<Destination>>,
    #[serde(default)]
    pub itinerary: Vec<ItineraryDay>,
    #[serde(default)]
    pub travel_dates: Option<String>,
    #[serde(default)]
    pub route_info: Option<RouteInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryDay {
    pub day: u32,
    #[serde(default)]
    pub places: Vec<Destination>,
    #[serde(default)]
    pub meals: Vec<Meal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transportation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<Budget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateTicketRequest {
    pub email: String,
    pub itinerary: TicketPayload,
    pub request_id: String,
}

/// The trip snapshot stored with a ticket.
#[derive(Debug, Clone, Serialize)]
pub struct TicketPayload {
    pub destination: String,
    pub travelers: u32,
    pub budget: String,
    pub budget_numeric: f64,
    pub selected_destinations: Vec<Destination>,
    pub itinerary: Vec<ItineraryDay>,
    pub travel_dates: Option<String>,
    pub trip_summary: TripSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_info: Option<RouteInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripSummary {
    pub total_destinations: usize,
    pub main_categories: Vec<String>,
    pub estimated_duration: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ticket {
    pub ticket_id: TicketId,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub travel_dates: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub trip: Option<SavedTrip>,
}

#[derive(Debug, Deserialize)]
struct TicketResponse {
    ticket: Ticket,
}

#[derive(Debug, Deserialize)]
struct TicketListResponse {
    #[serde(default)]
    tickets: Vec<Ticket>,
}

#[derive(Debug, Deserialize)]
struct CreateTicketResponse {
    ticket_id: Option<TicketId>,
    error: Option<String>,
}

fn no_cache_headers(request_id: &str) -> Result<HeaderMap, GenericError> {
    let mut headers = HeaderMap::new();
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    headers.insert("X-Request-ID", HeaderValue::from_str(request_id)?);
    Ok(headers)
}

#[async_trait]
impl TripStorageService for ApiClient {
    async fn create_trip(&self, request: &CreateTripRequest) -> Result<CreateTripResponse, GenericError> {
        debug!(
            "Creating itinerary with {} destinations, request id {}",
            request.all_selected_destinations.len(),
            request.request_id
        );
        let builder = self
            .http()
            .post(self.url("/create_trip"))
            .query(&[("_", unix_millis().to_string())])
            .headers(no_cache_headers(&request.request_id)?)
            .json(request);
        let response = self.send(builder).await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            // An unknown destination comes back with suggestions to pick from.
            if let Ok(parsed) = serde_json::from_str::<CreateTripResponse>(&body) {
                if !parsed.suggestions.is_empty() {
                    return Ok(parsed);
                }
            }
            let fallback = format!("HTTP error! Status: {}", status.as_u16());
            return Err(api::api_error(status, &body, &fallback).into());
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn create_ticket(&self, request: &CreateTicketRequest) -> Result<TicketId, GenericError> {
        let builder = self
            .http()
            .post(self.url("/create_ticket"))
            .headers(no_cache_headers(&request.request_id)?)
            .json(request);
        let response = self.send(builder).await?;
        let status = response.status();
        let body = response.text().await?;
        let parsed: Option<CreateTicketResponse> = serde_json::from_str(&body).ok();
        match parsed {
            Some(CreateTicketResponse {
                ticket_id: Some(id),
                ..
            }) if status.is_success() => {
                info!("Ticket {id} created for {}", request.email);
                Ok(id)
            }
            Some(CreateTicketResponse { error: Some(e), .. }) => Err(WertigoError::Api {
                status: status.as_u16(),
                message: e,
            }
            .into()),
            _ => Err(api::api_error(status, &body, "Please try again later.").into()),
        }
    }

    async fn get_ticket(&self, id: &TicketId, email: Option<&str>) -> Result<Ticket, GenericError> {
        let mut builder = self.http().get(self.url(&format!("/tickets/{}", id.as_str())));
        if let Some(email) = email {
            builder = builder.query(&[("email", email)]);
        }
        let response: TicketResponse =
            api::decode(self.send(builder).await?, "Failed to fetch ticket").await?;
        Ok(response.ticket)
    }

    async fn list_tickets(&self, email: &str) -> Result<Vec<Ticket>, GenericError> {
        let builder = self.http().get(self.url("/tickets")).query(&[("email", email)]);
        let response: TicketListResponse =
            api::decode(self.send(builder).await?, "Failed to fetch tickets").await?;
        Ok(response.tickets)
    }
}

//! Looking up saved trips by ticket id or e-mail.

use std::fmt::Write;

use log::*;
use rust_decimal::Decimal;

use crate::{
    planner::{budget, Destination},
    services::{
        routing::RoutingService,
        tickets::{ItineraryDay, Ticket, TicketId, TripStorageService},
        Route, Waypoint,
    },
    GenericError, WertigoError,
};

const NOT_SPECIFIED: &str = "Not specified";

/// A ticket with every display default filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct TicketView {
    pub ticket_id: TicketId,
    pub status: String,
    pub destination: String,
    pub travel_dates: String,
    pub travelers: u32,
    pub budget: String,
    pub created_at: Option<String>,
    pub itinerary: Vec<ItineraryDay>,
    pub selected_destinations: Vec<Destination>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<Ticket> for TicketView {
    fn from(ticket: Ticket) -> Self {
        let trip = ticket.trip.unwrap_or_default();
        let budget = match trip.budget_numeric.and_then(|n| Decimal::try_from(n).ok()) {
            Some(amount) if !amount.is_zero() => budget::format_peso(amount),
            _ => budget::format_budget(trip.budget.as_ref()),
        };
        TicketView {
            ticket_id: ticket.ticket_id,
            status: non_blank(ticket.status).unwrap_or_else(|| "active".to_string()),
            destination: non_blank(ticket.destination)
                .or(non_blank(trip.destination))
                .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            travel_dates: non_blank(ticket.travel_dates)
                .or(non_blank(trip.travel_dates))
                .unwrap_or_else(|| NOT_SPECIFIED.to_string()),
            travelers: trip.travelers.filter(|t| *t > 0).unwrap_or(1),
            budget,
            created_at: non_blank(ticket.created_at),
            itinerary: trip.itinerary,
            selected_destinations: trip.selected_destinations.unwrap_or_default(),
        }
    }
}

pub async fn lookup<S>(storage: &S, ticket_id: &str, email: Option<&str>) -> Result<TicketView, GenericError>
where
    S: TripStorageService + Sync + ?Sized,
{
    let ticket_id = ticket_id.trim();
    if ticket_id.is_empty() {
        return Err(WertigoError::validation("Please enter a ticket ID.").into());
    }
    let email = email.map(str::trim).filter(|e| !e.is_empty());
    debug!("Fetching ticket {ticket_id}");
    let ticket = storage.get_ticket(&TicketId::from(ticket_id), email).await?;
    Ok(ticket.into())
}

pub async fn list<S>(storage: &S, email: &str) -> Result<Vec<TicketView>, GenericError>
where
    S: TripStorageService + Sync + ?Sized,
{
    let email = email.trim();
    if email.is_empty() {
        return Err(WertigoError::validation("Please enter an email address.").into());
    }
    let tickets = storage.list_tickets(email).await?;
    if tickets.is_empty() {
        return Err(WertigoError::NotFound("No tickets found for this email address.".to_string()).into());
    }
    Ok(tickets.into_iter().map(TicketView::from).collect())
}

/// Itinerary places that can be drawn on a map, in visiting order.
pub fn route_waypoints(view: &TicketView) -> Vec<Waypoint> {
    view.itinerary
        .iter()
        .flat_map(|day| day.places.iter())
        .filter_map(|place| {
            place.coordinates().map(|c| Waypoint {
                name: place.name.clone(),
                lat: c.lat,
                lng: c.lng,
            })
        })
        .collect()
}

/// Recomputes the display route through the ticket's itinerary.
pub async fn route<R>(router: &R, view: &TicketView) -> Result<Route, GenericError>
where
    R: RoutingService + Sync + ?Sized,
{
    let waypoints = route_waypoints(view);
    if waypoints.len() < 2 {
        return Err(WertigoError::validation(
            "At least two itinerary places with coordinates are needed to show a route.",
        )
        .into());
    }
    router.route(&waypoints).await
}

pub fn format_travel_time(minutes: f64) -> String {
    let total = minutes.max(0.0).round() as u64;
    let (hours, rest) = (total / 60, total % 60);
    if hours > 0 {
        format!("{hours} h {rest} min")
    } else {
        format!("{rest} min")
    }
}

/// `★★★☆☆` for a rating of 3.x.
pub fn star_rating(rating: f64) -> String {
    let full = rating.floor().clamp(0.0, 5.0) as usize;
    format!("{}{}", "★".repeat(full), "☆".repeat(5 - full))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl TicketView {
    /// One-line entry for ticket lists.
    pub fn summary(&self) -> String {
        format!(
            "{}  [{}]  {}  {}",
            self.ticket_id,
            capitalize(&self.status),
            self.destination,
            self.travel_dates
        )
    }

    pub fn render(&self, route: Option<&Route>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Ticket {}  [{}]", self.ticket_id, capitalize(&self.status));
        let _ = writeln!(out, "Destination: {}", self.destination);
        let _ = writeln!(out, "Travel dates: {}", self.travel_dates);
        let _ = writeln!(out, "Travelers: {}", self.travelers);
        let _ = writeln!(out, "Budget: {}", self.budget);
        if let Some(created) = &self.created_at {
            let _ = writeln!(out, "Created: {created}");
        }
        if let Some(route) = route {
            let _ = writeln!(
                out,
                "Total distance: {:.1} km, estimated time: {}",
                route.distance_km,
                format_travel_time(route.time_min)
            );
        }

        if self.itinerary.is_empty() {
            let _ = writeln!(out, "\nNo itinerary saved with this ticket.");
            for place in &self.selected_destinations {
                let _ = writeln!(out, "  - {} ({})", place.name, place.city);
            }
            return out;
        }
        for day in &self.itinerary {
            let _ = writeln!(out, "\nDay {}", day.day);
            for place in &day.places {
                let category = if place.category.is_empty() {
                    "Attraction"
                } else {
                    &place.category
                };
                let _ = write!(out, "  - {} ({category})", place.name);
                if let Some(rating) = place.rating.filter(|r| *r > 0.0) {
                    let _ = write!(out, "  {}", star_rating(rating));
                }
                let _ = writeln!(out);
            }
            for meal in &day.meals {
                let _ = writeln!(
                    out,
                    "  {}: {}",
                    meal.kind,
                    meal.suggestion.as_deref().unwrap_or("Local restaurant")
                );
            }
            if let Some(transportation) = &day.transportation {
                let _ = writeln!(out, "  Transportation: {transportation}");
            }
        }
        out
    }
}

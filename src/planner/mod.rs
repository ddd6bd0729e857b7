//! The trip being planned, owned by whoever drives the session.
//!
//! Every mutation recomputes the derived fields (day count, schedule,
//! budget) wholesale; nothing is updated incrementally.

use log::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    services::{
        geocoding::GeocodingService,
        routing::RoutingService,
        tickets::{
            request_id, CreateTicketRequest, CreateTripRequest, ItineraryDay, SavedTrip, TicketId,
            TicketPayload, TripStorageService, TripSummary,
        },
        Route, Waypoint,
    },
    GenericError, WertigoError,
};

pub mod activity;
pub mod budget;
pub mod destination;
pub mod estimator;

pub use activity::{Activity, ActivityId, NewActivity};
pub use budget::{BudgetBreakdown, BudgetEstimate};
pub use destination::{Budget, Destination, DestinationId};
pub use estimator::{DaySchedule, ScheduleConfig, ScheduledVisit};

/// Route between the trip's geocoded destinations, in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteInfo {
    pub distance_km: f64,
    pub time_min: f64,
    #[serde(default)]
    pub points: Vec<[f64; 2]>,
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TripData {
    pub destination: String,
    pub travelers: u32,
    pub interests: Vec<String>,
    pub travel_dates: Option<String>,
    pub selected_destinations: Vec<Destination>,
    pub route_info: Option<RouteInfo>,
    pub travel_days: u32,
    pub daily_schedule: Vec<DaySchedule>,
    pub auto_routing_enabled: bool,
    pub budget: String,
    pub budget_numeric: Decimal,
    pub budget_breakdown: BudgetBreakdown,
}

impl Default for TripData {
    fn default() -> Self {
        TripData {
            destination: String::new(),
            travelers: 1,
            interests: Vec::new(),
            travel_dates: None,
            selected_destinations: Vec::new(),
            route_info: None,
            travel_days: 1,
            daily_schedule: Vec::new(),
            auto_routing_enabled: true,
            budget: budget::format_peso(Decimal::ZERO),
            budget_numeric: Decimal::ZERO,
            budget_breakdown: BudgetBreakdown::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Added {
    New(DestinationId),
    Duplicate,
}

/// Form input for a destination typed in by hand.
#[derive(Debug, Clone, Default)]
pub struct ManualDestination {
    pub name: String,
    pub city: String,
    pub category: String,
    pub budget: Option<f64>,
    pub notes: Option<String>,
}

/// Manual overrides of the automatic schedule.
#[derive(Debug, Clone, Default)]
pub struct ScheduleOverride {
    pub days: Option<u32>,
    pub destinations_per_day: Option<u32>,
    pub auto_routing: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlannerStats {
    pub days: u32,
    pub destinations: usize,
    pub activities: usize,
    pub total_budget: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItineraryOutcome {
    Created(SavedTrip),
    /// The backend did not recognise the destination and offers these.
    Suggestions(Vec<String>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TripPlanner {
    trip: TripData,
    activities: Vec<Activity>,
    day_tabs: u32,
    itinerary: Vec<ItineraryDay>,
    schedule: ScheduleConfig,
    max_destinations: usize,
    next_id: u64,
}

impl Default for TripPlanner {
    fn default() -> Self {
        TripPlanner::new(20)
    }
}

impl TripPlanner {
    pub fn new(max_destinations: usize) -> Self {
        TripPlanner {
            trip: TripData::default(),
            activities: Vec::new(),
            day_tabs: 1,
            itinerary: Vec::new(),
            schedule: ScheduleConfig::default(),
            max_destinations,
            next_id: 1,
        }
    }

    pub fn trip(&self) -> &TripData {
        &self.trip
    }

    pub fn destinations(&self) -> &[Destination] {
        &self.trip.selected_destinations
    }

    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    pub fn itinerary(&self) -> &[ItineraryDay] {
        &self.itinerary
    }

    pub fn schedule_config(&self) -> &ScheduleConfig {
        &self.schedule
    }

    pub fn set_max_destinations(&mut self, max: usize) {
        self.max_destinations = max;
    }

    pub fn set_travel_dates(&mut self, dates: Option<String>) {
        self.trip.travel_dates = dates;
    }

    pub fn set_travelers(&mut self, travelers: u32) {
        self.trip.travelers = travelers.max(1);
    }

    fn next_id(&mut self, prefix: &str) -> String {
        let id = format!("{prefix}-{}", self.next_id);
        self.next_id += 1;
        id
    }

    /// Adds a destination unless an equal one (see [`Destination::same_as`])
    /// is already planned.
    pub fn add_destination(&mut self, mut destination: Destination) -> Result<Added, WertigoError> {
        if self
            .trip
            .selected_destinations
            .iter()
            .any(|d| d.same_as(&destination))
        {
            debug!("{} is already in the trip planner", destination.name);
            return Ok(Added::Duplicate);
        }
        if self.trip.selected_destinations.len() >= self.max_destinations {
            return Err(WertigoError::TooManyDestinations(self.max_destinations));
        }

        let id = match &destination.id {
            Some(id) => id.clone(),
            None => {
                let id = DestinationId::from(self.next_id("destination"));
                destination.id = Some(id.clone());
                id
            }
        };
        if self.trip.selected_destinations.is_empty() {
            self.trip.destination = if destination.city.trim().is_empty() {
                destination.name.clone()
            } else {
                destination.city.clone()
            };
        }

        info!("Added {} to the trip planner", destination.name);
        self.trip.selected_destinations.push(destination);
        self.invalidate_route();
        self.recompute();
        Ok(Added::New(id))
    }

    pub fn add_manual_destination(&mut self, form: ManualDestination) -> Result<Added, WertigoError> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(WertigoError::validation("Please enter a name for the destination."));
        }
        let mut destination = Destination::new(name, form.city.trim(), form.category.trim());
        destination.budget = form.budget.map(Budget::Amount);
        destination.description = form.notes.filter(|n| !n.trim().is_empty());
        destination.rating = Some(4.0);
        self.add_destination(destination)
    }

    pub fn remove_destination(&mut self, id: &DestinationId) -> Result<Destination, WertigoError> {
        let index = self
            .trip
            .selected_destinations
            .iter()
            .position(|d| d.id.as_ref() == Some(id))
            .ok_or_else(|| WertigoError::NotFound(format!("No destination with id {id}.")))?;
        let removed = self.trip.selected_destinations.remove(index);
        info!("Removed {} from the trip planner", removed.name);
        self.invalidate_route();
        self.recompute();
        Ok(removed)
    }

    pub fn add_day(&mut self) -> u32 {
        self.day_tabs += 1;
        self.day_tabs
    }

    /// Days an activity may be placed on: the planner's day tabs or the
    /// estimated trip length, whichever is longer.
    pub fn day_count(&self) -> u32 {
        self.day_tabs.max(self.trip.travel_days)
    }

    pub fn add_activity(&mut self, form: NewActivity) -> Result<&Activity, WertigoError> {
        if form.name.trim().is_empty() {
            return Err(WertigoError::validation("Please enter a name for the activity."));
        }
        if form.day == 0 || form.day > self.day_count() {
            return Err(WertigoError::validation(format!(
                "Day {} does not exist; the plan has {} day(s).",
                form.day,
                self.day_count()
            )));
        }
        let id = ActivityId::from(self.next_id("activity"));
        self.activities.push(Activity::from_form(id, form));
        let index = self.activities.len() - 1;
        Ok(&self.activities[index])
    }

    pub fn remove_activity(&mut self, id: &ActivityId) -> Result<Activity, WertigoError> {
        let index = self
            .activities
            .iter()
            .position(|a| &a.id == id)
            .ok_or_else(|| WertigoError::NotFound(format!("No activity with id {id}.")))?;
        Ok(self.activities.remove(index))
    }

    /// Looks up coordinates for an activity's location, near the trip's city.
    pub async fn locate_activity<G>(&mut self, id: &ActivityId, geocoder: &G) -> Result<(), GenericError>
    where
        G: GeocodingService + Sync + ?Sized,
    {
        let city = self.trip.destination.clone();
        let activity = self
            .activities
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| WertigoError::NotFound(format!("No activity with id {id}.")))?;
        let Some(location) = activity.location.clone() else {
            return Ok(());
        };
        let query = if city.is_empty() {
            location
        } else {
            format!("{location}, {city}")
        };
        activity.coordinates = Some(geocoder.geocode(&query).await?);
        Ok(())
    }

    pub fn stats(&self) -> PlannerStats {
        PlannerStats {
            days: self.day_count(),
            destinations: self.trip.selected_destinations.len(),
            activities: self.activities.len(),
            total_budget: self.trip.budget_numeric,
        }
    }

    /// Applies manual schedule settings, keeping the chosen day count
    /// instead of re-estimating it.
    /// Nothing changes when any of the settings is rejected.
    pub fn apply_schedule(&mut self, changes: ScheduleOverride) -> Result<(), WertigoError> {
        if changes
            .days
            .is_some_and(|days| days == 0 || days > self.schedule.max_days)
        {
            return Err(WertigoError::validation(format!(
                "Travel days must be between 1 and {}.",
                self.schedule.max_days
            )));
        }
        if changes.destinations_per_day == Some(0) {
            return Err(WertigoError::validation(
                "Destinations per day must be at least 1.",
            ));
        }

        if let Some(days) = changes.days {
            self.trip.travel_days = days;
        }
        if let Some(per_day) = changes.destinations_per_day {
            self.schedule.max_destinations_per_day = per_day;
        }
        if let Some(auto_routing) = changes.auto_routing {
            self.trip.auto_routing_enabled = auto_routing;
        }
        self.regenerate();
        Ok(())
    }

    /// Back to the automatic schedule: default stops per day, auto-routing on.
    pub fn reset_schedule(&mut self) {
        self.schedule.max_destinations_per_day = ScheduleConfig::default().max_destinations_per_day;
        self.trip.auto_routing_enabled = true;
        self.recompute();
    }

    pub fn reset(&mut self) {
        *self = TripPlanner::new(self.max_destinations);
    }

    fn invalidate_route(&mut self) {
        if self.trip.route_info.take().is_some() {
            debug!("Destinations changed, dropping the calculated route");
        }
    }

    fn recompute(&mut self) {
        self.trip.travel_days = estimator::travel_days(
            &self.trip.selected_destinations,
            self.trip.route_info.as_ref(),
            &self.schedule,
        );
        trace!(
            "Calculated {} days for {} destinations",
            self.trip.travel_days,
            self.trip.selected_destinations.len()
        );
        self.regenerate();
    }

    fn regenerate(&mut self) {
        self.trip.daily_schedule = estimator::daily_schedule(
            &self.trip.selected_destinations,
            self.trip.travel_days,
            self.trip.route_info.as_ref(),
            &self.schedule,
        );
        let estimate = budget::estimate(
            &self.trip.selected_destinations,
            self.trip.route_info.as_ref(),
            self.trip.travel_days,
        );
        self.trip.budget = budget::format_peso(estimate.total);
        self.trip.budget_numeric = estimate.total;
        self.trip.budget_breakdown = estimate.breakdown;
    }

    /// Waypoints for every destination that has coordinates.
    pub fn waypoints(&self) -> Vec<Waypoint> {
        self.trip
            .selected_destinations
            .iter()
            .filter_map(|d| {
                d.coordinates().map(|c| Waypoint {
                    name: d.name.clone(),
                    lat: c.lat,
                    lng: c.lng,
                })
            })
            .collect()
    }

    pub fn set_route(&mut self, route: Route, waypoints: Vec<Waypoint>) {
        self.trip.route_info = Some(RouteInfo {
            distance_km: route.distance_km,
            time_min: route.time_min,
            points: route.points,
            waypoints,
        });
        self.recompute();
    }

    /// Routes through the geocoded destinations in the order they were
    /// added. `Ok(None)` when fewer than two have coordinates.
    pub async fn calculate_route<R>(&mut self, router: &R) -> Result<Option<&RouteInfo>, GenericError>
    where
        R: RoutingService + Sync + ?Sized,
    {
        let waypoints = self.waypoints();
        if waypoints.len() < 2 {
            debug!("Need at least 2 destinations with coordinates for auto-routing");
            return Ok(None);
        }
        debug!("Calculating route for {} destinations", waypoints.len());
        let route = router.route(&waypoints).await?;
        self.set_route(route, waypoints);
        Ok(self.trip.route_info.as_ref())
    }

    /// Fills in coordinates for destinations that lack them. Lookups that
    /// fail are logged and skipped. Returns how many were located.
    pub async fn geocode_missing<G>(&mut self, geocoder: &G) -> usize
    where
        G: GeocodingService + Sync + ?Sized,
    {
        let fallback_city = self.trip.destination.clone();
        let mut located = 0;
        for destination in self
            .trip
            .selected_destinations
            .iter_mut()
            .filter(|d| d.coordinates().is_none())
        {
            let query = destination.geocode_query(&fallback_city);
            match geocoder.geocode(&query).await {
                Ok(coords) => {
                    trace!("Geocoded {}: {}, {}", destination.name, coords.lat, coords.lng);
                    destination.set_coordinates(coords);
                    located += 1;
                }
                Err(e) => warn!("Error geocoding {}: {e}", destination.name),
            }
        }
        located
    }

    pub fn trip_request(&self) -> CreateTripRequest {
        let destinations = self.trip.selected_destinations.clone();
        CreateTripRequest {
            destination: self.trip.destination.clone(),
            travelers: self.trip.travelers,
            budget: self.trip.budget.clone(),
            interests: self.trip.interests.clone(),
            selected_destination_data: destinations.first().cloned(),
            all_selected_destinations: destinations,
            request_id: request_id("itinerary"),
        }
    }

    /// Geocodes what it can, asks the backend for an itinerary and keeps it.
    pub async fn create_itinerary<S, G>(
        &mut self,
        storage: &S,
        geocoder: &G,
    ) -> Result<ItineraryOutcome, GenericError>
    where
        S: TripStorageService + Sync + ?Sized,
        G: GeocodingService + Sync + ?Sized,
    {
        if self.trip.selected_destinations.is_empty() {
            return Err(WertigoError::validation(
                "Please select at least one destination for your trip.",
            )
            .into());
        }
        self.geocode_missing(geocoder).await;

        let response = storage.create_trip(&self.trip_request()).await?;
        match response.trip {
            Some(mut trip) => {
                reconcile(&mut trip, &self.trip.selected_destinations);
                self.itinerary = trip.itinerary.clone();
                Ok(ItineraryOutcome::Created(trip))
            }
            None if !response.suggestions.is_empty() => Ok(ItineraryOutcome::Suggestions(
                response.suggestions.iter().map(suggestion_name).collect(),
            )),
            None => Err(WertigoError::Rejected(response.error.unwrap_or_else(|| {
                "I couldn't create an itinerary at this time. Please try again later.".to_string()
            }))
            .into()),
        }
    }

    /// Every destination worth saving: the planned ones plus any place the
    /// itinerary added.
    fn all_destinations(&self) -> Vec<Destination> {
        let mut all = self.trip.selected_destinations.clone();
        for place in self.itinerary.iter().flat_map(|day| day.places.iter()) {
            if !all.iter().any(|d| d.same_as(place)) {
                all.push(place.clone());
            }
        }
        all
    }

    pub fn ticket_request(&self, email: &str) -> Result<CreateTicketRequest, WertigoError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(WertigoError::validation("Please enter a valid email address."));
        }
        let destinations = self.all_destinations();
        if destinations.is_empty() {
            return Err(WertigoError::validation(
                "No destinations to save. Please add at least one destination first.",
            ));
        }

        let mut main_categories: Vec<String> = Vec::new();
        for category in destinations.iter().map(|d| d.category.trim()) {
            if !category.is_empty() && !main_categories.iter().any(|c| c == category) {
                main_categories.push(category.to_string());
            }
        }
        let summary = TripSummary {
            total_destinations: destinations.len(),
            main_categories,
            estimated_duration: format!("{} days", destinations.len().div_ceil(3)),
        };

        Ok(CreateTicketRequest {
            email: email.to_string(),
            itinerary: TicketPayload {
                destination: self.trip.destination.clone(),
                travelers: self.trip.travelers,
                budget: self.trip.budget.clone(),
                budget_numeric: budget::to_number(self.trip.budget_numeric),
                selected_destinations: destinations,
                itinerary: self.itinerary.clone(),
                travel_dates: self.trip.travel_dates.clone(),
                trip_summary: summary,
                route_info: self.trip.route_info.clone(),
            },
            request_id: request_id("ticket"),
        })
    }

    pub async fn save_ticket<S>(&self, storage: &S, email: &str) -> Result<TicketId, GenericError>
    where
        S: TripStorageService + Sync + ?Sized,
    {
        let request = self.ticket_request(email)?;
        debug!(
            "Sending trip data with {} destinations to server",
            request.itinerary.selected_destinations.len()
        );
        storage.create_ticket(&request).await
    }
}

fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !email.contains(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}

fn suggestion_name(suggestion: &Value) -> String {
    match suggestion {
        Value::String(s) => s.clone(),
        Value::Object(map) => map
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| suggestion.to_string()),
        other => other.to_string(),
    }
}

/// Repairs an itinerary returned by the backend against the local plan:
/// a shorter destination list is replaced by ours, and coordinates the
/// backend lost are copied back onto destinations and itinerary places.
pub fn reconcile(trip: &mut SavedTrip, local: &[Destination]) {
    let destinations = match trip.selected_destinations.take() {
        Some(returned) if returned.len() >= local.len() => returned,
        Some(returned) => {
            debug!(
                "Backend dropped destinations ({} of {}), keeping the local list",
                returned.len(),
                local.len()
            );
            local.to_vec()
        }
        None => local.to_vec(),
    };
    let destinations = destinations
        .into_iter()
        .map(|mut dest| {
            if dest.coordinates().is_none() {
                if let Some(coords) = local
                    .iter()
                    .find(|l| l.same_as(&dest))
                    .and_then(Destination::coordinates)
                {
                    dest.set_coordinates(coords);
                }
            }
            dest
        })
        .collect();
    trip.selected_destinations = Some(destinations);

    for place in trip.itinerary.iter_mut().flat_map(|day| day.places.iter_mut()) {
        if place.coordinates().is_some() {
            continue;
        }
        if let Some(coords) = local
            .iter()
            .find(|l| l.same_as(place))
            .and_then(Destination::coordinates)
        {
            place.set_coordinates(coords);
        }
    }
}

#[cfg(test)]
mod tests;

use super::*;
use crate::services::{
    testing::FakeBackend,
    tickets::{CreateTripResponse, ItineraryDay},
};
use serde_json::json;

fn rizal_park() -> Destination {
    Destination::new("Rizal Park", "Manila", "park").with_id("101")
}

fn intramuros() -> Destination {
    Destination::new("Intramuros", "Manila", "historical site")
        .with_id("102")
        .with_coordinates(14.5896, 120.9747)
}

fn bgc() -> Destination {
    Destination::new("Bonifacio High Street", "Taguig", "shopping")
        .with_id("103")
        .with_coordinates(14.5509, 121.0509)
}

#[test]
fn adding_the_same_id_twice_is_a_no_op() {
    let mut planner = TripPlanner::default();
    assert_eq!(
        planner.add_destination(rizal_park()).unwrap(),
        Added::New(DestinationId::from("101"))
    );
    let renamed = Destination::new("Luneta Park", "Manila", "park").with_id("101");
    assert_eq!(planner.add_destination(renamed).unwrap(), Added::Duplicate);
    assert_eq!(planner.destinations().len(), 1);
}

#[test]
fn destinations_without_ids_dedupe_by_name_and_city() {
    let mut planner = TripPlanner::default();
    planner
        .add_destination(Destination::new("Jollibee", "Manila", "restaurant"))
        .unwrap();
    let again = planner
        .add_destination(Destination::new("JOLLIBEE", "manila", "restaurant"))
        .unwrap();
    assert_eq!(again, Added::Duplicate);
    planner
        .add_destination(Destination::new("Jollibee", "Cebu", "restaurant"))
        .unwrap();
    assert_eq!(planner.destinations().len(), 2);
    assert!(planner.destinations().iter().all(|d| d.id.is_some()));
}

#[test]
fn first_destination_names_the_trip() {
    let mut planner = TripPlanner::default();
    planner.add_destination(bgc()).unwrap();
    planner.add_destination(rizal_park()).unwrap();
    assert_eq!(planner.trip().destination, "Taguig");
}

#[test]
fn every_mutation_recomputes_days_schedule_and_budget() {
    let mut planner = TripPlanner::default();
    for i in 0..4 {
        planner
            .add_destination(Destination::new(format!("Stop {i}"), "Manila", "landmark"))
            .unwrap();
    }
    let trip = planner.trip();
    assert_eq!(trip.travel_days, 2);
    assert_eq!(trip.daily_schedule.len(), 2);
    // 4 x 1000 default plus 10% transport plus one extra day.
    assert_eq!(trip.budget_numeric, Decimal::from(4600));
    assert_eq!(trip.budget, "₱4,600");

    let id = planner.destinations()[0].id.clone().unwrap();
    planner.remove_destination(&id).unwrap();
    assert_eq!(planner.trip().travel_days, 1);
    assert_eq!(planner.trip().budget_numeric, Decimal::from(3300));
}

#[test]
fn destination_cap_is_enforced() {
    let mut planner = TripPlanner::new(2);
    planner.add_destination(rizal_park()).unwrap();
    planner.add_destination(intramuros()).unwrap();
    let err = planner.add_destination(bgc()).unwrap_err();
    assert!(matches!(err, WertigoError::TooManyDestinations(2)));
}

#[test]
fn manual_destinations_need_a_name() {
    let mut planner = TripPlanner::default();
    let err = planner
        .add_manual_destination(ManualDestination::default())
        .unwrap_err();
    assert!(matches!(err, WertigoError::Validation(_)));

    let added = planner
        .add_manual_destination(ManualDestination {
            name: "Manila Bay sunset".to_string(),
            city: "Manila".to_string(),
            category: "natural attraction".to_string(),
            budget: Some(0.0),
            notes: Some("bring a camera".to_string()),
        })
        .unwrap();
    assert_eq!(added, Added::New(DestinationId::from("destination-1")));
    assert_eq!(planner.destinations()[0].rating, Some(4.0));
}

#[test]
fn removing_unknown_destination_is_not_found() {
    let mut planner = TripPlanner::default();
    let err = planner
        .remove_destination(&DestinationId::from("nope"))
        .unwrap_err();
    assert!(matches!(err, WertigoError::NotFound(_)));
}

#[test]
fn activities_are_validated_and_counted() {
    let mut planner = TripPlanner::default();
    assert!(planner
        .add_activity(NewActivity {
            day: 1,
            ..NewActivity::default()
        })
        .is_err());
    assert!(planner
        .add_activity(NewActivity {
            day: 2,
            name: "Food crawl".to_string(),
            ..NewActivity::default()
        })
        .is_err());

    assert_eq!(planner.add_day(), 2);
    let id = planner
        .add_activity(NewActivity {
            day: 2,
            name: "Food crawl".to_string(),
            time: Some(" ".to_string()),
            ..NewActivity::default()
        })
        .unwrap()
        .id
        .clone();
    assert_eq!(planner.activities()[0].display_time(), "Any time");
    assert_eq!(planner.stats().activities, 1);
    assert_eq!(planner.stats().days, 2);

    planner.remove_activity(&id).unwrap();
    assert!(planner.activities().is_empty());
}

#[tokio::test]
async fn activity_locations_are_geocoded_near_the_trip_city() {
    let backend = FakeBackend::default().with_place("Binondo, Manila", 14.6, 120.97);
    let mut planner = TripPlanner::default();
    planner.add_destination(rizal_park()).unwrap();
    let id = planner
        .add_activity(NewActivity {
            day: 1,
            name: "Dim sum".to_string(),
            location: Some("Binondo".to_string()),
            ..NewActivity::default()
        })
        .unwrap()
        .id
        .clone();
    planner.locate_activity(&id, &backend).await.unwrap();
    assert!(planner.activities()[0].coordinates.is_some());
}

#[test]
fn manual_schedule_keeps_chosen_days_until_reset() {
    let mut planner = TripPlanner::default();
    for i in 0..3 {
        planner
            .add_destination(Destination::new(format!("Stop {i}"), "Manila", "landmark"))
            .unwrap();
    }
    planner
        .apply_schedule(ScheduleOverride {
            days: Some(3),
            destinations_per_day: Some(1),
            auto_routing: Some(false),
        })
        .unwrap();
    assert_eq!(planner.trip().travel_days, 3);
    assert_eq!(planner.trip().daily_schedule.len(), 3);
    assert!(!planner.trip().auto_routing_enabled);

    assert!(planner
        .apply_schedule(ScheduleOverride {
            days: Some(0),
            ..ScheduleOverride::default()
        })
        .is_err());
    assert!(planner
        .apply_schedule(ScheduleOverride {
            days: Some(2),
            destinations_per_day: Some(0),
            auto_routing: Some(true),
        })
        .is_err());
    assert_eq!(planner.trip().travel_days, 3);
    assert_eq!(planner.trip().daily_schedule.len(), 3);
    assert_eq!(planner.schedule_config().max_destinations_per_day, 1);
    assert!(!planner.trip().auto_routing_enabled);

    planner.reset_schedule();
    assert_eq!(planner.trip().travel_days, 1);
    assert_eq!(planner.schedule_config().max_destinations_per_day, 3);
    assert!(planner.trip().auto_routing_enabled);
}

#[test]
fn reset_clears_everything() {
    let mut planner = TripPlanner::new(5);
    planner.add_destination(rizal_park()).unwrap();
    planner.add_day();
    planner.reset();
    assert!(planner.destinations().is_empty());
    assert_eq!(planner.stats().days, 1);
    assert_eq!(planner.trip().budget, "₱0");
}

#[tokio::test]
async fn route_needs_two_geocoded_destinations() {
    let backend = FakeBackend::default().with_route(12.0, 40.0);
    let mut planner = TripPlanner::default();
    planner.add_destination(rizal_park()).unwrap();
    planner.add_destination(intramuros()).unwrap();
    assert!(planner.calculate_route(&backend).await.unwrap().is_none());
    assert!(backend.route_calls.lock().unwrap().is_empty());

    planner.add_destination(bgc()).unwrap();
    let route = planner.calculate_route(&backend).await.unwrap().unwrap();
    assert_eq!(route.distance_km, 12.0);
    let calls = backend.route_calls.lock().unwrap();
    assert_eq!(calls[0].len(), 2);
    assert_eq!(calls[0][0].name, "Intramuros");
}

#[tokio::test]
async fn long_routes_lengthen_the_trip_and_changes_drop_them() {
    let backend = FakeBackend::default().with_route(300.0, 600.0);
    let mut planner = TripPlanner::default();
    planner.add_destination(intramuros()).unwrap();
    planner.add_destination(bgc()).unwrap();
    assert_eq!(planner.trip().travel_days, 1);

    planner.calculate_route(&backend).await.unwrap();
    // Ten hours of driving is more than a day's limit.
    assert_eq!(planner.trip().travel_days, 2);
    assert_eq!(planner.trip().budget_breakdown.transportation, Decimal::from(1700));

    planner.add_destination(rizal_park()).unwrap();
    assert!(planner.trip().route_info.is_none());
}

#[tokio::test]
async fn geocoding_failures_are_skipped() {
    let backend = FakeBackend::default().with_place("Rizal Park, Manila", 14.58, 120.98);
    let mut planner = TripPlanner::default();
    planner.add_destination(rizal_park()).unwrap();
    planner
        .add_destination(Destination::new("Nowhere", "", "landmark"))
        .unwrap();

    assert_eq!(planner.geocode_missing(&backend).await, 1);
    assert!(planner.destinations()[0].coordinates().is_some());
    assert!(planner.destinations()[1].coordinates().is_none());
    assert_eq!(
        *backend.geocode_calls.lock().unwrap(),
        vec!["Rizal Park, Manila".to_string(), "Nowhere, Manila".to_string()]
    );
}

#[tokio::test]
async fn zero_coordinates_are_geocoded_and_kept_off_the_route() {
    let binondo: Destination = serde_json::from_value(json!({
        "id": 7, "name": "Binondo", "city": "Manila", "category": "food",
        "latitude": 0, "longitude": 0
    }))
    .unwrap();
    let backend = FakeBackend::default().with_route(3.0, 15.0);
    let mut planner = TripPlanner::default();
    planner.add_destination(intramuros()).unwrap();
    planner.add_destination(binondo).unwrap();

    assert!(planner.calculate_route(&backend).await.unwrap().is_none());
    assert!(backend.route_calls.lock().unwrap().is_empty());

    let backend = backend.with_place("Binondo, Manila", 14.6, 120.97);
    assert_eq!(planner.geocode_missing(&backend).await, 1);
    assert_eq!(
        *backend.geocode_calls.lock().unwrap(),
        vec!["Binondo, Manila".to_string()]
    );

    planner.calculate_route(&backend).await.unwrap().unwrap();
    let calls = backend.route_calls.lock().unwrap();
    assert_eq!(calls[0].len(), 2);
    assert!(calls[0].iter().all(|w| w.lat != 0.0 && w.lng != 0.0));
}

#[tokio::test]
async fn itinerary_restores_dropped_destinations_and_coordinates() {
    let returned: SavedTrip = serde_json::from_value(json!({
        "destination": "Manila",
        "selected_destinations": [{"id": 102, "name": "Intramuros"}],
        "itinerary": [{"day": 1, "places": [
            {"name": "Intramuros", "city": "Manila"},
            {"name": "Bonifacio High Street", "city": "Taguig"},
            {"name": "Bonifacio High Street", "city": "Cebu"}
        ]}]
    }))
    .unwrap();
    let backend = FakeBackend {
        trip_response: Some(CreateTripResponse {
            trip: Some(returned),
            ..CreateTripResponse::default()
        }),
        ..FakeBackend::default()
    };

    let mut planner = TripPlanner::default();
    planner.add_destination(intramuros()).unwrap();
    planner.add_destination(bgc()).unwrap();

    let outcome = planner.create_itinerary(&backend, &backend).await.unwrap();
    let ItineraryOutcome::Created(trip) = outcome else {
        panic!("expected an itinerary");
    };
    let destinations = trip.selected_destinations.unwrap();
    assert_eq!(destinations.len(), 2);
    let places = &trip.itinerary[0].places;
    assert!(places[0].coordinates().is_some());
    assert!(places[1].coordinates().is_some());
    // Same name in another city is a different place.
    assert!(places[2].coordinates().is_none());
    assert_eq!(planner.itinerary().len(), 1);

    let requests = backend.trip_requests.lock().unwrap();
    let request = &requests[0];
    assert_eq!(request.all_selected_destinations.len(), 2);
    assert_eq!(request.selected_destination_data.as_ref().unwrap().name, "Intramuros");
    assert!(request.request_id.starts_with("itinerary_"));
}

#[tokio::test]
async fn unknown_destination_returns_suggestions() {
    let backend = FakeBackend {
        trip_response: Some(CreateTripResponse {
            trip: None,
            error: Some("Destination not found".to_string()),
            suggestions: vec![json!("Manila"), json!({"name": "Makati"})],
        }),
        ..FakeBackend::default()
    };
    let mut planner = TripPlanner::default();
    planner.add_destination(intramuros()).unwrap();
    let outcome = planner.create_itinerary(&backend, &backend).await.unwrap();
    assert_eq!(
        outcome,
        ItineraryOutcome::Suggestions(vec!["Manila".to_string(), "Makati".to_string()])
    );
}

#[tokio::test]
async fn empty_trip_cannot_become_an_itinerary() {
    let backend = FakeBackend::default();
    let mut planner = TripPlanner::default();
    assert!(planner.create_itinerary(&backend, &backend).await.is_err());
    assert!(backend.trip_requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn ticket_carries_summary_and_itinerary_places() {
    let backend = FakeBackend::default();
    let mut planner = TripPlanner::default();
    planner.add_destination(intramuros()).unwrap();
    planner.add_destination(rizal_park()).unwrap();
    planner.itinerary = vec![ItineraryDay {
        day: 1,
        places: vec![
            Destination::new("Intramuros", "Manila", "historical site"),
            Destination::new("Manila Cathedral", "Manila", "religious site"),
        ],
        meals: Vec::new(),
        transportation: None,
        estimated_cost: None,
    }];

    assert!(planner.save_ticket(&backend, "not-an-email").await.is_err());
    let id = planner.save_ticket(&backend, " traveller@example.com ").await.unwrap();
    assert_eq!(id.as_str(), "WT-0001");

    let requests = backend.ticket_requests.lock().unwrap();
    let payload = &requests[0].itinerary;
    assert_eq!(requests[0].email, "traveller@example.com");
    assert_eq!(payload.selected_destinations.len(), 3);
    assert_eq!(payload.trip_summary.total_destinations, 3);
    assert_eq!(payload.trip_summary.estimated_duration, "1 days");
    assert_eq!(
        payload.trip_summary.main_categories,
        vec!["historical site", "park", "religious site"]
    );
    assert_eq!(payload.itinerary.len(), 1);
}

#[test]
fn email_validation() {
    assert!(is_valid_email("a@b.co"));
    assert!(!is_valid_email("a@b"));
    assert!(!is_valid_email("@b.co"));
    assert!(!is_valid_email("a b@c.co"));
    assert!(!is_valid_email(""));
}

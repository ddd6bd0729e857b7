//! Day count and daily schedule heuristics.

use serde::{Deserialize, Serialize};

use super::{Destination, RouteInfo};

/// Categories whose visits tend to eat most of a day.
pub const TIME_INTENSIVE_CATEGORIES: [&str; 5] = ["museum", "theme park", "zoo", "resort", "beach"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub max_destinations_per_day: u32,
    /// Average minutes between stops above which the trip is spread thinner.
    pub travel_time_threshold: f64,
    pub activity_time_per_destination: f64,
    /// Hours of driving a single day can absorb.
    pub daily_travel_limit: f64,
    pub rest_time_between_destinations: f64,
    /// Leg time assumed when no route has been calculated.
    pub default_travel_time: f64,
    /// Minutes after midnight the first visit starts.
    pub day_start: f64,
    pub max_days: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            max_destinations_per_day: 3,
            travel_time_threshold: 120.0,
            activity_time_per_destination: 90.0,
            daily_travel_limit: 8.0,
            rest_time_between_destinations: 30.0,
            default_travel_time: 30.0,
            day_start: 9.0 * 60.0,
            max_days: 14,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledVisit {
    pub destination: Destination,
    pub start_time: String,
    pub end_time: String,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub day: u32,
    #[serde(default)]
    pub date: Option<String>,
    pub destinations: Vec<Destination>,
    pub schedule: Vec<ScheduledVisit>,
    /// Minutes from the day's start to the end of its last visit.
    pub total_travel_time: f64,
}

fn is_time_intensive(destination: &Destination) -> bool {
    let category = destination.category.to_lowercase();
    TIME_INTENSIVE_CATEGORIES
        .iter()
        .any(|keyword| category.contains(keyword))
}

/// Average minutes spent driving between consecutive stops.
fn average_leg_time(route: &RouteInfo, count: usize) -> f64 {
    route.time_min / count.saturating_sub(1).max(1) as f64
}

/// Number of days the trip needs, clamped to `1..=max_days`.
pub fn travel_days(
    destinations: &[Destination],
    route: Option<&RouteInfo>,
    config: &ScheduleConfig,
) -> u32 {
    let count = destinations.len();
    if count == 0 {
        return 1;
    }

    let per_day = config.max_destinations_per_day.max(1) as usize;
    let half = count.div_ceil(2);
    let mut days = count.div_ceil(per_day);

    if let Some(route) = route {
        let total_hours = route.time_min / 60.0;
        if total_hours > config.daily_travel_limit {
            days += (total_hours / config.daily_travel_limit).ceil() as usize - 1;
        }
        if average_leg_time(route, count) > config.travel_time_threshold {
            days = days.max(half);
        }
    }

    let intensive = destinations.iter().filter(|d| is_time_intensive(d)).count();
    if intensive * 2 > count {
        days = days.max(half);
    }

    (days as u32).clamp(1, config.max_days.max(1))
}

/// Spreads destinations over `days` in order and assigns visit slots.
pub fn daily_schedule(
    destinations: &[Destination],
    days: u32,
    route: Option<&RouteInfo>,
    config: &ScheduleConfig,
) -> Vec<DaySchedule> {
    if destinations.is_empty() {
        return Vec::new();
    }

    let count = destinations.len();
    let per_day = count.div_ceil(days.max(1) as usize);
    let leg_time = route
        .map(|r| average_leg_time(r, count))
        .unwrap_or(config.default_travel_time);

    destinations
        .chunks(per_day)
        .zip(1..=days.max(1))
        .map(|(day_destinations, day)| {
            let mut clock = config.day_start;
            let schedule = day_destinations
                .iter()
                .enumerate()
                .map(|(index, destination)| {
                    if index > 0 {
                        clock += config.rest_time_between_destinations + leg_time;
                    }
                    let start_time = format_time(clock);
                    clock += config.activity_time_per_destination;
                    ScheduledVisit {
                        destination: destination.clone(),
                        start_time,
                        end_time: format_time(clock),
                        duration: config.activity_time_per_destination,
                    }
                })
                .collect();
            DaySchedule {
                day,
                date: None,
                destinations: day_destinations.to_vec(),
                schedule,
                total_travel_time: clock - config.day_start,
            }
        })
        .collect()
}

/// `HH:MM` for a minute-of-day value.
pub fn format_time(minutes: f64) -> String {
    let total = minutes.round().max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

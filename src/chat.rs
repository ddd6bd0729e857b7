//! Recommendation chat: help detection, backend queries with friendly
//! fallbacks, and plain-text rendering of the results.

use std::{fmt::Write, sync::OnceLock};

use log::*;
use regex::Regex;

use crate::{
    planner::{budget, Added, Destination},
    services::{
        recommend::{RecommendRequest, RecommendResponse, RecommendationService},
        session::SessionId,
    },
    store::AppState,
    tracker::star_rating,
    WertigoError,
};

const HELP_COMMANDS: [&str; 6] = ["help", "/help", "help me", "how to", "instructions", "guide"];

pub const TIMEOUT_REPLY: &str =
    "I'm taking a bit longer than usual to process that. Let me try again with a simpler approach.";
pub const FAILURE_REPLY: &str =
    "I'm having a little trouble with that request. Could you try asking in a different way?";
pub const NO_RESULTS_REPLY: &str =
    "I couldn't find any places matching your request. Could you try a different search?";

const DESCRIPTION_PREVIEW: usize = 120;

fn help_pattern() -> &'static Regex {
    static HELP: OnceLock<Regex> = OnceLock::new();
    HELP.get_or_init(|| {
        Regex::new(r"(?i)how (do|to|can) i (use|create|plan|find|save|get|retrieve|make|start|add|view)")
            .expect("help pattern is valid")
    })
}

pub fn is_help_command(message: &str) -> bool {
    let message = message.trim().to_lowercase();
    HELP_COMMANDS.contains(&message.as_str()) || help_pattern().is_match(&message)
}

pub fn help_text() -> &'static str {
    "WerTigo travel assistant

Finding destinations:
  wertigo chat \"Show me beaches in Boracay\"
  wertigo chat \"Historical sites in Manila\"
  wertigo chat --rating 4 \"Top-rated resorts in Palawan\"

Planning a trip:
  wertigo add --pick 2          add the second place from the last answer
  wertigo add --name \"...\"      add a place by hand
  wertigo activity add ...      plan an activity on a day
  wertigo route                 calculate the route between your stops
  wertigo show                  days, schedule and budget
  wertigo itinerary             ask for a full itinerary
  wertigo ticket you@mail.com   save the trip and get a ticket id

Retrieving a trip:
  wertigo track <ticket-id>
  wertigo tickets you@mail.com"
}

#[derive(Debug, Clone)]
pub enum ChatReply {
    Help,
    /// Small talk, backend notices, and fallbacks after failures.
    Message(String),
    Recommendations(RecommendResponse),
    NoResults,
}

/// One conversation with the recommendation backend.
pub struct Chat<'a, R: ?Sized> {
    service: &'a R,
    session: Option<SessionId>,
    limit: u32,
}

impl<'a, R> Chat<'a, R>
where
    R: RecommendationService + Sync + ?Sized,
{
    pub fn new(service: &'a R, session: Option<SessionId>, limit: u32) -> Self {
        Chat {
            service,
            session,
            limit,
        }
    }

    /// Answers a message. Backend failures never escape; they turn into an
    /// apologetic reply and a log line.
    pub async fn ask(&self, message: &str, rating: Option<u8>) -> ChatReply {
        let message = message.trim();
        if is_help_command(message) {
            return ChatReply::Help;
        }

        let request = RecommendRequest {
            query: message.to_string(),
            session_id: self.session.clone(),
            limit: self.limit,
            rating,
        };
        match self.service.recommend(&request).await {
            Ok(response) => classify(response),
            Err(e) if WertigoError::is_timeout(&e) => {
                warn!("Recommendation request timed out: {e}");
                ChatReply::Message(TIMEOUT_REPLY.to_string())
            }
            Err(e) => {
                warn!("Error getting recommendations: {e}");
                ChatReply::Message(FAILURE_REPLY.to_string())
            }
        }
    }
}

fn classify(response: RecommendResponse) -> ChatReply {
    if response.is_conversation {
        return match response.message {
            Some(message) => ChatReply::Message(message),
            None => ChatReply::NoResults,
        };
    }
    if response.recommendations.is_empty() {
        return match response.error {
            Some(error) => ChatReply::Message(error),
            None => ChatReply::NoResults,
        };
    }
    ChatReply::Recommendations(response)
}

impl ChatReply {
    /// Keeps the recommendations of this reply so they can be picked later.
    pub fn remember(&self, state: &mut AppState) {
        if let ChatReply::Recommendations(response) = self {
            state.current_recommendations = response.recommendations.clone();
        }
    }

    pub fn render(&self) -> String {
        match self {
            ChatReply::Help => help_text().to_string(),
            ChatReply::Message(message) => message.clone(),
            ChatReply::NoResults => NO_RESULTS_REPLY.to_string(),
            ChatReply::Recommendations(response) => render_recommendations(response),
        }
    }
}

fn location_header(response: &RecommendResponse) -> Option<String> {
    match (&response.detected_city, &response.detected_category) {
        (Some(city), Some(category)) => Some(format!("Places in {city} - {category}")),
        (Some(city), None) => Some(format!("Places in {city}")),
        (None, Some(category)) => Some(format!("{category} places")),
        (None, None) => None,
    }
}

fn preview(description: &str) -> String {
    let mut chars = description.chars();
    let head: String = chars.by_ref().take(DESCRIPTION_PREVIEW).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

fn render_recommendations(response: &RecommendResponse) -> String {
    let mut out = String::new();
    if let Some(header) = location_header(response) {
        let _ = writeln!(out, "{header}");
    }
    let _ = writeln!(out, "Here are some amazing places I found for you:");

    for (index, place) in response.recommendations.iter().enumerate() {
        let rating = place.rating.unwrap_or(4.0).round().clamp(1.0, 5.0);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}. {}  {}", index + 1, place.name, star_rating(rating));
        let mut location = place.city.clone();
        if let Some(province) = place.province.as_deref().filter(|p| !p.is_empty()) {
            let _ = write!(location, ", {province}");
        }
        let _ = writeln!(out, "   {location} | {}", place.category);
        if let Some(description) = place.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(out, "   {}", preview(description));
        }
        if let Some(budget) = place.budget.as_ref().filter(|b| !b.is_blank()) {
            let _ = writeln!(out, "   Budget: {}", budget::format_budget(Some(budget)));
        }
    }
    let _ = write!(out, "\nAdd one to your trip with `wertigo add --pick <number>`.");
    out
}

/// Moves the `pick`th (1-based) remembered recommendation into the planner.
pub fn add_pick(state: &mut AppState, pick: usize) -> Result<(Destination, Added), WertigoError> {
    let destination = pick
        .checked_sub(1)
        .and_then(|index| state.current_recommendations.get(index))
        .cloned()
        .ok_or_else(|| {
            WertigoError::validation(format!(
                "There is no recommendation number {pick}; the last answer had {}.",
                state.current_recommendations.len()
            ))
        })?;
    let added = state.planner.add_destination(destination.clone())?;
    Ok((destination, added))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{planner::Budget, services::testing::FakeBackend, GenericError};

    fn timeout() -> GenericError {
        WertigoError::Timeout().into()
    }

    fn refused() -> GenericError {
        WertigoError::Api {
            status: 500,
            message: "boom".to_string(),
        }
        .into()
    }

    fn answer() -> RecommendResponse {
        RecommendResponse {
            recommendations: vec![
                Destination::new("Fort Santiago", "Manila", "historical site").with_id("11"),
                Destination::new("Manila Ocean Park", "Manila", "zoo")
                    .with_id("12")
                    .with_budget(Budget::Label("₱1,200".to_string())),
            ],
            detected_city: Some("Manila".to_string()),
            ..RecommendResponse::default()
        }
    }

    #[test]
    fn help_commands_are_recognised() {
        assert!(is_help_command("help"));
        assert!(is_help_command("  /HELP "));
        assert!(is_help_command("Guide"));
        assert!(is_help_command("How do I save my trip?"));
        assert!(is_help_command("so how can i plan a weekend"));
        assert!(!is_help_command("beaches in Boracay"));
        assert!(!is_help_command("help me find a beach"));
    }

    #[tokio::test]
    async fn help_never_reaches_the_backend() {
        let backend = FakeBackend::default();
        let reply = Chat::new(&backend, None, 5).ask("help", None).await;
        assert!(matches!(reply, ChatReply::Help));
        assert!(backend.recommend_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn request_carries_session_limit_and_rating() {
        let backend = FakeBackend {
            recommendation: Some(answer()),
            ..FakeBackend::default()
        };
        let session = Some(SessionId::from("s-9".to_string()));
        let reply = Chat::new(&backend, session, 3).ask(" museums ", Some(4)).await;
        assert!(matches!(reply, ChatReply::Recommendations(_)));

        let calls = backend.recommend_calls.lock().unwrap();
        assert_eq!(calls[0].query, "museums");
        assert_eq!(calls[0].limit, 3);
        assert_eq!(calls[0].rating, Some(4));
        assert_eq!(calls[0].session_id.as_ref().unwrap().as_str(), "s-9");
    }

    #[tokio::test]
    async fn failures_become_friendly_messages() {
        let backend = FakeBackend {
            recommend_error: Some(timeout),
            ..FakeBackend::default()
        };
        let reply = Chat::new(&backend, None, 5).ask("beaches", None).await;
        assert_eq!(reply.render(), TIMEOUT_REPLY);

        let backend = FakeBackend {
            recommend_error: Some(refused),
            ..FakeBackend::default()
        };
        let reply = Chat::new(&backend, None, 5).ask("beaches", None).await;
        assert_eq!(reply.render(), FAILURE_REPLY);
    }

    #[tokio::test]
    async fn conversation_and_empty_answers() {
        let backend = FakeBackend {
            recommendation: Some(RecommendResponse::conversation("Hello there!")),
            ..FakeBackend::default()
        };
        let reply = Chat::new(&backend, None, 5).ask("hi", None).await;
        assert_eq!(reply.render(), "Hello there!");

        let backend = FakeBackend::default();
        let reply = Chat::new(&backend, None, 5).ask("volcanoes on the moon", None).await;
        assert_eq!(reply.render(), NO_RESULTS_REPLY);
    }

    #[test]
    fn rendering_lists_places_with_numbers() {
        let text = ChatReply::Recommendations(answer()).render();
        assert!(text.starts_with("Places in Manila\n"));
        assert!(text.contains("1. Fort Santiago  ★★★★☆"));
        assert!(text.contains("2. Manila Ocean Park"));
        assert!(text.contains("Budget: ₱1,200"));
    }

    #[test]
    fn long_descriptions_are_shortened() {
        assert_eq!(preview("short"), "short");
        let long = "a".repeat(130);
        assert_eq!(preview(&long), format!("{}...", "a".repeat(120)));
    }

    #[test]
    fn picked_recommendation_joins_the_plan_once() {
        let mut state = AppState::default();
        ChatReply::Recommendations(answer()).remember(&mut state);
        assert_eq!(state.current_recommendations.len(), 2);

        let (destination, added) = add_pick(&mut state, 2).unwrap();
        assert_eq!(destination.name, "Manila Ocean Park");
        assert!(matches!(added, Added::New(_)));
        let (_, again) = add_pick(&mut state, 2).unwrap();
        assert_eq!(again, Added::Duplicate);

        assert!(add_pick(&mut state, 0).is_err());
        assert!(add_pick(&mut state, 3).is_err());
        assert_eq!(state.planner.destinations().len(), 1);
    }
}

//! Client for the WerTigo travel planner.
//!
//! The backend (recommendations, geocoding, routing, trip and ticket storage)
//! lives behind the service traits in [`services`]. Everything on this side
//! of the wire is plain data owned by the caller: the trip planner state and
//! its estimator, the chat, the ticket tracker and the map view.

use thiserror::Error;

pub mod chat;
pub mod commands;
pub mod config;
pub mod map;
pub mod planner;
pub mod services;
pub mod store;
pub mod tracker;

pub type GenericError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum WertigoError {
    #[error("{0}")]
    Validation(String),
    #[error("Location not found.")]
    LocationNotFound(),
    #[error("{0}")]
    NotFound(String),
    #[error("{message}")]
    Api { status: u16, message: String },
    #[error("{0}")]
    Rejected(String),
    #[error("Request timed out.")]
    Timeout(),
    #[error("Your trip already holds the maximum of {0} destinations.")]
    TooManyDestinations(usize),
}

impl WertigoError {
    pub fn validation(message: impl Into<String>) -> Self {
        WertigoError::Validation(message.into())
    }

    /// True when `err` is (or wraps) a request timeout.
    pub fn is_timeout(err: &GenericError) -> bool {
        matches!(err.downcast_ref::<WertigoError>(), Some(WertigoError::Timeout()))
    }
}

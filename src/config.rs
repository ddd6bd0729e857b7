use std::{fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use log::{info, warn};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// Runtime settings, read from the environment (and `.env` through dotenv).
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub state_dir: PathBuf,
    pub request_timeout: Duration,
    pub chat_timeout: Duration,
    pub session_validate_timeout: Duration,
    pub session_create_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub recommendation_limit: u32,
    pub max_destinations: usize,
    pub google_maps_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: DEFAULT_API_URL.to_string(),
            state_dir: PathBuf::from(".wertigo"),
            request_timeout: Duration::from_millis(10_000),
            chat_timeout: Duration::from_millis(20_000),
            session_validate_timeout: Duration::from_millis(5_000),
            session_create_timeout: Duration::from_millis(10_000),
            retry_attempts: 2,
            retry_delay: Duration::from_millis(1_000),
            recommendation_limit: 5,
            max_destinations: 20,
            google_maps_token: None,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let defaults = Config::default();
        Config {
            api_base_url: try_load("WERTIGO_API_URL", DEFAULT_API_URL),
            state_dir: PathBuf::from(try_load::<String>("WERTIGO_STATE_DIR", ".wertigo")),
            request_timeout: Duration::from_millis(try_load("WERTIGO_TIMEOUT_MS", "10000")),
            chat_timeout: Duration::from_millis(try_load("WERTIGO_CHAT_TIMEOUT_MS", "20000")),
            retry_attempts: try_load("WERTIGO_RETRY_ATTEMPTS", "2"),
            recommendation_limit: try_load("WERTIGO_RECOMMENDATION_LIMIT", "5"),
            google_maps_token: dotenv::var("GOOGLE_MAPS_TOKEN").ok(),
            ..defaults
        }
    }

    /// Joins `endpoint` onto the base URL, adding the separating slash if
    /// the endpoint lacks one.
    pub fn api_url(&self, endpoint: &str) -> String {
        let base = self.api_base_url.trim_end_matches('/');
        if endpoint.starts_with('/') {
            format!("{base}{endpoint}")
        } else {
            format!("{base}/{endpoint}")
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = dotenv::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            match default.parse() {
                Ok(value) => value,
                Err(_) => unreachable!("default for {key} must parse"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_joins_with_single_slash() {
        let config = Config {
            api_base_url: "http://localhost:5000/api/".to_string(),
            ..Config::default()
        };
        assert_eq!(config.api_url("/recommend"), "http://localhost:5000/api/recommend");
        assert_eq!(config.api_url("route"), "http://localhost:5000/api/route");
    }

    #[test]
    fn defaults_match_client_settings() {
        let config = Config::default();
        assert_eq!(config.retry_attempts, 2);
        assert_eq!(config.chat_timeout, Duration::from_secs(20));
        assert_eq!(config.max_destinations, 20);
    }
}

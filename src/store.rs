use std::path::{Path, PathBuf};

use log::*;
use serde::{Deserialize, Serialize};

use crate::{planner::Destination, planner::TripPlanner, services::session::SessionId, GenericError};

const SESSION_FILE: &str = "session.json";
const STATE_FILE: &str = "trip.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionState {
    session_id: Option<SessionId>,
}

/// Session id persisted between runs.
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        SessionStore {
            path: state_dir.as_ref().join(SESSION_FILE),
        }
    }

    /// A missing or unreadable file means there is no session yet.
    pub async fn load(&self) -> Option<SessionId> {
        let raw = tokio::fs::read_to_string(&self.path).await.ok()?;
        match serde_json::from_str::<SessionState>(&raw) {
            Ok(state) => state.session_id,
            Err(e) => {
                warn!("Error parsing saved session: {e}");
                None
            }
        }
    }

    pub async fn save(&self, id: &SessionId) -> Result<(), GenericError> {
        let state = SessionState {
            session_id: Some(id.clone()),
        };
        write_json(&self.path, &state).await
    }
}

/// Everything a planning session carries between commands.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AppState {
    #[serde(default)]
    pub planner: TripPlanner,
    /// Results of the last chat query, so one can be added by position.
    #[serde(default)]
    pub current_recommendations: Vec<Destination>,
}

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(state_dir: impl AsRef<Path>) -> Self {
        StateStore {
            path: state_dir.as_ref().join(STATE_FILE),
        }
    }

    pub async fn load(&self) -> Result<AppState, GenericError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!("No saved trip at {}, starting fresh.", self.path.display());
                Ok(AppState::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, state: &AppState) -> Result<(), GenericError> {
        write_json(&self.path, state).await
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), GenericError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn session_file_uses_camel_case_key() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path());
        store.save(&SessionId::from("s-1".to_string())).await.unwrap();

        let raw = std::fs::read_to_string(dir.path().join(SESSION_FILE)).unwrap();
        assert!(raw.contains("\"sessionId\""));
        assert_eq!(store.load().await.unwrap().as_str(), "s-1");
    }

    #[tokio::test]
    async fn corrupt_session_file_is_ignored() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SESSION_FILE), "{not json").unwrap();
        assert!(SessionStore::new(dir.path()).load().await.is_none());
    }

    #[tokio::test]
    async fn state_survives_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = StateStore::new(dir.path().join("nested"));
        assert!(store.load().await.unwrap().planner.destinations().is_empty());

        let mut state = AppState::default();
        state
            .planner
            .add_destination(Destination::new("Manila Ocean Park", "Manila", "zoo").with_id("9"))
            .unwrap();
        store.save(&state).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.planner.destinations().len(), 1);
        assert_eq!(loaded.planner.trip().travel_days, 1);
    }
}

use async_trait::async_trait;
use derive_more::{Display, From};
use log::*;
use serde::{Deserialize, Serialize};

use super::{api, ApiClient};
use crate::{store::SessionStore, GenericError};

/// Opaque session identifier issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Display, From, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
pub trait SessionService {
    async fn create_session(&self) -> Result<SessionId, GenericError>;
    /// `Ok(false)` when the backend no longer knows the session.
    async fn validate_session(&self, id: &SessionId) -> Result<bool, GenericError>;
}

#[derive(Debug, Deserialize)]
struct CreateSessionResponse {
    session_id: SessionId,
}

#[async_trait]
impl SessionService for ApiClient {
    async fn create_session(&self) -> Result<SessionId, GenericError> {
        let url = self.url("/create_session");
        let response = self
            .send_with_retry(|http| http.post(&url), self.config().session_create_timeout)
            .await?;
        let created: CreateSessionResponse =
            api::decode(response, "Failed to create session").await?;
        Ok(created.session_id)
    }

    async fn validate_session(&self, id: &SessionId) -> Result<bool, GenericError> {
        let url = self.url(&format!("/session/{}", id.as_str()));
        let response = self
            .send_with_retry(|http| http.get(&url), self.config().session_validate_timeout)
            .await?;
        Ok(response.status().is_success())
    }
}

/// Reuses the stored session when the backend still accepts it, otherwise
/// creates and stores a new one. Failures leave the client without a session
/// rather than aborting; recommendations still work anonymously.
pub async fn bootstrap<S>(service: &S, store: &SessionStore) -> Option<SessionId>
where
    S: SessionService + Sync + ?Sized,
{
    if let Some(existing) = store.load().await {
        match service.validate_session(&existing).await {
            Ok(true) => {
                debug!("Using existing session: {existing}");
                return Some(existing);
            }
            Ok(false) => info!("Existing session invalid, creating new one"),
            Err(e) => info!("Could not validate session ({e}), creating new one"),
        }
    }

    match service.create_session().await {
        Ok(id) => {
            if let Err(e) = store.save(&id).await {
                warn!("Could not persist session: {e}");
            }
            info!("Session created: {id}");
            Some(id)
        }
        Err(e) => {
            warn!("Error creating session: {e}");
            None
        }
    }
}

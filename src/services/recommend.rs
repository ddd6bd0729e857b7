use async_trait::async_trait;
use log::*;
use serde::{Deserialize, Serialize};

use super::{api::api_error, session::SessionId, ApiClient};
use crate::{planner::Destination, GenericError};

#[async_trait]
pub trait RecommendationService {
    async fn recommend(&self, request: &RecommendRequest) -> Result<RecommendResponse, GenericError>;
}

#[derive(Debug, Clone, Serialize)]
pub struct RecommendRequest {
    pub query: String,
    pub session_id: Option<SessionId>,
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendResponse {
    #[serde(default)]
    pub recommendations: Vec<Destination>,
    #[serde(default)]
    pub detected_city: Option<String>,
    #[serde(default)]
    pub detected_category: Option<String>,
    #[serde(default)]
    pub is_conversation: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl RecommendResponse {
    pub fn conversation(message: impl Into<String>) -> Self {
        RecommendResponse {
            is_conversation: true,
            message: Some(message.into()),
            ..RecommendResponse::default()
        }
    }
}

#[async_trait]
impl RecommendationService for ApiClient {
    async fn recommend(&self, request: &RecommendRequest) -> Result<RecommendResponse, GenericError> {
        debug!("Sending recommendation request: {request:?}");
        let url = self.url("/recommend");
        let response = self
            .send_with_retry(|http| http.post(&url).json(request), self.config().chat_timeout)
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            // Small talk comes back as a non-OK answer that still carries a reply.
            if let Ok(parsed) = serde_json::from_str::<RecommendResponse>(&body) {
                if parsed.is_conversation && parsed.message.is_some() {
                    return Ok(parsed);
                }
            }
            return Err(api_error(status, &body, "Failed to get recommendations").into());
        }
        let parsed: RecommendResponse = serde_json::from_str(&body)?;
        trace!(
            "Received {} recommendations (city: {:?}, category: {:?})",
            parsed.recommendations.len(),
            parsed.detected_city,
            parsed.detected_category
        );
        Ok(parsed)
    }
}

use std::{fmt::Display, future::Future, time::Duration};

use log::*;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{config::Config, GenericError, WertigoError};

/// HTTP client for the WerTigo backend. Every service trait is implemented
/// on top of it, one module per concern.
pub struct ApiClient {
    http: Client,
    config: Config,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self, GenericError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-cache"));
        let http = Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()?;
        trace!("Built API client for {}", config.api_base_url);
        Ok(ApiClient {
            http,
            config: config.clone(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn url(&self, endpoint: &str) -> String {
        self.config.api_url(endpoint)
    }

    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.config.retry_attempts,
            delay: self.config.retry_delay,
        }
    }

    /// Sends a request once, mapping timeouts to [`WertigoError::Timeout`].
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<Response, GenericError> {
        request.send().await.map_err(transport_error)
    }

    /// Sends the request built by `build` with its own timeout, retrying
    /// transport failures other than the timeout itself.
    pub(crate) async fn send_with_retry<F>(
        &self,
        build: F,
        timeout: Duration,
    ) -> Result<Response, GenericError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        with_retry(&self.retry_policy(), || build(&self.http).timeout(timeout).send())
            .await
            .map_err(transport_error)
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for reqwest::Error {
    fn is_retryable(&self) -> bool {
        !self.is_timeout()
    }
}

/// Runs `op` until it succeeds, fails with a non-retryable error, or the
/// policy's extra attempts are spent.
pub async fn with_retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + Display,
{
    let mut retries_left = policy.attempts;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if retries_left > 0 && err.is_retryable() => {
                debug!("Retrying request after error: {err} (attempts left: {retries_left})");
                retries_left -= 1;
                tokio::time::sleep(policy.delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}

fn transport_error(err: reqwest::Error) -> GenericError {
    if err.is_timeout() {
        WertigoError::Timeout().into()
    } else {
        err.into()
    }
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Builds the error for a non-success response, preferring the backend's
/// own `error` (or `message`) text.
pub fn api_error(status: StatusCode, body: &str, fallback: &str) -> WertigoError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let message = parsed
        .error
        .or(parsed.message)
        .unwrap_or_else(|| fallback.to_string());
    if status == StatusCode::NOT_FOUND {
        WertigoError::NotFound(message)
    } else {
        WertigoError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

/// Decodes a JSON body, turning non-success statuses into errors.
pub async fn decode<T: DeserializeOwned>(
    response: Response,
    fallback: &str,
) -> Result<T, GenericError> {
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        warn!("Backend answered {status}: {body}");
        return Err(api_error(status, &body, fallback).into());
    }
    Ok(serde_json::from_str(&body)?)
}

use super::{ApiClient, Coordinates};

use crate::{GenericError, WertigoError};

use async_trait::async_trait;
use google_maps::GoogleMapsClient;
use log::*;
use rust_decimal::prelude::ToPrimitive;
use serde::Deserialize;

#[async_trait]
pub trait GeocodingService {
    async fn geocode(&self, query: &str) -> Result<Coordinates, GenericError>;
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    point: Coordinates,
}

#[async_trait]
impl GeocodingService for ApiClient {
    async fn geocode(&self, query: &str) -> Result<Coordinates, GenericError> {
        let request = self
            .http()
            .get(self.url("/geocode"))
            .query(&[("q", query)]);
        let response: GeocodeResponse =
            super::api::decode(self.send(request).await?, "Failed to geocode location").await?;
        let point = response
            .results
            .first()
            .ok_or(WertigoError::LocationNotFound())?
            .point;
        trace!("Geocoded {query:?} to {}, {}", point.lat, point.lng);
        Ok(point)
    }
}

/// Direct Google Maps geocoder, used instead of the backend's `/geocode`
/// when `GOOGLE_MAPS_TOKEN` is configured.
pub struct GoogleMapsService {
    client: GoogleMapsClient,
}

impl GoogleMapsService {
    pub fn new() -> Result<Self, GenericError> {
        Ok(GoogleMapsService {
            client: GoogleMapsClient::new(&dotenv::var("GOOGLE_MAPS_TOKEN")?),
        })
    }
}

#[async_trait]
impl GeocodingService for GoogleMapsService {
    async fn geocode(&self, query: &str) -> Result<Coordinates, GenericError> {
        let response = self
            .client
            .geocoding()
            .with_address(query)
            .execute()
            .await?;
        let location = &response
            .results
            .first()
            .ok_or(WertigoError::LocationNotFound())?
            .geometry
            .location;
        trace!("Received coordinates from Google Maps geocoding API.");
        Ok(Coordinates {
            lat: location.lat.to_f64().ok_or(WertigoError::LocationNotFound())?,
            lng: location.lng.to_f64().ok_or(WertigoError::LocationNotFound())?,
        })
    }
}

/// Picks the geocoder for this run: Google Maps when a token is present,
/// the backend otherwise.
pub fn geocoder<'a>(api: &'a ApiClient) -> Box<dyn GeocodingService + Send + Sync + 'a> {
    if api.config().google_maps_token.is_some() {
        match GoogleMapsService::new() {
            Ok(service) => return Box::new(service),
            Err(e) => warn!("Falling back to backend geocoding: {e}"),
        }
    }
    Box::new(api)
}

#[async_trait]
impl<T: GeocodingService + Send + Sync + ?Sized> GeocodingService for &T {
    async fn geocode(&self, query: &str) -> Result<Coordinates, GenericError> {
        (**self).geocode(query).await
    }
}

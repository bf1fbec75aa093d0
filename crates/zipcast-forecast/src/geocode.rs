//! Forward geocoding: convert a free-text address to a [`Location`].
//! Uses the Nominatim (OpenStreetMap) search API; takes the best match only.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::instrument;
use zipcast_core::GeocodingConfig;

use crate::error::ResolutionError;
use crate::location::Location;

/// Resolves addresses to locations.
#[async_trait]
pub trait GeocodeResolver: Send + Sync {
    /// Resolve `address` with a single provider request. No retries.
    async fn resolve(&self, address: &str) -> Result<Location, ResolutionError>;
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: Option<Coordinate>,
    lon: Option<Coordinate>,
    address: Option<NominatimAddress>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    country_code: Option<String>,
    postcode: Option<String>,
}

/// Nominatim sends coordinates as strings; other compatible servers use numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn value(&self, field: &str) -> Result<f64, ResolutionError> {
        match self {
            Coordinate::Number(n) => Ok(*n),
            Coordinate::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| ResolutionError::Parse(format!("{} is not a number: {:?}", field, s))),
        }
    }
}

/// HTTP geocoder backed by a Nominatim-compatible server.
#[derive(Debug, Clone)]
pub struct Geocoder {
    client: Client,
    base_url: String,
}

impl Geocoder {
    pub fn new(config: &GeocodingConfig) -> Result<Self, ResolutionError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GeocodeResolver for Geocoder {
    #[instrument(skip(self), level = "info")]
    async fn resolve(&self, address: &str) -> Result<Location, ResolutionError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ResolutionError::EmptyAddress);
        }

        let url = format!("{}/search", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", address),
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("limit", "1"),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Geocode request failed: {}", e);
                ResolutionError::Network(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("Geocode returned status {}", status);
            return Err(ResolutionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let places: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| ResolutionError::Parse(e.to_string()))?;

        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| ResolutionError::NoMatch(address.to_string()))?;

        let location = place_to_location(place)?;
        tracing::info!(
            "Resolved address to {}, {} ({} {})",
            location.latitude,
            location.longitude,
            location.country_code,
            location.postal_code
        );
        Ok(location)
    }
}

fn place_to_location(place: NominatimPlace) -> Result<Location, ResolutionError> {
    let latitude = place
        .lat
        .ok_or(ResolutionError::MissingLatitude)?
        .value("latitude")?;
    let longitude = place
        .lon
        .ok_or(ResolutionError::MissingLongitude)?
        .value("longitude")?;

    let address = place.address.ok_or(ResolutionError::MissingAddress)?;
    let country_code = address
        .country_code
        .ok_or(ResolutionError::MissingCountryCode)?;
    let postal_code = address.postcode.ok_or(ResolutionError::MissingPostalCode)?;

    Location::new(latitude, longitude, &country_code, &postal_code)
}

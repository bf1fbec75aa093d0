//! Error types for the forecast pipeline.
//!
//! Resolution and fetch failures are kept as separate types so callers can
//! branch on which stage failed. [`ForecastError`] carries either one through
//! the orchestrator unchanged.

use thiserror::Error;

/// An address could not be turned into a [`Location`](crate::Location).
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Address is empty")]
    EmptyAddress,

    #[error("Geocoding request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Geocoding provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Geocoding response could not be parsed: {0}")]
    Parse(String),

    #[error("No match found for address: {0}")]
    NoMatch(String),

    #[error("Geocoding result is missing latitude")]
    MissingLatitude,

    #[error("Geocoding result is missing longitude")]
    MissingLongitude,

    /// The match carried no address block at all, so neither country nor
    /// postal code is known.
    #[error("Geocoding result is missing address details")]
    MissingAddress,

    #[error("Geocoding result is missing country code")]
    MissingCountryCode,

    #[error("Geocoding result is missing postal code")]
    MissingPostalCode,

    #[error("Coordinates out of range: {latitude}, {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

impl ResolutionError {
    /// Stable short code for logs and diagnostics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::EmptyAddress => "empty_address",
            Self::Network(_) => "network",
            Self::Status { .. } => "bad_status",
            Self::Parse(_) => "parse",
            Self::NoMatch(_) => "no_match",
            Self::MissingLatitude => "missing_latitude",
            Self::MissingLongitude => "missing_longitude",
            Self::MissingAddress => "missing_address",
            Self::MissingCountryCode => "missing_country_code",
            Self::MissingPostalCode => "missing_postal_code",
            Self::InvalidCoordinates { .. } => "invalid_coordinates",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::EmptyAddress => "Please enter an address.",
            Self::Network(_) | Self::Status { .. } | Self::Parse(_) => {
                "Address lookup is unavailable right now. Please try again later."
            }
            Self::NoMatch(_) => "That address could not be found. Check it and try again.",
            Self::MissingLatitude
            | Self::MissingLongitude
            | Self::InvalidCoordinates { .. } => {
                "That address could not be located precisely. Try a more specific address."
            }
            Self::MissingAddress | Self::MissingCountryCode | Self::MissingPostalCode => {
                "That address has no postal code. Try including a street and city."
            }
        }
    }
}

/// Weather could not be obtained for a resolved location.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Weather request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Weather provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Weather response could not be parsed: {0}")]
    Parse(String),

    #[error("Weather response is missing current temperature")]
    MissingCurrentTemperature,
}

impl FetchError {
    /// Stable short code for logs and diagnostics.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Status { .. } => "bad_status",
            Self::Parse(_) => "parse",
            Self::MissingCurrentTemperature => "missing_current_temperature",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(_) => "Weather service is unreachable. Please try again later.",
            Self::Status { status, .. } if *status >= 500 => {
                "Weather service is experiencing issues. Please try again later."
            }
            Self::Status { .. } | Self::Parse(_) | Self::MissingCurrentTemperature => {
                "Weather data is unavailable for this location right now."
            }
        }
    }
}

/// Any failure of a forecast lookup.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl ForecastError {
    /// User-friendly message for display; never includes provider details.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Resolution(e) => e.user_message(),
            Self::Fetch(e) => e.user_message(),
        }
    }
}

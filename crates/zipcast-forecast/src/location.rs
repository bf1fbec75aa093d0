//! Resolved geographic location.

use serde::{Deserialize, Serialize};

use crate::error::ResolutionError;

/// A geocoded address reduced to the fields the forecast pipeline needs.
///
/// Built through [`Location::new`], which enforces coordinate bounds and a
/// non-empty postal code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// ISO 3166-1 alpha-2, lowercase
    pub country_code: String,
    /// Cache key for the forecast
    pub postal_code: String,
}

impl Location {
    pub fn new(
        latitude: f64,
        longitude: f64,
        country_code: &str,
        postal_code: &str,
    ) -> Result<Self, ResolutionError> {
        let lat_ok = latitude.is_finite() && (-90.0..=90.0).contains(&latitude);
        let lon_ok = longitude.is_finite() && (-180.0..=180.0).contains(&longitude);
        if !lat_ok || !lon_ok {
            return Err(ResolutionError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }

        let country_code = country_code.trim();
        if country_code.is_empty() {
            return Err(ResolutionError::MissingCountryCode);
        }

        let postal_code = postal_code.trim();
        if postal_code.is_empty() {
            return Err(ResolutionError::MissingPostalCode);
        }

        Ok(Self {
            latitude,
            longitude,
            country_code: country_code.to_ascii_lowercase(),
            postal_code: postal_code.to_string(),
        })
    }
}

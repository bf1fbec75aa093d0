//! Address → forecast lookup with a postal-code cache in front of the
//! weather provider.

use std::sync::Arc;

use tracing::instrument;

use crate::cache::ForecastCache;
use crate::error::ForecastError;
use crate::geocode::GeocodeResolver;
use crate::provider::WeatherFetcher;
use crate::types::ForecastResult;

/// Entry point for the presentation layer.
///
/// Concurrent misses for the same postal code each reach the weather
/// provider; the last one to finish wins the cache slot.
#[derive(Clone)]
pub struct ForecastOrchestrator {
    resolver: Arc<dyn GeocodeResolver>,
    fetcher: Arc<dyn WeatherFetcher>,
    cache: Arc<ForecastCache>,
}

impl ForecastOrchestrator {
    pub fn new(
        resolver: Arc<dyn GeocodeResolver>,
        fetcher: Arc<dyn WeatherFetcher>,
        cache: Arc<ForecastCache>,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            cache,
        }
    }

    /// Resolve `address` and return its forecast, from cache when a live
    /// entry exists for the postal code.
    ///
    /// # Errors
    ///
    /// Returns the first resolution or fetch error unchanged. Nothing is
    /// cached when either step fails.
    #[instrument(skip(self), level = "info")]
    pub async fn get_forecast(&self, address: &str) -> Result<ForecastResult, ForecastError> {
        let location = self
            .resolver
            .resolve(address)
            .await
            .inspect_err(|e| tracing::debug!("Resolution failed ({}): {}", e.reason(), e))?;

        if let Some(forecast) = self.cache.get(&location.postal_code) {
            tracing::info!("Serving cached forecast for {}", location.postal_code);
            return Ok(ForecastResult {
                location,
                forecast,
                from_cache: true,
            });
        }

        let forecast = self
            .fetcher
            .fetch(&location)
            .await
            .inspect_err(|e| tracing::debug!("Fetch failed ({}): {}", e.reason(), e))?;
        self.cache.put(&location.postal_code, forecast.clone());

        Ok(ForecastResult {
            location,
            forecast,
            from_cache: false,
        })
    }
}

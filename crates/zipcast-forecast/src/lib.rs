//! Forecast lookup for Zipcast
//!
//! Resolves addresses via Nominatim, fetches weather from Open-Meteo, and
//! caches forecasts per postal code for 30 minutes.

pub mod cache;
pub mod clock;
pub mod error;
pub mod geocode;
pub mod location;
pub mod orchestrator;
pub mod provider;
pub mod types;

pub use cache::{spawn_sweeper, ForecastCache, CACHE_TTL};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{FetchError, ForecastError, ResolutionError};
pub use geocode::{GeocodeResolver, Geocoder};
pub use location::Location;
pub use orchestrator::ForecastOrchestrator;
pub use provider::{resolve_unit, WeatherFetcher, WeatherProvider};
pub use types::*;

//! Shared foundation for Zipcast: configuration, startup errors and logging.

pub mod config;
pub mod error;

pub use config::{
    CacheConfig, Config, GeocodingConfig, TemperatureUnit, ValidationResult, WeatherConfig,
};
pub use error::ConfigError;

/// Initialize logging.
///
/// Honors `RUST_LOG`; falls back to `info`.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Zipcast core initialized");
}

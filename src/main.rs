use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;
use tokio_util::sync::CancellationToken;
use zipcast_core::Config;
use zipcast_forecast::{
    spawn_sweeper, ForecastCache, ForecastOrchestrator, ForecastResult, Geocoder,
    TemperatureUnit, WeatherProvider,
};

#[tokio::main]
async fn main() -> Result<()> {
    zipcast_core::init();

    let config_path = std::env::var_os("ZIPCAST_CONFIG").map(PathBuf::from);
    let config = Config::load_validated(config_path.as_deref())?;

    // One cache for the lifetime of the process
    let cache = Arc::new(ForecastCache::new().with_max_entries(config.cache.max_entries));
    let shutdown = CancellationToken::new();
    let sweeper = (config.cache.sweep_interval_secs > 0).then(|| {
        spawn_sweeper(
            cache.clone(),
            Duration::from_secs(config.cache.sweep_interval_secs),
            shutdown.clone(),
        )
    });

    let orchestrator = ForecastOrchestrator::new(
        Arc::new(Geocoder::new(&config.geocoding)?),
        Arc::new(WeatherProvider::new(&config.weather)?),
        cache,
    );

    tracing::info!("Zipcast started");

    let addresses: Vec<String> = std::env::args().skip(1).collect();
    if addresses.is_empty() {
        println!("Enter an address per line (Ctrl-D to quit):");
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            lookup(&orchestrator, &line).await;
        }
    } else {
        for address in &addresses {
            lookup(&orchestrator, address).await;
        }
    }

    shutdown.cancel();
    if let Some(sweeper) = sweeper {
        sweeper.await?;
    }

    Ok(())
}

async fn lookup(orchestrator: &ForecastOrchestrator, address: &str) {
    match orchestrator.get_forecast(address).await {
        Ok(result) => render(address, &result),
        Err(e) => {
            tracing::warn!("Forecast lookup failed: {}", e);
            println!("{}: {}", address, e.user_message());
        }
    }
}

fn render(address: &str, result: &ForecastResult) {
    let unit = match result.forecast.unit {
        TemperatureUnit::Fahrenheit => "°F",
        _ => "°C",
    };
    let origin = if result.from_cache {
        "from cache"
    } else {
        "freshly fetched"
    };

    println!(
        "{} ({} {}) [{}]",
        address,
        result.location.postal_code,
        result.location.country_code.to_uppercase(),
        origin
    );
    println!("  Now: {:.1}{}", result.forecast.current_temperature, unit);
    if let (Some(high), Some(low)) = (result.forecast.high, result.forecast.low) {
        println!("  Today: high {:.1}{} / low {:.1}{}", high, unit, low, unit);
    }
    for day in &result.forecast.extended {
        println!(
            "  {}: {:.1}{} / {:.1}{}  {}",
            day.date.format("%a %b %d"),
            day.high,
            unit,
            day.low,
            unit,
            day.summary
        );
    }
}

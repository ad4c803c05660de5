pub mod cache;
pub mod cli;
pub mod convert;
pub mod domain;
pub mod elevation;
pub mod error;
pub mod geo;
pub mod providers;
pub mod router;

use anyhow::Result;

use cache::ForecastCache;
use cli::Cli;
use domain::NormalizedDailyForecast;
use elevation::{ElevationResolver, temperature_adjustment};
use router::{WeatherRouter, default_registry};

/// Fetch one forecast per the CLI arguments and print it. This is the demo
/// entry point; services embed [`router::WeatherRouter`] directly.
pub async fn run(cli: Cli) -> Result<()> {
    let (providers, fallback) = default_registry();
    let router = WeatherRouter::new(providers, fallback, ForecastCache::new(cli.ttl));

    let mut forecast = router
        .get_forecast(cli.lat, cli.lon, &cli.country, cli.days)
        .await?;

    if let Some(point_elevation) = cli.point_elevation {
        reproject_temperatures(&mut forecast, point_elevation).await;
    }

    if cli.alerts {
        let alerts = router.get_alerts(cli.lat, cli.lon, &cli.country).await;
        forecast.alerts.extend(alerts);
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&forecast)?);
    } else {
        print_table(&forecast);
    }

    Ok(())
}

/// Shift every period temperature from the model's cell-average elevation
/// to the caller's point elevation via the standard lapse rate.
async fn reproject_temperatures(forecast: &mut NormalizedDailyForecast, point_elevation_m: f64) {
    let resolver = ElevationResolver::new();
    let grid = resolver.resolve(forecast.latitude, forecast.longitude).await;
    let base = forecast.model_elevation.meters().unwrap_or(grid.average_m);
    let adjustment = temperature_adjustment(point_elevation_m, base);

    for period in &mut forecast.periods {
        period.temp_min_c += adjustment;
        period.temp_max_c += adjustment;
    }
}

fn print_table(forecast: &NormalizedDailyForecast) {
    println!(
        "{} forecast for {:.4}, {:.4} [{}]{}",
        forecast.provider,
        forecast.latitude,
        forecast.longitude,
        forecast.country_code,
        if forecast.is_fallback {
            " (fallback)"
        } else {
            ""
        }
    );

    for period in &forecast.periods {
        println!(
            "{}  {:>5.1}..{:>5.1}C  rain {:>3.0}% {:>5.1}mm  snow {:>4.1}cm  wind {:>3.0}/{:>3.0} {:<2}  cloud {:>3.0}%  {}",
            period.timestamp.format("%m-%d %H:%M"),
            period.temp_min_c,
            period.temp_max_c,
            period.rain_chance_pct,
            period.rain_amount_mm,
            period.snow_amount_cm,
            period.wind_avg_kmh,
            period.wind_max_kmh,
            period.wind_direction,
            period.cloud_cover_pct,
            period.description,
        );
    }

    for alert in &forecast.alerts {
        println!("! {:?}: {}", alert.severity, alert.headline);
    }
}

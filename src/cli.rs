use clap::Parser;

use crate::cache::DEFAULT_TTL_SECS;

/// Fetch a multi-provider weather forecast for a point and print it.
#[derive(Debug, Clone, Parser)]
#[command(name = "ridgecast", version, about, allow_negative_numbers = true)]
pub struct Cli {
    /// Latitude, decimal degrees.
    pub lat: f64,

    /// Longitude, decimal degrees.
    pub lon: f64,

    /// ISO-3166-1 alpha-2 country code used to pick the primary provider.
    #[arg(short, long, default_value = "XX")]
    pub country: String,

    /// Forecast horizon in days (1-16).
    #[arg(short, long, default_value_t = 3)]
    pub days: u8,

    /// Forecast cache TTL, seconds.
    #[arg(long, default_value_t = DEFAULT_TTL_SECS)]
    pub ttl: i64,

    /// Also fetch active weather alerts.
    #[arg(long)]
    pub alerts: bool,

    /// Reproject temperatures to this point elevation (metres) using the
    /// grid-average elevation of the surrounding terrain cell.
    #[arg(long)]
    pub point_elevation: Option<f64>,

    /// Emit the normalized forecast as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

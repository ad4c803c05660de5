pub mod cell;
pub mod forecast;

pub use cell::{CellForecast, ForecastPeriod, PeriodLabel};
pub use forecast::{
    AlertSeverity, AlertUrgency, ModelElevation, NormalizedDailyForecast, NormalizedForecast,
    WeatherAlert,
};

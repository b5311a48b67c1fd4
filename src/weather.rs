//! # Weather Forecast
//!
//! Hourly temperature, humidity and wind from the Open-Meteo forecast API.
//! The series is requested with `timezone=GMT`, so every `time` entry is a UTC
//! wall-clock hour such as `2026-10-18T06:00`.

use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::tide_data::{get_body, FetchError};

const FORECAST_URL: &str = "https://api.open-meteo.com/v1/forecast";

/// Format of Open-Meteo hourly timestamps
pub(crate) const HOUR_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Weather conditions for one hour.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherSample {
    pub time: DateTime<Utc>,
    pub temperature_c: f64,
    pub humidity_pct: f64,
    pub wind_kmh: f64,
}

/// Parallel hourly arrays as returned by Open-Meteo.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlyWeather {
    pub time: Vec<String>,
    #[serde(rename = "temperature_2m")]
    pub temperature: Vec<Option<f64>>,
    #[serde(rename = "relative_humidity_2m")]
    pub humidity: Vec<Option<f64>>,
    #[serde(rename = "wind_speed_10m")]
    pub wind_speed: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    hourly: Option<HourlyWeather>,
}

impl HourlyWeather {
    /// Conditions for the hour containing `at`.
    ///
    /// `None` when that hour is not in the series or any field is null.
    pub fn lookup(&self, at: DateTime<Utc>) -> Option<WeatherSample> {
        let hour = at
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))?;
        let key = hour.format(HOUR_FORMAT).to_string();
        let idx = self.time.iter().position(|t| *t == key)?;

        Some(WeatherSample {
            time: hour,
            temperature_c: (*self.temperature.get(idx)?)?,
            humidity_pct: (*self.humidity.get(idx)?)?,
            wind_kmh: (*self.wind_speed.get(idx)?)?,
        })
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Fetch the hourly forecast. Returns `None` on any failure.
pub async fn fetch(client: &Client, config: &Config) -> Option<HourlyWeather> {
    let query = [
        ("latitude", config.location.latitude.to_string()),
        ("longitude", config.location.longitude.to_string()),
        (
            "hourly",
            "temperature_2m,relative_humidity_2m,wind_speed_10m".to_string(),
        ),
        ("timezone", "GMT".to_string()),
        ("past_days", "1".to_string()),
        ("forecast_days", config.forecast.days.to_string()),
    ];

    let result = match get_body(client, "Open-Meteo", FORECAST_URL, &query).await {
        Ok(body) => parse_forecast(&body),
        Err(e) => Err(e),
    };

    match result {
        Ok(hourly) => {
            info!("Fetched {} hours of weather", hourly.len());
            Some(hourly)
        }
        Err(error) => {
            warn!("Weather fetch failed: {}", error);
            None
        }
    }
}

/// Parse an Open-Meteo forecast body and check the arrays line up.
pub fn parse_forecast(body: &str) -> Result<HourlyWeather, FetchError> {
    let parsed: ForecastResponse = serde_json::from_str(body)?;
    let hourly = parsed
        .hourly
        .ok_or_else(|| FetchError::Shape("forecast has no hourly block".into()))?;

    let n = hourly.time.len();
    if hourly.temperature.len() != n || hourly.humidity.len() != n || hourly.wind_speed.len() != n
    {
        return Err(FetchError::Shape(format!(
            "hourly arrays differ in length: time {}, temperature {}, humidity {}, wind {}",
            n,
            hourly.temperature.len(),
            hourly.humidity.len(),
            hourly.wind_speed.len()
        )));
    }
    if hourly.is_empty() {
        return Err(FetchError::Shape("forecast has no hours".into()));
    }
    Ok(hourly)
}

/// Parse an Open-Meteo hourly timestamp requested with `timezone=GMT`.
pub(crate) fn parse_hour(raw: &str) -> Result<DateTime<Utc>, FetchError> {
    NaiveDateTime::parse_from_str(raw, HOUR_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| FetchError::Shape(format!("bad hourly timestamp '{raw}'")))
}

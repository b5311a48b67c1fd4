//! # Marine Forecast
//!
//! Hourly open-sea wave height from the Open-Meteo marine API, used for the
//! morning sea-state line of the report.

use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::Config;
use crate::tide_data::{get_body, FetchError};
use crate::weather::parse_hour;
use crate::Reading;

const MARINE_URL: &str = "https://marine-api.open-meteo.com/v1/marine";

#[derive(Debug, Deserialize)]
struct MarineResponse {
    hourly: Option<MarineHourly>,
}

#[derive(Debug, Deserialize)]
struct MarineHourly {
    time: Vec<String>,
    wave_height: Vec<Option<f64>>,
}

/// Fetch hourly wave heights. Returns `None` on any failure.
pub async fn fetch(client: &Client, config: &Config) -> Option<Vec<Reading>> {
    let query = [
        ("latitude", config.location.latitude.to_string()),
        ("longitude", config.location.longitude.to_string()),
        ("hourly", "wave_height".to_string()),
        ("timezone", "GMT".to_string()),
        ("past_days", "1".to_string()),
        ("forecast_days", config.forecast.days.to_string()),
    ];

    let result = match get_body(client, "Open-Meteo Marine", MARINE_URL, &query).await {
        Ok(body) => parse_marine(&body),
        Err(e) => Err(e),
    };

    match result {
        Ok(waves) => {
            info!("Fetched {} hourly wave heights", waves.len());
            Some(waves)
        }
        Err(error) => {
            warn!("Marine forecast fetch failed: {}", error);
            None
        }
    }
}

/// Parse a marine forecast body into wave readings.
///
/// Hours with a null wave height are dropped; an empty result is an error.
pub fn parse_marine(body: &str) -> Result<Vec<Reading>, FetchError> {
    let parsed: MarineResponse = serde_json::from_str(body)?;
    let hourly = parsed
        .hourly
        .ok_or_else(|| FetchError::Shape("marine forecast has no hourly block".into()))?;

    if hourly.time.len() != hourly.wave_height.len() {
        return Err(FetchError::Shape(format!(
            "hourly arrays differ in length: time {}, wave_height {}",
            hourly.time.len(),
            hourly.wave_height.len()
        )));
    }

    let mut waves = Vec::with_capacity(hourly.time.len());
    for (raw, height) in hourly.time.iter().zip(hourly.wave_height) {
        if let Some(height) = height {
            waves.push(Reading {
                time: parse_hour(raw)?,
                height,
            });
        }
    }

    if waves.is_empty() {
        return Err(FetchError::Shape("marine forecast has no wave heights".into()));
    }
    Ok(waves)
}

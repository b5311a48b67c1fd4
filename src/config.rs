//! # Configuration Management
//!
//! This module handles loading configuration from the optional sandbar-config.toml
//! file and overlaying secrets from the environment. The resulting [`Config`] is
//! passed explicitly into the pipeline; nothing else reads the environment.

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::mem;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use crate::selector::DaylightWindow;

/// Default config file, looked up in the working directory
pub const DEFAULT_CONFIG_PATH: &str = "sandbar-config.toml";

pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const ENV_CHAT_ID: &str = "CHAT_ID";
pub const ENV_TIDES_API_KEY: &str = "WORLDTIDES_API_KEY";
pub const ENV_LATITUDE: &str = "SANDBAR_LATITUDE";
pub const ENV_LONGITUDE: &str = "SANDBAR_LONGITUDE";

/// Longest history the tide request may ask for
pub const MAX_LOOKBACK_HOURS: i64 = 72;
/// Longest forecast any provider request may ask for
pub const MAX_FORECAST_DAYS: u32 = 7;

/// Problems with the assembled configuration.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    /// One or more required settings are empty
    #[error("missing required settings: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    /// A setting is present but unusable
    #[error("invalid value for {field}: {value}")]
    Invalid { field: &'static str, value: String },
}

/// Application configuration
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Where the sandbar is
    pub location: LocationConfig,
    /// Tide provider settings
    pub tides: TideConfig,
    /// Open-Meteo wave and weather forecast settings
    pub forecast: ForecastConfig,
    /// Time-of-day rules for the walking recommendation
    pub walk: WalkConfig,
    /// Message delivery
    pub telegram: TelegramConfig,
}

/// Fixed coastal location
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Human-readable name used in the message header
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Resort local time as a whole-hour offset from UTC
    pub utc_offset_hours: i32,
}

/// WorldTides request settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TideConfig {
    pub api_key: String,
    /// Vertical datum heights are reported against (e.g. "LAT", "MSL")
    pub datum: String,
    /// Hours of history requested before "now"
    pub lookback_hours: i64,
    /// Days of forecast requested after "now"
    pub lookahead_days: i64,
}

/// Open-Meteo request settings, shared by the marine and weather forecasts
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Days of hourly forecast requested, today included
    pub days: u32,
}

/// Time-of-day rules, all in resort local hours
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WalkConfig {
    pub daylight_start_hour: u32,
    /// Exclusive end of the daylight window
    pub daylight_end_hour: u32,
    /// Hour used for the morning tide and sea-state readings
    pub morning_hour: u32,
}

/// Telegram bot credentials
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        LocationConfig {
            name: "Koh Nang Yuan".to_string(),
            latitude: 10.1165,
            longitude: 99.8137,
            utc_offset_hours: 7,
        }
    }
}

impl Default for TideConfig {
    fn default() -> Self {
        TideConfig {
            api_key: String::new(),
            datum: "LAT".to_string(),
            lookback_hours: 12,
            lookahead_days: 2,
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        ForecastConfig { days: 2 }
    }
}

impl Default for WalkConfig {
    fn default() -> Self {
        WalkConfig {
            daylight_start_hour: 6,
            daylight_end_hour: 16,
            morning_hour: 8,
        }
    }
}

impl Config {
    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!(
                        "Loaded configuration for {} from {}",
                        config.location.name,
                        path.display()
                    );
                    config
                }
                Err(e) => {
                    warn!("Invalid config file format in {}: {}", path.display(), e);
                    warn!("Using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                info!("No config file at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Overlay settings from the environment.
    ///
    /// `lookup` returns the value of a variable, if set. Empty values are
    /// ignored so an unset secret never clobbers one from the file.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(token) = var(ENV_TELEGRAM_TOKEN) {
            self.telegram.token = token;
        }
        if let Some(chat_id) = var(ENV_CHAT_ID) {
            self.telegram.chat_id = chat_id;
        }
        if let Some(key) = var(ENV_TIDES_API_KEY) {
            self.tides.api_key = key;
        }
        if let Some(lat) = var(ENV_LATITUDE) {
            self.location.latitude = parse_coordinate(ENV_LATITUDE, &lat)?;
        }
        if let Some(lon) = var(ENV_LONGITUDE) {
            self.location.longitude = parse_coordinate(ENV_LONGITUDE, &lon)?;
        }
        Ok(())
    }

    /// Check that the fields a run depends on are present and sane.
    ///
    /// Every problem is reported at once: missing secrets come first, named
    /// by their environment variable, followed by each out-of-range setting.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut problems: Vec<ConfigError> = self.missing_secrets().into_iter().collect();
        problems.extend(location_problems(&self.location));
        problems.extend(tide_problems(&self.tides));
        problems.extend(forecast_problems(&self.forecast));
        problems.extend(walk_problems(&self.walk));

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }

    /// Validate, then put every section holding an unusable value back to
    /// its defaults so the run never computes with it.
    ///
    /// Secrets and the location name survive a reset. Returns the problems
    /// found, including missing secrets, which cannot be repaired here.
    pub fn repair(&mut self) -> Vec<ConfigError> {
        if self.validate().is_ok() {
            return Vec::new();
        }

        let mut problems: Vec<ConfigError> = self.missing_secrets().into_iter().collect();

        let found = location_problems(&self.location);
        if !found.is_empty() {
            warn!("Using default [location] coordinates and offset");
            self.location = LocationConfig {
                name: mem::take(&mut self.location.name),
                ..LocationConfig::default()
            };
            problems.extend(found);
        }

        let found = tide_problems(&self.tides);
        if !found.is_empty() {
            warn!("Using default [tides] request window");
            self.tides = TideConfig {
                api_key: mem::take(&mut self.tides.api_key),
                datum: mem::take(&mut self.tides.datum),
                ..TideConfig::default()
            };
            problems.extend(found);
        }

        let found = forecast_problems(&self.forecast);
        if !found.is_empty() {
            warn!("Using default [forecast] settings");
            self.forecast = ForecastConfig::default();
            problems.extend(found);
        }

        let found = walk_problems(&self.walk);
        if !found.is_empty() {
            warn!("Using default [walk] hours");
            self.walk = WalkConfig::default();
            problems.extend(found);
        }

        problems
    }

    fn missing_secrets(&self) -> Option<ConfigError> {
        let mut missing = Vec::new();
        if self.telegram.token.trim().is_empty() {
            missing.push(ENV_TELEGRAM_TOKEN);
        }
        if self.telegram.chat_id.trim().is_empty() {
            missing.push(ENV_CHAT_ID);
        }
        if self.tides.api_key.trim().is_empty() {
            missing.push(ENV_TIDES_API_KEY);
        }
        (!missing.is_empty()).then_some(ConfigError::Missing(missing))
    }

    /// Resort local offset; out-of-range values degrade to UTC.
    pub fn offset(&self) -> FixedOffset {
        self.location
            .utc_offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn daylight_window(&self) -> DaylightWindow {
        DaylightWindow {
            start_hour: self.walk.daylight_start_hour,
            end_hour: self.walk.daylight_end_hour,
        }
    }
}

fn location_problems(loc: &LocationConfig) -> Vec<ConfigError> {
    let mut problems = Vec::new();
    if !(-90.0..=90.0).contains(&loc.latitude) {
        problems.push(invalid("location.latitude", loc.latitude));
    }
    if !(-180.0..=180.0).contains(&loc.longitude) {
        problems.push(invalid("location.longitude", loc.longitude));
    }
    if !(-12..=14).contains(&loc.utc_offset_hours) {
        problems.push(invalid("location.utc_offset_hours", loc.utc_offset_hours));
    }
    problems
}

fn tide_problems(tides: &TideConfig) -> Vec<ConfigError> {
    let mut problems = Vec::new();
    if !(0..=MAX_LOOKBACK_HOURS).contains(&tides.lookback_hours) {
        problems.push(invalid("tides.lookback_hours", tides.lookback_hours));
    }
    if !(1..=i64::from(MAX_FORECAST_DAYS)).contains(&tides.lookahead_days) {
        problems.push(invalid("tides.lookahead_days", tides.lookahead_days));
    }
    problems
}

fn forecast_problems(forecast: &ForecastConfig) -> Vec<ConfigError> {
    if (1..=MAX_FORECAST_DAYS).contains(&forecast.days) {
        Vec::new()
    } else {
        vec![invalid("forecast.days", forecast.days)]
    }
}

fn walk_problems(walk: &WalkConfig) -> Vec<ConfigError> {
    let mut problems = Vec::new();
    if walk.daylight_start_hour >= walk.daylight_end_hour || walk.daylight_end_hour > 24 {
        problems.push(ConfigError::Invalid {
            field: "walk.daylight_end_hour",
            value: format!("{}..{}", walk.daylight_start_hour, walk.daylight_end_hour),
        });
    }
    if walk.morning_hour > 23 {
        problems.push(invalid("walk.morning_hour", walk.morning_hour));
    }
    problems
}

fn parse_coordinate(field: &'static str, raw: &str) -> Result<f64, ConfigError> {
    raw.trim().parse::<f64>().map_err(|_| ConfigError::Invalid {
        field,
        value: raw.to_string(),
    })
}

fn invalid(field: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        field,
        value: value.to_string(),
    }
}

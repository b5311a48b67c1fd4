//! # Tide Data Fetching
//!
//! This module handles the network call for tide predictions from the
//! WorldTides v3 API and the JSON parsing that turns the response into
//! [`TideData`].
//!
//! ## Data Source
//!
//! ### WorldTides v3
//! - **URL**: https://www.worldtides.info/api/v3
//! - **Auth**: `key` query parameter
//! - **Request**: `heights` and `extremes` for a window around "now", hourly step
//! - **Format**: JSON with unix-second `dt` timestamps (always UTC)
//!
//! ```json
//! {
//!   "status": 200,
//!   "heights":  [{ "dt": 1792281600, "date": "2026-10-18T00:00+0000", "height": 0.41 }],
//!   "extremes": [{ "dt": 1792296120, "date": "2026-10-18T04:02+0000", "height": 0.12, "type": "Low" }]
//! }
//! ```
//!
//! ## Error Handling
//!
//! Failures never escape [`fetch`]: network errors, non-success statuses,
//! provider-reported errors and missing fields are logged and reported as
//! "no data" (`None`). There is no retry.

use chrono::{DateTime, Duration, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{config::Config, Extreme, ExtremeKind, Reading, TideData};

const WORLDTIDES_URL: &str = "https://www.worldtides.info/api/v3?heights&extremes";

/// Hourly heights
const STEP_SECONDS: i64 = 3600;

/// Errors that can occur while fetching or parsing provider data.
///
/// Shared by every fetcher in the crate.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed (network, TLS, or body read error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: &'static str,
        status: StatusCode,
        body: String,
    },

    /// Server answered 200 but flagged an error in the body
    #[error("{provider} reported an error: {message}")]
    Provider {
        provider: &'static str,
        message: String,
    },

    /// Body was not the JSON we expected
    #[error("malformed JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// JSON parsed but required data is missing or inconsistent
    #[error("unexpected response: {0}")]
    Shape(String),

    /// Configured request window cannot be expressed as a time range
    #[error("request window out of range: {0}")]
    Window(String),
}

#[derive(Debug, Deserialize)]
struct WtResponse {
    status: u16,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    heights: Vec<WtHeight>,
    extremes: Option<Vec<WtExtreme>>,
}

#[derive(Debug, Deserialize)]
struct WtHeight {
    dt: i64,
    height: f64,
}

#[derive(Debug, Deserialize)]
struct WtExtreme {
    dt: i64,
    height: f64,
    #[serde(rename = "type")]
    kind: String,
}

/// Fetch tide extremes and hourly heights around `now`.
///
/// Returns `None` on any failure; the reason is logged.
pub async fn fetch(client: &Client, config: &Config, now: DateTime<Utc>) -> Option<TideData> {
    match request(client, config, now).await {
        Ok(data) => {
            info!(
                "Fetched {} tide extremes and {} hourly heights",
                data.extremes.len(),
                data.heights.len()
            );
            Some(data)
        }
        Err(error) => {
            warn!("Tide data fetch failed: {}", error);
            None
        }
    }
}

async fn request(
    client: &Client,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<TideData, FetchError> {
    let tides = &config.tides;
    let (start, length) = request_window(tides.lookback_hours, tides.lookahead_days, now)?;

    debug!(
        "Requesting tides for {:.4},{:.4} from {} for {}h",
        config.location.latitude,
        config.location.longitude,
        start,
        length / 3600
    );

    let query = [
        ("lat", config.location.latitude.to_string()),
        ("lon", config.location.longitude.to_string()),
        ("start", start.timestamp().to_string()),
        ("length", length.to_string()),
        ("step", STEP_SECONDS.to_string()),
        ("datum", tides.datum.clone()),
        ("key", tides.api_key.clone()),
    ];

    let body = get_body(client, "WorldTides", WORLDTIDES_URL, &query).await?;
    parse_worldtides(&body)
}

/// Start instant and length in seconds of the tide request.
fn request_window(
    lookback_hours: i64,
    lookahead_days: i64,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, i64), FetchError> {
    let out_of_range =
        || FetchError::Window(format!("lookback {lookback_hours}h, lookahead {lookahead_days}d"));

    let start = Duration::try_hours(lookback_hours)
        .and_then(|back| now.checked_sub_signed(back))
        .ok_or_else(out_of_range)?;
    let length = lookahead_days
        .checked_mul(24)
        .and_then(|hours| hours.checked_add(lookback_hours))
        .and_then(|hours| hours.checked_mul(3600))
        .ok_or_else(out_of_range)?;
    Ok((start, length))
}

/// Parse a WorldTides v3 response body into chronologically sorted data.
pub fn parse_worldtides(body: &str) -> Result<TideData, FetchError> {
    let parsed: WtResponse = serde_json::from_str(body)?;

    if parsed.status != 200 || parsed.error.is_some() {
        return Err(FetchError::Provider {
            provider: "WorldTides",
            message: parsed
                .error
                .unwrap_or_else(|| format!("status {}", parsed.status)),
        });
    }

    let raw_extremes = parsed
        .extremes
        .ok_or_else(|| FetchError::Shape("WorldTides response has no extremes".into()))?;

    let mut extremes = raw_extremes
        .into_iter()
        .map(|e| -> Result<Extreme, FetchError> {
            let kind = if e.kind.eq_ignore_ascii_case("low") {
                ExtremeKind::Low
            } else if e.kind.eq_ignore_ascii_case("high") {
                ExtremeKind::High
            } else {
                return Err(FetchError::Shape(format!("unknown extreme type '{}'", e.kind)));
            };
            Ok(Extreme {
                reading: Reading {
                    time: from_unix(e.dt)?,
                    height: e.height,
                },
                kind,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut heights = parsed
        .heights
        .into_iter()
        .map(|h| -> Result<Reading, FetchError> {
            Ok(Reading {
                time: from_unix(h.dt)?,
                height: h.height,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    extremes.sort_by_key(|e| e.time());
    heights.sort_by_key(|r| r.time);

    Ok(TideData { extremes, heights })
}

fn from_unix(ts: i64) -> Result<DateTime<Utc>, FetchError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| FetchError::Shape(format!("timestamp {ts} out of range")))
}

/// GET `url` and return the body of a successful response.
pub(crate) async fn get_body<Q: Serialize + ?Sized>(
    client: &Client,
    provider: &'static str,
    url: &str,
    query: &Q,
) -> Result<String, FetchError> {
    let res = client.get(url).query(query).send().await?;

    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        return Err(FetchError::Status {
            provider,
            status,
            body: truncate_body(&body),
        });
    }
    Ok(body)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

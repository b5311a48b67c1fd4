//! # Sandbar Bot Core Library
//!
//! This library provides the data structures and pipeline stages for the sandbar
//! bot: a periodic batch job that fetches tide, wave and weather forecasts for a
//! single island, works out the best time to walk the sandbar, and posts the
//! result to a Telegram chat.
//!
//! ## Design Philosophy
//!
//! ### One Run, No State
//! - **Stateless**: every invocation fetches, selects, renders and sends, then exits
//! - **Sequential**: at most three outbound GETs and one POST, one after another
//! - **Best effort**: a failed fetch degrades to placeholders, a failed send is logged
//!
//! ### Time Reference
//! All timestamps are held as UTC instants. Resort-local time is derived only
//! through the configured fixed offset (UTC+7 by default), and only for
//! time-of-day rules and display. Providers are always queried in UTC.
//!
//! ### Data Flow
//! 1. **Fetch**: [`tide_data`], [`marine`] and [`weather`] turn JSON into records
//! 2. **Select**: [`selector`] picks the next low, best daylight low and 08:00 readings
//! 3. **Interpret**: [`status`] maps heights to canned status labels
//! 4. **Render**: [`message`] fills the Markdown template
//! 5. **Deliver**: [`notifier`] posts the text to Telegram
//!
//! ## Core Types
//!
//! - [`Reading`]: a single height at a specific instant
//! - [`Extreme`]: a provider-reported high or low water event
//! - [`TideData`]: extremes plus the hourly height series for one run

use chrono::{DateTime, Utc};

// Module declarations
pub mod config;
pub mod marine;
pub mod message;
pub mod notifier;
pub mod pipeline;
pub mod selector;
pub mod status;
pub mod tide_data;
pub mod weather;

/// A single height measurement at an absolute instant.
///
/// Used for both tide heights (relative to the provider datum) and open-sea
/// wave heights. Heights are in metres.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use sandbar_lib::Reading;
///
/// let reading = Reading {
///     time: Utc.with_ymd_and_hms(2026, 10, 18, 3, 0, 0).unwrap(),
///     height: 0.42,
/// };
/// assert_eq!(reading.height, 0.42);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Reading {
    /// Instant of the measurement (UTC)
    pub time: DateTime<Utc>,
    /// Height in metres
    pub height: f64,
}

/// Whether an extreme is a local maximum or minimum of the tide curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExtremeKind {
    High,
    Low,
}

/// A high or low water event reported by the tide provider.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Extreme {
    pub reading: Reading,
    pub kind: ExtremeKind,
}

impl Extreme {
    pub fn time(&self) -> DateTime<Utc> {
        self.reading.time
    }

    pub fn height(&self) -> f64 {
        self.reading.height
    }

    pub fn is_low(&self) -> bool {
        self.kind == ExtremeKind::Low
    }
}

/// Everything the tide provider returned for one run.
///
/// Both vectors are sorted chronologically by the parser.
#[derive(Clone, Debug, Default)]
pub struct TideData {
    /// High and low water events
    pub extremes: Vec<Extreme>,
    /// Hourly tide heights
    pub heights: Vec<Reading>,
}

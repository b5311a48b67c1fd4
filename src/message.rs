//! # Message Rendering
//!
//! Turns the selected readings into the Telegram message. Rendering is a pure
//! function of the [`Report`]: the same report always produces byte-identical
//! text, and missing pieces are shown as `N/A` rather than dropped.
//!
//! The output uses Telegram's legacy `Markdown` parse mode, so only `*bold*`
//! and backslash escapes are relied on.

use chrono::{DateTime, FixedOffset, Utc};
use std::fmt::Write;

use crate::selector::SelectedWindow;
use crate::status::{beach_status, sandbar_status, sea_state};
use crate::weather::WeatherSample;
use crate::Reading;

/// Placeholder for anything the run could not determine
pub const UNAVAILABLE: &str = "N/A";

/// Everything the renderer needs for one message.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Location name for the header
    pub location: String,
    /// Resort offset used for every displayed time
    pub offset: FixedOffset,
    /// Instant the run considered "now"
    pub generated_at: DateTime<Utc>,
    /// Local hour of the morning readings
    pub morning_hour: u32,
    pub window: SelectedWindow,
    /// Weather at the recommended walking time, if the lookup succeeded
    pub weather: Option<WeatherSample>,
}

impl Report {
    /// The reading the status lines describe: the best daylight walk, or the
    /// next low water when no daylight reading was available.
    pub fn walk_reading(&self) -> Option<Reading> {
        self.window
            .best_walk
            .or_else(|| self.window.next_low.map(|low| low.reading))
    }
}

/// Render the report as a Telegram Markdown message.
pub fn render(report: &Report) -> String {
    if report.window.next_low.is_none() {
        return render_no_data(report);
    }

    let tz = report.offset;
    let w = &report.window;
    let mut out = String::new();

    header(&mut out, report);

    if let Some(low) = w.next_low {
        let _ = writeln!(
            out,
            "🌊 *Next low tide:* {} ({})",
            local_time(low.time(), tz),
            metres(low.height())
        );
    }
    out.push('\n');

    let walk_time = w
        .best_walk
        .map(|r| local_time(r.time, tz))
        .unwrap_or_else(|| UNAVAILABLE.to_string());
    let walk_height = w
        .best_walk
        .map(|r| format!(" ({})", metres(r.height)))
        .unwrap_or_default();
    let _ = writeln!(out, "🚶 *Best time to walk:* {walk_time}{walk_height}");

    match report.walk_reading() {
        Some(r) => {
            let _ = writeln!(out, "Sandbar: {}", sandbar_status(r.height).label());
            let _ = writeln!(out, "Beach: {}", beach_status(r.height).label());
        }
        None => {
            let _ = writeln!(out, "Sandbar: {UNAVAILABLE}");
            let _ = writeln!(out, "Beach: {UNAVAILABLE}");
        }
    }
    out.push('\n');

    let hour = format!("{:02}:00", report.morning_hour);
    let morning_tide = w
        .morning_tide
        .map(|r| metres(r.height))
        .unwrap_or_else(|| UNAVAILABLE.to_string());
    let _ = writeln!(out, "🌅 *Tide at {hour}:* {morning_tide}");

    let sea = w
        .morning_waves
        .map(|r| format!("{}, {}", metres(r.height), sea_state(r.height).label()))
        .unwrap_or_else(|| UNAVAILABLE.to_string());
    let _ = writeln!(out, "🌊 *Sea at {hour}:* {sea}");
    out.push('\n');

    weather_block(&mut out, report.weather.as_ref());

    out.trim_end().to_string()
}

/// Explicit "no data" notification, sent instead of a half-empty report.
fn render_no_data(report: &Report) -> String {
    let mut out = String::new();
    header(&mut out, report);
    out.push_str("⚠️ *No tide data available*\n");
    out.push_str("No upcoming low tide was found in the forecast.\n");
    out.push_str("Check the tide table before heading out.");
    out
}

fn header(out: &mut String, report: &Report) {
    let now = report.generated_at.with_timezone(&report.offset);
    let _ = writeln!(out, "🏝 *{}* sandbar report", escape_markdown(&report.location));
    let _ = writeln!(
        out,
        "📅 {} ({})",
        now.format("%a %d %b %Y, %H:%M"),
        utc_label(report.offset)
    );
    out.push('\n');
}

fn weather_block(out: &mut String, weather: Option<&WeatherSample>) {
    let (temp, humidity, wind) = match weather {
        Some(w) => (
            format!("{:.1}°C", w.temperature_c),
            format!("{:.0}%", w.humidity_pct),
            format!("{:.1} km/h", w.wind_kmh),
        ),
        None => (
            UNAVAILABLE.to_string(),
            UNAVAILABLE.to_string(),
            UNAVAILABLE.to_string(),
        ),
    };
    let _ = writeln!(out, "🌡 Temperature: {temp}");
    let _ = writeln!(out, "💧 Humidity: {humidity}");
    let _ = writeln!(out, "💨 Wind: {wind}");
}

fn local_time(time: DateTime<Utc>, offset: FixedOffset) -> String {
    time.with_timezone(&offset).format("%a %d %b, %H:%M").to_string()
}

fn metres(height: f64) -> String {
    format!("{height:.2} m")
}

/// `UTC+7`, `UTC-3`, `UTC+5:30`
fn utc_label(offset: FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let (hours, minutes) = (secs.abs() / 3600, (secs.abs() % 3600) / 60);
    if minutes == 0 {
        format!("UTC{sign}{hours}")
    } else {
        format!("UTC{sign}{hours}:{minutes:02}")
    }
}

/// Escape characters that legacy Telegram Markdown treats as markup.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

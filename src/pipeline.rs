//! # Run Pipeline
//!
//! Wires the stages together for one invocation:
//! fetch tides → fetch waves → fetch weather → select → render → notify.
//!
//! Nothing here fails the run. Fetch failures arrive as `None` and become
//! placeholders, delivery failures are logged and reported in [`RunOutcome`].

use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::message::{render, Report};
use crate::notifier::Notifier;
use crate::selector::{self, window_length};
use crate::weather::HourlyWeather;
use crate::{marine, tide_data, weather, Reading, TideData};

pub const USER_AGENT: &str = concat!("sandbar-bot/", env!("CARGO_PKG_VERSION"));

/// Shared HTTP client for every outbound call in a run.
pub fn http_client() -> reqwest::Result<Client> {
    Client::builder().user_agent(USER_AGENT).build()
}

/// Provider data for one run; each source is independently optional.
#[derive(Debug, Clone, Default)]
pub struct Fetched {
    pub tide: Option<TideData>,
    pub waves: Option<Vec<Reading>>,
    pub weather: Option<HourlyWeather>,
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// The rendered message text
    pub message: String,
    /// Whether the notifier accepted it
    pub delivered: bool,
}

/// Fetch, select, render and deliver.
pub async fn run<N>(
    client: &Client,
    config: &Config,
    notifier: &N,
    now: DateTime<Utc>,
) -> RunOutcome
where
    N: Notifier + ?Sized,
{
    info!(
        "Sandbar run for {} at {}",
        config.location.name,
        now.with_timezone(&config.offset())
    );
    let fetched = fetch_all(client, config, now).await;
    report_and_notify(&fetched, config, notifier, now).await
}

/// Query the three providers one after another.
pub async fn fetch_all(client: &Client, config: &Config, now: DateTime<Utc>) -> Fetched {
    let tide = tide_data::fetch(client, config, now).await;
    let waves = marine::fetch(client, config).await;
    let weather = weather::fetch(client, config).await;
    Fetched {
        tide,
        waves,
        weather,
    }
}

/// Build the report from already-fetched data, render it and send it.
pub async fn report_and_notify<N>(
    fetched: &Fetched,
    config: &Config,
    notifier: &N,
    now: DateTime<Utc>,
) -> RunOutcome
where
    N: Notifier + ?Sized,
{
    let report = build_report(
        fetched.tide.as_ref(),
        fetched.waves.as_deref(),
        fetched.weather.as_ref(),
        config,
        now,
    );
    log_selection(&report, config);

    let message = render(&report);
    let delivered = deliver(notifier, &message).await;
    RunOutcome { message, delivered }
}

/// Select readings and attach the weather at the walking time.
pub fn build_report(
    tide: Option<&TideData>,
    waves: Option<&[Reading]>,
    weather: Option<&HourlyWeather>,
    config: &Config,
    now: DateTime<Utc>,
) -> Report {
    let window = selector::select(tide, waves, config, now);

    let weather_at = window
        .best_walk
        .map(|r| r.time)
        .or_else(|| window.next_low.map(|low| low.time()));

    let weather = match (weather, weather_at) {
        (Some(hourly), Some(at)) => {
            let sample = hourly.lookup(at);
            if sample.is_none() {
                warn!("No weather in the forecast for {}", at);
            }
            sample
        }
        _ => None,
    };

    Report {
        location: config.location.name.clone(),
        offset: config.offset(),
        generated_at: now,
        morning_hour: config.walk.morning_hour,
        window,
        weather,
    }
}

/// Send the message; failures are logged, never raised.
pub async fn deliver<N>(notifier: &N, message: &str) -> bool
where
    N: Notifier + ?Sized,
{
    match notifier.send(message).await {
        Ok(delivery) => {
            info!(
                "Notification delivered (status {:?}, {})",
                delivery.status,
                delivery.description.as_deref().unwrap_or("no description")
            );
            true
        }
        Err(e) => {
            error!("Notification failed: {}", e);
            false
        }
    }
}

fn log_selection(report: &Report, config: &Config) {
    let w = &report.window;
    match w.next_low {
        Some(low) => info!("Next low tide: {} ({:.2} m)", low.time(), low.height()),
        None => warn!("No future low tide in the data, sending a no-data notice"),
    }
    match w.best_walk {
        Some(r) => info!("Best daylight low: {} ({:.2} m)", r.time, r.height),
        None => warn!(
            "No tide reading inside the {}h daylight window",
            window_length(config.daylight_window()).num_hours()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifier::{Delivery, NotifyError};
    use crate::{Extreme, ExtremeKind};
    use async_trait::async_trait;
    use chrono::{FixedOffset, TimeZone};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<Delivery, NotifyError> {
            self.sent.lock().unwrap().push(text.to_string());
            Ok(Delivery {
                status: Some(200),
                description: None,
            })
        }
    }

    #[derive(Debug)]
    struct RejectingNotifier;

    #[async_trait]
    impl Notifier for RejectingNotifier {
        async fn send(&self, _text: &str) -> Result<Delivery, NotifyError> {
            Err(NotifyError::Rejected {
                status: 401,
                description: "Unauthorized".into(),
            })
        }
    }

    fn local(d: u32, h: u32) -> DateTime<Utc> {
        FixedOffset::east_opt(7 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, d, h, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn tide() -> TideData {
        let heights = (0..48)
            .map(|i| Reading {
                time: local(18, 0) + chrono::Duration::hours(i),
                height: if i == 13 { 0.25 } else { 1.0 },
            })
            .collect();
        TideData {
            extremes: vec![Extreme {
                reading: Reading {
                    time: local(18, 13),
                    height: 0.2,
                },
                kind: ExtremeKind::Low,
            }],
            heights,
        }
    }

    fn weather_at(hour: DateTime<Utc>) -> HourlyWeather {
        HourlyWeather {
            time: vec![hour.format("%Y-%m-%dT%H:%M").to_string()],
            temperature: vec![Some(30.0)],
            humidity: vec![Some(70.0)],
            wind_speed: vec![Some(9.0)],
        }
    }

    #[test]
    fn weather_is_sampled_at_best_walk() {
        let config = Config::default();
        let report = build_report(
            Some(&tide()),
            None,
            Some(&weather_at(local(18, 13))),
            &config,
            local(18, 7),
        );
        assert_eq!(report.window.best_walk.unwrap().time, local(18, 13));
        assert_eq!(report.weather.unwrap().temperature_c, 30.0);
    }

    #[test]
    fn absurd_config_builds_a_report_without_panicking() {
        let mut config: Config = toml::from_str(
            "[location]\nutc_offset_hours = 2147483647\n\n\
             [tides]\nlookback_hours = 9223372036854775807\n\n\
             [walk]\ndaylight_start_hour = 6\ndaylight_end_hour = 4294967295\nmorning_hour = 4294967295",
        )
        .unwrap();

        let report = build_report(Some(&tide()), None, None, &config, local(18, 7));
        let message = render(&report);
        assert!(message.contains("Next low tide"));

        assert_eq!(config.repair().len(), 5);
        let report = build_report(Some(&tide()), None, None, &config, local(18, 7));
        assert_eq!(report.window.best_walk.unwrap().time, local(18, 13));
        assert_eq!(report.window.morning_tide.unwrap().time, local(18, 8));
    }

    #[test]
    fn weather_miss_leaves_placeholder() {
        let config = Config::default();
        let report = build_report(
            Some(&tide()),
            None,
            Some(&weather_at(local(18, 3))),
            &config,
            local(18, 7),
        );
        assert_eq!(report.weather, None);
        assert!(render(&report).contains("🌡 Temperature: N/A"));
    }

    #[tokio::test]
    async fn no_tide_data_sends_no_data_notice() {
        let config = Config::default();
        let notifier = RecordingNotifier::default();

        let outcome =
            report_and_notify(&Fetched::default(), &config, &notifier, local(18, 7)).await;

        assert!(outcome.delivered);
        let sent = notifier.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("No tide data available"));
    }

    #[tokio::test]
    async fn past_lows_only_sends_no_data_notice() {
        let config = Config::default();
        let notifier = RecordingNotifier::default();
        let fetched = Fetched {
            tide: Some(tide()),
            ..Fetched::default()
        };

        // After the only low water
        let outcome = report_and_notify(&fetched, &config, &notifier, local(18, 20)).await;
        assert!(outcome.message.contains("No tide data available"));
    }

    #[tokio::test]
    async fn full_data_sends_report() {
        let config = Config::default();
        let notifier = RecordingNotifier::default();
        let fetched = Fetched {
            tide: Some(tide()),
            waves: Some(vec![Reading {
                time: local(18, 8),
                height: 0.3,
            }]),
            weather: Some(weather_at(local(18, 13))),
        };

        let outcome = report_and_notify(&fetched, &config, &notifier, local(18, 7)).await;

        assert!(outcome.delivered);
        assert!(outcome.message.contains("Sandbar: ✅ Open, dry crossing"));
        assert!(outcome.message.contains("😎 Calm"));
        assert!(outcome.message.contains("🌡 Temperature: 30.0°C"));
        assert_eq!(notifier.sent.lock().unwrap()[0], outcome.message);
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        let config = Config::default();
        let outcome =
            report_and_notify(&Fetched::default(), &config, &RejectingNotifier, local(18, 7))
                .await;
        assert!(!outcome.delivered);
        assert!(!outcome.message.is_empty());
    }

    #[test]
    fn user_agent_names_the_crate() {
        assert!(USER_AGENT.starts_with("sandbar-bot/"));
        assert!(http_client().is_ok());
    }
}

//! # Walking Window Selection
//!
//! Fixed temporal rules that pick the representative readings for a run.
//! Every function takes `now` and the resort offset explicitly so a run is
//! reproducible; nothing here reads the clock.
//!
//! Records stay in UTC. Local time is only used to answer "what time of day
//! is this at the resort" and "which local date is this".

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Timelike, Utc};

use crate::{config::Config, Extreme, Reading, TideData};

/// Local-time range `[start_hour:00, end_hour:00)` considered for walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaylightWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl Default for DaylightWindow {
    fn default() -> Self {
        DaylightWindow {
            start_hour: 6,
            end_hour: 16,
        }
    }
}

impl DaylightWindow {
    /// True when the local time-of-day falls inside the window.
    pub fn contains(&self, local: &DateTime<FixedOffset>) -> bool {
        // Bounds sit on the hour, so the hour alone decides membership
        (self.start_hour..self.end_hour).contains(&local.hour())
    }

    /// Local date the recommendation is for: today, or tomorrow once the
    /// window has closed for the day.
    pub fn target_date(&self, now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
        let local = now.with_timezone(&offset);
        let today = local.date_naive();
        if local.hour() >= self.end_hour {
            today.succ_opt().unwrap_or(today)
        } else {
            today
        }
    }
}

/// Readings chosen for one run. Any slot may be empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectedWindow {
    /// First low water strictly after now
    pub next_low: Option<Extreme>,
    /// Lowest hourly tide inside the daylight window on the target date
    pub best_walk: Option<Reading>,
    /// Tide at the morning hour
    pub morning_tide: Option<Reading>,
    /// Open-sea wave height at the morning hour
    pub morning_waves: Option<Reading>,
}

/// Earliest `Low` extreme with a timestamp strictly after `now`.
pub fn next_low_after_now(extremes: &[Extreme], now: DateTime<Utc>) -> Option<Extreme> {
    extremes
        .iter()
        .filter(|e| e.is_low() && e.time() > now)
        .min_by_key(|e| e.time())
        .copied()
}

/// Lowest reading inside the daylight window on the target date.
///
/// Ties go to the earliest reading.
pub fn best_daytime_low(
    readings: &[Reading],
    window: DaylightWindow,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<Reading> {
    let target = window.target_date(now, offset);

    readings
        .iter()
        .filter(|r| {
            let local = r.time.with_timezone(&offset);
            local.date_naive() == target && window.contains(&local)
        })
        .fold(None, |best: Option<Reading>, r| match best {
            Some(b) if b.height < r.height || (b.height == r.height && b.time <= r.time) => {
                Some(b)
            }
            _ => Some(*r),
        })
}

/// Reading at exactly `hour:00` local time on `target`.
///
/// Without one on that date, the `hour:00` reading nearest to now is used,
/// then the reading nearest to now.
pub fn closest_to_hour(
    readings: &[Reading],
    hour: u32,
    target: NaiveDate,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Option<Reading> {
    let distance = |r: &&Reading| (r.time - now).num_seconds().abs();
    let on_the_hour: Vec<&Reading> = readings
        .iter()
        .filter(|r| {
            let local = r.time.with_timezone(&offset);
            local.hour() == hour && local.minute() == 0
        })
        .collect();

    on_the_hour
        .iter()
        .copied()
        .find(|r| r.time.with_timezone(&offset).date_naive() == target)
        .or_else(|| on_the_hour.iter().copied().min_by_key(distance))
        .or_else(|| readings.iter().min_by_key(distance))
        .copied()
}

/// Run every rule against the fetched data.
pub fn select(
    tide: Option<&TideData>,
    waves: Option<&[Reading]>,
    config: &Config,
    now: DateTime<Utc>,
) -> SelectedWindow {
    let offset = config.offset();
    let morning = config.walk.morning_hour;
    let window = config.daylight_window();
    let target = window.target_date(now, offset);

    let (next_low, best_walk, morning_tide) = match tide {
        Some(data) => (
            next_low_after_now(&data.extremes, now),
            best_daytime_low(&data.heights, window, now, offset),
            closest_to_hour(&data.heights, morning, target, now, offset),
        ),
        None => (None, None, None),
    };

    SelectedWindow {
        next_low,
        best_walk,
        morning_tide,
        morning_waves: waves.and_then(|w| closest_to_hour(w, morning, target, now, offset)),
    }
}

/// Length of the daylight window, handy for log lines.
pub fn window_length(window: DaylightWindow) -> Duration {
    Duration::hours(i64::from(window.end_hour.saturating_sub(window.start_hour)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExtremeKind;
    use chrono::TimeZone;

    fn bkk() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    /// Build a UTC instant from resort-local wall clock values.
    fn local(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        bkk()
            .with_ymd_and_hms(2026, 10, d, h, m, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn reading(time: DateTime<Utc>, height: f64) -> Reading {
        Reading { time, height }
    }

    fn extreme(time: DateTime<Utc>, height: f64, kind: ExtremeKind) -> Extreme {
        Extreme {
            reading: reading(time, height),
            kind,
        }
    }

    fn hourly(day: u32, heights: &[f64]) -> Vec<Reading> {
        heights
            .iter()
            .enumerate()
            .map(|(h, height)| reading(local(day, h as u32, 0), *height))
            .collect()
    }

    #[test]
    fn next_low_skips_past_and_highs() {
        let now = local(18, 9, 0);
        let extremes = vec![
            extreme(local(18, 3, 10), 0.1, ExtremeKind::Low),
            extreme(local(18, 9, 40), 1.6, ExtremeKind::High),
            extreme(local(18, 15, 55), 0.3, ExtremeKind::Low),
            extreme(local(19, 4, 5), 0.2, ExtremeKind::Low),
        ];

        let low = next_low_after_now(&extremes, now).unwrap();
        assert_eq!(low.time(), local(18, 15, 55));
        assert!(low.is_low());
    }

    #[test]
    fn next_low_is_strictly_after_now() {
        let now = local(18, 9, 0);
        let extremes = vec![
            extreme(now, 0.1, ExtremeKind::Low),
            extreme(local(18, 21, 0), 0.4, ExtremeKind::Low),
        ];
        let low = next_low_after_now(&extremes, now).unwrap();
        assert!(low.time() > now);
        assert_eq!(low.time(), local(18, 21, 0));
    }

    #[test]
    fn next_low_none_when_nothing_ahead() {
        let now = local(18, 22, 0);
        let extremes = vec![
            extreme(local(18, 3, 10), 0.1, ExtremeKind::Low),
            extreme(local(18, 23, 0), 1.7, ExtremeKind::High),
        ];
        assert_eq!(next_low_after_now(&extremes, now), None);
        assert_eq!(next_low_after_now(&[], now), None);
    }

    #[test]
    fn next_low_handles_unsorted_input() {
        let now = local(18, 0, 0);
        let extremes = vec![
            extreme(local(19, 4, 0), 0.2, ExtremeKind::Low),
            extreme(local(18, 4, 0), 0.3, ExtremeKind::Low),
        ];
        assert_eq!(
            next_low_after_now(&extremes, now).unwrap().time(),
            local(18, 4, 0)
        );
    }

    #[test]
    fn best_daytime_low_picks_minimum_in_window() {
        let now = local(18, 5, 0);
        let mut heights = vec![1.0; 24];
        heights[3] = 0.05; // before the window
        heights[11] = 0.4;
        heights[13] = 0.2;
        heights[16] = 0.1; // window end is exclusive
        let readings = hourly(18, &heights);

        let best = best_daytime_low(&readings, DaylightWindow::default(), now, bkk()).unwrap();
        assert_eq!(best.time, local(18, 13, 0));
        assert_eq!(best.height, 0.2);
    }

    #[test]
    fn best_daytime_low_rolls_to_tomorrow_after_window() {
        let now = local(18, 16, 30);
        let mut today = vec![0.9; 24];
        today[10] = 0.0;
        let mut tomorrow = vec![0.9; 24];
        tomorrow[7] = 0.35;
        let mut readings = hourly(18, &today);
        readings.extend(hourly(19, &tomorrow));

        let best = best_daytime_low(&readings, DaylightWindow::default(), now, bkk()).unwrap();
        assert_eq!(best.time, local(19, 7, 0));
    }

    #[test]
    fn best_daytime_low_stays_on_today_before_window_end() {
        let now = local(18, 15, 59);
        let window = DaylightWindow::default();
        assert_eq!(
            window.target_date(now, bkk()),
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
        );
    }

    #[test]
    fn target_date_uses_local_not_utc_date() {
        // 23:30 UTC on the 17th is 06:30 on the 18th at the resort
        let now = Utc.with_ymd_and_hms(2026, 10, 17, 23, 30, 0).unwrap();
        assert_eq!(
            DaylightWindow::default().target_date(now, bkk()),
            NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
        );
    }

    #[test]
    fn best_daytime_low_never_leaves_window_or_date() {
        let window = DaylightWindow::default();
        let mut readings = hourly(18, &[0.5; 24]);
        readings.extend(hourly(19, &[0.1; 24]));

        for hour in 0..24 {
            let now = local(18, hour, 15);
            let target = window.target_date(now, bkk());
            if let Some(best) = best_daytime_low(&readings, window, now, bkk()) {
                let at = best.time.with_timezone(&bkk());
                assert_eq!(at.date_naive(), target, "now hour {hour}");
                assert!(window.contains(&at), "now hour {hour}: {at}");
            }
        }
    }

    #[test]
    fn best_daytime_low_ties_go_to_earliest() {
        let now = local(18, 5, 0);
        let readings = hourly(18, &[0.3; 24]);
        let best = best_daytime_low(&readings, DaylightWindow::default(), now, bkk()).unwrap();
        assert_eq!(best.time, local(18, 6, 0));
    }

    #[test]
    fn best_daytime_low_none_without_daylight_readings() {
        let now = local(18, 5, 0);
        let readings = vec![reading(local(18, 2, 0), 0.1), reading(local(18, 20, 0), 0.1)];
        assert_eq!(
            best_daytime_low(&readings, DaylightWindow::default(), now, bkk()),
            None
        );
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    #[test]
    fn closest_to_hour_prefers_exact_match() {
        let now = local(18, 6, 0);
        let readings = hourly(18, &(0..24).map(|h| h as f64 / 10.0).collect::<Vec<_>>());
        let at_eight = closest_to_hour(&readings, 8, day(18), now, bkk()).unwrap();
        assert_eq!(at_eight.time, local(18, 8, 0));
        assert_eq!(at_eight.height, 0.8);
    }

    #[test]
    fn closest_to_hour_uses_target_date_over_nearer_past_match() {
        // 20:00 local: yesterday's and tomorrow's 08:00 are equally far away
        let now = local(18, 20, 0);
        let mut readings = hourly(18, &[0.5; 24]);
        readings.extend(hourly(19, &[0.7; 24]));
        let at_eight = closest_to_hour(&readings, 8, day(19), now, bkk()).unwrap();
        assert_eq!(at_eight.time, local(19, 8, 0));
        assert_eq!(at_eight.height, 0.7);
    }

    #[test]
    fn closest_to_hour_without_target_match_picks_exact_nearest_now() {
        let now = local(19, 1, 0);
        let mut readings = hourly(18, &[0.5; 24]);
        readings.extend(hourly(19, &[0.7; 24]));
        let at_eight = closest_to_hour(&readings, 8, day(25), now, bkk()).unwrap();
        assert_eq!(at_eight.time, local(19, 8, 0));
    }

    #[test]
    fn closest_to_hour_falls_back_to_nearest_now() {
        let now = local(18, 12, 20);
        let readings = vec![
            reading(local(18, 10, 30), 0.1),
            reading(local(18, 12, 30), 0.2),
            reading(local(18, 14, 30), 0.3),
        ];
        let pick = closest_to_hour(&readings, 8, day(18), now, bkk()).unwrap();
        assert_eq!(pick.time, local(18, 12, 30));
        assert_eq!(closest_to_hour(&[], 8, day(18), now, bkk()), None);
    }

    #[test]
    fn select_after_window_reads_tomorrow_morning() {
        let config = Config::default();
        let now = local(18, 17, 0);
        let mut heights = hourly(18, &[0.9; 24]);
        heights.extend(hourly(19, &[0.6; 24]));
        let tide = TideData {
            extremes: Vec::new(),
            heights: heights.clone(),
        };

        let window = select(Some(&tide), Some(&heights), &config, now);
        assert_eq!(window.morning_tide.unwrap().time, local(19, 8, 0));
        assert_eq!(window.morning_waves.unwrap().time, local(19, 8, 0));
    }

    #[test]
    fn absurd_window_hours_do_not_panic() {
        let window = DaylightWindow {
            start_hour: 6,
            end_hour: u32::MAX,
        };
        let at = bkk().with_ymd_and_hms(2026, 10, 18, 23, 59, 0).unwrap();
        assert!(window.contains(&at));
        assert_eq!(window.target_date(local(18, 23, 0), bkk()), day(18));
        assert_eq!(window_length(window).num_hours(), i64::from(u32::MAX - 6));
    }

    #[test]
    fn select_without_tide_data_only_fills_waves() {
        let config = Config::default();
        let now = local(18, 6, 0);
        let waves = hourly(18, &[0.4; 24]);

        let window = select(None, Some(&waves), &config, now);
        assert_eq!(window.next_low, None);
        assert_eq!(window.best_walk, None);
        assert_eq!(window.morning_tide, None);
        assert_eq!(window.morning_waves.unwrap().time, local(18, 8, 0));
    }

    #[test]
    fn window_contains_is_half_open() {
        let window = DaylightWindow::default();
        let tz = bkk();
        assert!(window.contains(&tz.with_ymd_and_hms(2026, 10, 18, 6, 0, 0).unwrap()));
        assert!(window.contains(&tz.with_ymd_and_hms(2026, 10, 18, 15, 59, 0).unwrap()));
        assert!(!window.contains(&tz.with_ymd_and_hms(2026, 10, 18, 16, 0, 0).unwrap()));
        assert!(!window.contains(&tz.with_ymd_and_hms(2026, 10, 18, 5, 59, 0).unwrap()));
        assert_eq!(window_length(window), Duration::hours(10));
    }
}

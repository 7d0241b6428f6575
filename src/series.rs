//! Daily availability series derived from a service record

use crate::record::ServiceRecord;
use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use tracing::debug;

pub const MINUTES_PER_DAY: f64 = 24.0 * 60.0;
pub const DEFAULT_LOOKBACK_DAYS: u32 = 30;

/// Longest accepted window, roughly ten years of days
pub const MAX_LOOKBACK_DAYS: u32 = 3660;

/// Source of "today" for series construction
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Host clock, truncated to the current UTC date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().date_naive()
    }
}

/// Clock pinned to a single day
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub uptime_ratio: f64,
}

/// Fraction of the day the service was up, clamped to [0, 1].
pub fn uptime_ratio(minutes_down: f64) -> f64 {
    if !minutes_down.is_finite() {
        return if minutes_down > 0.0 { 0.0 } else { 1.0 };
    }

    (1.0 - minutes_down / MINUTES_PER_DAY).clamp(0.0, 1.0)
}

/// One point per day for `[today - (lookback_days - 1), today]`, oldest first.
pub fn build_daily_series(
    record: &ServiceRecord,
    lookback_days: u32,
    today: NaiveDate,
) -> Vec<SeriesPoint> {
    let series: Vec<SeriesPoint> = (0..lookback_days)
        .rev()
        .filter_map(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .map(|date| SeriesPoint {
            date,
            uptime_ratio: uptime_ratio(record.minutes_down_on(date)),
        })
        .collect();

    debug!(
        "Built {} day series for {} ending {}",
        series.len(),
        record.name,
        today
    );

    series
}

/// Mean ratio across the window; zero for an empty series.
pub fn mean_ratio(series: &[SeriesPoint]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }

    series.iter().map(|point| point.uptime_ratio).sum::<f64>() / series.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_series_covers_window_in_order() {
        let today = day(2026, 3, 2);
        let record = ServiceRecord::new("API");

        for window in [2u32, 7, 30, 90] {
            let series = build_daily_series(&record, window, today);
            assert_eq!(series.len(), window as usize);
            assert_eq!(series.last().unwrap().date, today);
            assert_eq!(
                series.first().unwrap().date,
                today - Days::new(u64::from(window - 1))
            );
            assert!(series.windows(2).all(|pair| pair[0].date < pair[1].date));
        }
    }

    #[test]
    fn test_window_crosses_month_boundary() {
        let series = build_daily_series(&ServiceRecord::new("API"), 3, day(2026, 3, 1));
        let dates: Vec<NaiveDate> = series.iter().map(|p| p.date).collect();
        assert_eq!(dates, vec![day(2026, 2, 27), day(2026, 2, 28), day(2026, 3, 1)]);
    }

    #[test]
    fn test_sparse_and_out_of_window_entries() {
        let today = day(2026, 10, 17);
        let record = ServiceRecord::new("API")
            .with_minutes_down(day(2026, 10, 10), 144.0)
            .with_minutes_down(day(2026, 1, 1), 1440.0)
            .with_minutes_down(day(2026, 10, 18), 1440.0);

        let series = build_daily_series(&record, 30, today);
        let dipped: Vec<&SeriesPoint> = series.iter().filter(|p| p.uptime_ratio < 1.0).collect();

        assert_eq!(dipped.len(), 1);
        assert_eq!(dipped[0].date, day(2026, 10, 10));
        assert!((dipped[0].uptime_ratio - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_is_clamped() {
        for minutes in [-500.0, -1.0, 0.0, 1.0, 720.0, 1440.0, 2000.0, 1e12, f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let ratio = uptime_ratio(minutes);
            assert!((0.0..=1.0).contains(&ratio), "{} -> {}", minutes, ratio);
        }

        assert_eq!(uptime_ratio(-30.0), 1.0);
        assert_eq!(uptime_ratio(720.0), 0.5);
        assert_eq!(uptime_ratio(2000.0), 0.0);
    }

    #[test]
    fn test_fixed_clock_drives_today() {
        let clock = FixedClock(day(2026, 10, 17));
        let series = build_daily_series(&ServiceRecord::new("API"), 30, clock.today());
        assert_eq!(series.last().unwrap().date, day(2026, 10, 17));
    }

    #[test]
    fn test_mean_ratio() {
        let today = day(2026, 10, 17);
        let record = ServiceRecord::new("API").with_minutes_down(today, 1440.0);
        let series = build_daily_series(&record, 4, today);

        assert!((mean_ratio(&series) - 0.75).abs() < 1e-9);
        assert_eq!(mean_ratio(&[]), 0.0);
    }
}

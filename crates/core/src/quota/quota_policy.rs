//! Pure quota arithmetic. Buckets are calendar buckets in UTC.

use chrono::{DateTime, Datelike, Utc};
use tickerhub_market_data::LimitConfig;

use super::{Granularity, LimitUsage};

/// The configured ceilings of `config`, narrowest window first.
pub fn configured_windows(config: &LimitConfig) -> Vec<(Granularity, u32)> {
    [
        (Granularity::Minute, config.per_minute),
        (Granularity::Day, config.per_day),
        (Granularity::Month, config.per_month),
    ]
    .into_iter()
    .filter_map(|(g, ceiling)| ceiling.map(|c| (g, c)))
    .collect()
}

/// True when `now` falls in a later calendar bucket than `prev`, or when
/// there is no previous use at all.
///
/// A `now` earlier than `prev` (a claim that read its clock before another
/// process committed) counts as the same window, never as a reset.
pub fn is_new_window(prev: Option<DateTime<Utc>>, now: DateTime<Utc>, granularity: Granularity) -> bool {
    let Some(prev) = prev else {
        return true;
    };
    if now < prev {
        return false;
    }

    match granularity {
        Granularity::Minute => prev.timestamp().div_euclid(60) != now.timestamp().div_euclid(60),
        Granularity::Day => prev.date_naive() != now.date_naive(),
        Granularity::Month => (prev.year(), prev.month()) != (now.year(), now.month()),
    }
}

fn effective_used(usage: &LimitUsage, now: DateTime<Utc>, granularity: Granularity) -> u32 {
    if is_new_window(usage.last_used_at, now, granularity) {
        0
    } else {
        usage.used_count
    }
}

/// Whether one more call fits under every configured ceiling.
pub fn can_use(usage: &LimitUsage, config: &LimitConfig, now: DateTime<Utc>) -> bool {
    configured_windows(config)
        .into_iter()
        .all(|(g, ceiling)| effective_used(usage, now, g) < ceiling)
}

/// Usage after recording one call at `now`.
pub fn increment(usage: &LimitUsage, config: &LimitConfig, now: DateTime<Utc>) -> LimitUsage {
    let reset = configured_windows(config)
        .into_iter()
        .any(|(g, _)| is_new_window(usage.last_used_at, now, g))
        || usage.last_used_at.is_none();

    let base = if reset { 0 } else { usage.used_count };
    LimitUsage {
        last_used_at: Some(usage.last_used_at.map_or(now, |prev| prev.max(now))),
        used_count: base.saturating_add(1),
    }
}

/// Calls left before the tightest ceiling binds; `u32::MAX` when unlimited.
pub fn remaining_capacity(usage: &LimitUsage, config: &LimitConfig, now: DateTime<Utc>) -> u32 {
    configured_windows(config)
        .into_iter()
        .map(|(g, ceiling)| ceiling.saturating_sub(effective_used(usage, now, g)))
        .min()
        .unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn per_day(n: u32) -> LimitConfig {
        LimitConfig {
            per_day: Some(n),
            ..LimitConfig::default()
        }
    }

    #[test]
    fn test_no_previous_use_is_new_window() {
        let now = at(2024, 1, 1, 0, 0, 0);
        assert!(is_new_window(None, now, Granularity::Minute));
        assert!(is_new_window(None, now, Granularity::Month));
    }

    #[test]
    fn test_earlier_clock_stays_in_stored_window() {
        let stored = LimitUsage::new(at(2024, 1, 2, 0, 0, 0), 1);
        let late = at(2024, 1, 1, 23, 59, 59);

        assert!(!is_new_window(stored.last_used_at, late, Granularity::Day));
        assert!(!can_use(&stored, &per_day(1), late));

        let next = increment(&stored, &per_day(2), late);
        assert_eq!(next.used_count, 2);
        assert_eq!(next.last_used_at, stored.last_used_at);
    }

    #[test]
    fn test_minute_buckets() {
        let prev = at(2024, 1, 1, 10, 15, 0);
        assert!(!is_new_window(Some(prev), at(2024, 1, 1, 10, 15, 59), Granularity::Minute));
        assert!(is_new_window(Some(prev), at(2024, 1, 1, 10, 16, 0), Granularity::Minute));
    }

    #[test]
    fn test_day_rollover_at_midnight() {
        let prev = at(2024, 3, 4, 23, 59, 59);
        assert!(is_new_window(Some(prev), at(2024, 3, 5, 0, 0, 0), Granularity::Day));
        assert!(!is_new_window(Some(prev), at(2024, 3, 4, 0, 0, 0), Granularity::Day));
    }

    #[test]
    fn test_leap_day_and_year_rollover() {
        let leap = at(2024, 2, 29, 12, 0, 0);
        assert!(!is_new_window(Some(leap), at(2024, 2, 29, 23, 59, 59), Granularity::Day));
        assert!(is_new_window(Some(leap), at(2024, 3, 1, 0, 0, 0), Granularity::Month));

        let new_year = at(2023, 12, 31, 23, 59, 59);
        assert!(is_new_window(Some(new_year), at(2024, 1, 1, 0, 0, 0), Granularity::Month));
        // Same month number, different year.
        assert!(is_new_window(Some(at(2023, 5, 10, 0, 0, 0)), at(2024, 5, 10, 0, 0, 0), Granularity::Month));
    }

    #[test]
    fn test_under_ceiling_is_usable_until_increment_reaches_it() {
        let now = at(2024, 6, 1, 12, 0, 0);
        let usage = LimitUsage::new(now, 4);
        let config = per_day(5);

        assert!(can_use(&usage, &config, now));
        let next = increment(&usage, &config, now);
        assert_eq!(next.used_count, 5);
        assert!(!can_use(&next, &config, now));
    }

    #[test]
    fn test_day_rollover_resets_counter() {
        let usage = LimitUsage::new(at(2024, 6, 1, 23, 59, 59), 5);
        let config = per_day(5);
        let next_day = at(2024, 6, 2, 0, 0, 0);

        assert!(can_use(&usage, &config, next_day));
        assert_eq!(increment(&usage, &config, next_day).used_count, 1);
    }

    #[test]
    fn test_minute_and_month_rollover_reset_counter() {
        let minute = LimitConfig {
            per_minute: Some(5),
            ..LimitConfig::default()
        };
        let usage = LimitUsage::new(at(2024, 6, 1, 8, 0, 59), 5);
        let later = at(2024, 6, 1, 8, 1, 0);
        assert!(can_use(&usage, &minute, later));
        assert_eq!(increment(&usage, &minute, later).used_count, 1);

        let month = LimitConfig {
            per_month: Some(100),
            ..LimitConfig::default()
        };
        let usage = LimitUsage::new(at(2024, 6, 30, 23, 59, 59), 100);
        let later = at(2024, 7, 1, 0, 0, 0);
        assert!(can_use(&usage, &month, later));
        assert_eq!(increment(&usage, &month, later).used_count, 1);
    }

    #[test]
    fn test_daily_ceiling_binds_before_monthly() {
        let now = at(2024, 6, 15, 10, 0, 0);
        let usage = LimitUsage::new(now, 25);
        let config = LimitConfig {
            per_day: Some(25),
            per_month: Some(500),
            ..LimitConfig::default()
        };

        assert!(!can_use(&usage, &config, now));
        assert_eq!(remaining_capacity(&usage, &config, now), 0);
    }

    #[test]
    fn test_unlimited_is_always_usable() {
        let now = at(2024, 6, 15, 10, 0, 0);
        let usage = LimitUsage::new(now, 1_000_000);
        let config = LimitConfig::unlimited();

        assert!(can_use(&usage, &config, now));
        assert_eq!(remaining_capacity(&usage, &config, now), u32::MAX);
        assert_eq!(increment(&usage, &config, now).used_count, 1_000_001);
    }

    #[test]
    fn test_first_increment_starts_at_one() {
        let now = at(2024, 6, 15, 10, 0, 0);
        let next = increment(&LimitUsage::default(), &LimitConfig::unlimited(), now);
        assert_eq!(next, LimitUsage::new(now, 1));
    }

    #[test]
    fn test_remaining_capacity_takes_minimum() {
        let now = at(2024, 6, 15, 10, 0, 30);
        let usage = LimitUsage::new(at(2024, 6, 15, 10, 0, 0), 3);
        let config = LimitConfig {
            per_minute: Some(5),
            per_day: Some(4),
            per_month: None,
        };
        assert_eq!(remaining_capacity(&usage, &config, now), 1);

        // Minute window rolled, day window did not.
        let next_minute = at(2024, 6, 15, 10, 1, 0);
        assert_eq!(remaining_capacity(&usage, &config, next_minute), 1);
    }

    #[test]
    fn test_lowered_ceiling_saturates_at_zero() {
        let now = at(2024, 6, 15, 10, 0, 0);
        let usage = LimitUsage::new(now, 30);
        assert_eq!(remaining_capacity(&usage, &per_day(25), now), 0);
    }
}

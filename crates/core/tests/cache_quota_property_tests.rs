//! Property-based integration tests for TTL entries, the local cache and the
//! quota policy.
//!
//! These tests verify that universal properties hold across all valid inputs,
//! using the `proptest` crate for random test case generation.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use tickerhub_core::cache::{LocalCache, TtlEntry};
use tickerhub_core::quota::quota_policy::{can_use, increment, is_new_window, remaining_capacity};
use tickerhub_core::quota::{Granularity, LimitUsage};
use tickerhub_core::ManualClock;
use tickerhub_market_data::LimitConfig;

// =============================================================================
// Generators
// =============================================================================

/// Instants between 2000-01-01 and 2040-01-01, whole seconds.
fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (946_684_800i64..2_208_988_800i64).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn arb_granularity() -> impl Strategy<Value = Granularity> {
    prop_oneof![
        Just(Granularity::Minute),
        Just(Granularity::Day),
        Just(Granularity::Month),
    ]
}

fn arb_limit() -> impl Strategy<Value = LimitConfig> {
    (
        proptest::option::of(1u32..100),
        proptest::option::of(1u32..1000),
        proptest::option::of(1u32..10_000),
    )
        .prop_map(|(per_minute, per_day, per_month)| LimitConfig {
            per_minute,
            per_day,
            per_month,
        })
}

fn arb_usage() -> impl Strategy<Value = LimitUsage> {
    (proptest::option::of(arb_instant()), 0u32..20_000).prop_map(|(last_used_at, used_count)| {
        LimitUsage {
            last_used_at,
            used_count,
        }
    })
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// An entry is expired exactly when its age reaches the TTL.
    #[test]
    fn prop_ttl_boundary(created in arb_instant(), ttl_secs in 0i64..100_000, age_secs in 0i64..200_000) {
        let entry = TtlEntry::new((), created, Duration::seconds(ttl_secs));
        let now = created + Duration::seconds(age_secs);
        prop_assert_eq!(entry.is_expired(now), age_secs >= ttl_secs);
        prop_assert_eq!(entry.is_valid(now), !entry.is_expired(now));
    }

    /// The local cache never holds more than its capacity, and after inserting
    /// `n` distinct keys exactly the last `capacity` remain.
    #[test]
    fn prop_local_cache_fifo_capacity(capacity in 1usize..20, n in 0usize..60) {
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let cache = LocalCache::new(capacity, Duration::hours(1), clock);

        for i in 0..n {
            cache.put(&format!("k{}", i), i);
            prop_assert!(cache.len() <= capacity);
        }

        let kept_from = n.saturating_sub(capacity);
        for i in 0..n {
            let present = cache.get(&format!("k{}", i), false).is_some();
            prop_assert_eq!(present, i >= kept_from);
        }
    }

    /// A later instant opens a new bucket iff it differs on the calendar
    /// fields of that granularity; an earlier one never does.
    #[test]
    fn prop_window_matches_calendar_fields(a in arb_instant(), b in arb_instant(), g in arb_granularity()) {
        use chrono::{Datelike, Timelike};
        let same = match g {
            Granularity::Minute => (a.date_naive(), a.hour(), a.minute()) == (b.date_naive(), b.hour(), b.minute()),
            Granularity::Day => a.date_naive() == b.date_naive(),
            Granularity::Month => (a.year(), a.month()) == (b.year(), b.month()),
        };
        prop_assert_eq!(is_new_window(Some(a), b, g), !same && b > a);
    }

    /// A usable provider stays within every ceiling after one increment.
    #[test]
    fn prop_increment_respects_ceilings(usage in arb_usage(), limit in arb_limit(), now in arb_instant()) {
        prop_assume!(usage.last_used_at.map_or(true, |t| t <= now));
        if can_use(&usage, &limit, now) {
            let next = increment(&usage, &limit, now);
            prop_assert_eq!(next.last_used_at, Some(now));
            for ceiling in [limit.per_minute, limit.per_day, limit.per_month].into_iter().flatten() {
                prop_assert!(next.used_count <= ceiling);
            }
        }
    }

    /// Remaining capacity is positive exactly when the provider is usable.
    #[test]
    fn prop_remaining_capacity_agrees_with_can_use(usage in arb_usage(), limit in arb_limit(), now in arb_instant()) {
        prop_assert_eq!(remaining_capacity(&usage, &limit, now) > 0, can_use(&usage, &limit, now));
    }

    /// Claiming repeatedly within one minute grants exactly the tightest ceiling.
    #[test]
    fn prop_claims_within_a_minute_stop_at_tightest_ceiling(limit in arb_limit(), start in arb_instant()) {
        prop_assume!(!limit.is_unlimited());
        let tightest = [limit.per_minute, limit.per_day, limit.per_month]
            .into_iter()
            .flatten()
            .min()
            .unwrap();

        let mut usage = LimitUsage::default();
        let mut granted = 0u32;
        for _ in 0..(tightest + 5) {
            if can_use(&usage, &limit, start) {
                usage = increment(&usage, &limit, start);
                granted += 1;
            }
        }
        prop_assert_eq!(granted, tightest);
    }
}

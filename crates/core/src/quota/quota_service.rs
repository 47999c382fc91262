use std::sync::Arc;

use log::{debug, info};
use tickerhub_market_data::{LimitConfig, Provider};

use super::quota_policy::{can_use, increment, remaining_capacity};
use super::{LimitUsage, QuotaStatus, QuotaStore};
use crate::clock::Clock;
use crate::errors::Result;
use crate::routing::RoutingConfig;

/// Tracks provider usage against configured ceilings.
pub struct QuotaTracker {
    store: Arc<dyn QuotaStore>,
    clock: Arc<dyn Clock>,
}

impl QuotaTracker {
    pub fn new(store: Arc<dyn QuotaStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Checks capacity and claims one call in a single transaction.
    ///
    /// The clock is read inside the update, while the store holds the record,
    /// so a claim queued behind another never judges the window by an older
    /// instant.
    ///
    /// Returns the new usage, or `None` without touching the stored record
    /// when the provider is at capacity.
    pub async fn try_increment_usage(
        &self,
        provider: Provider,
        config: &LimitConfig,
    ) -> Result<Option<LimitUsage>> {
        let clock = Arc::clone(&self.clock);
        let limit = *config;

        let claimed = self
            .store
            .update_usage(
                provider,
                Box::new(move |usage| {
                    let now = clock.now();
                    if can_use(&usage, &limit, now) {
                        Some(increment(&usage, &limit, now))
                    } else {
                        None
                    }
                }),
            )
            .await?;

        match &claimed {
            Some(usage) => debug!("{}: claimed quota, used {}", provider, usage.used_count),
            None => debug!("{}: no quota left", provider),
        }
        Ok(claimed)
    }

    pub async fn get_usage(&self, provider: Provider) -> Result<LimitUsage> {
        Ok(self.store.get_usage(provider).await?.unwrap_or_default())
    }

    pub async fn get_all_usage(&self) -> Result<Vec<(Provider, LimitUsage)>> {
        self.store.get_all_usage().await
    }

    pub async fn reset_usage(&self, provider: Provider) -> Result<()> {
        self.store.reset_usage(provider).await?;
        info!("Quota usage reset for {}", provider);
        Ok(())
    }

    pub async fn reset_all_usage(&self) -> Result<()> {
        self.store.reset_all_usage().await?;
        info!("Quota usage reset for all providers");
        Ok(())
    }

    pub async fn remaining_capacity(&self, provider: Provider, config: &LimitConfig) -> Result<u32> {
        let usage = self.get_usage(provider).await?;
        Ok(remaining_capacity(&usage, config, self.clock.now()))
    }

    /// Usage and headroom of every provider in `config`, in provider order.
    pub async fn usage_report(&self, config: &RoutingConfig) -> Result<Vec<QuotaStatus>> {
        let now = self.clock.now();
        let stored: std::collections::HashMap<Provider, LimitUsage> =
            self.store.get_all_usage().await?.into_iter().collect();

        let mut providers: Vec<_> = config.providers.iter().collect();
        providers.sort_by_key(|(provider, _)| **provider);

        Ok(providers
            .into_iter()
            .map(|(provider, provider_config)| {
                let usage = stored.get(provider).copied().unwrap_or_default();
                let limit = &provider_config.limit;
                QuotaStatus {
                    provider: *provider,
                    usage,
                    remaining: (!limit.is_unlimited())
                        .then(|| remaining_capacity(&usage, limit, now)),
                    available: can_use(&usage, limit, now),
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::quota::InMemoryQuotaStore;
    use chrono::{Duration, TimeZone, Utc};
    use tickerhub_market_data::ProviderConfig;

    fn setup() -> (Arc<ManualClock>, Arc<InMemoryQuotaStore>, QuotaTracker) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 0).unwrap(),
        ));
        let store = Arc::new(InMemoryQuotaStore::new());
        let tracker = QuotaTracker::new(store.clone(), clock.clone());
        (clock, store, tracker)
    }

    fn per_day(n: u32) -> LimitConfig {
        LimitConfig {
            per_day: Some(n),
            ..LimitConfig::default()
        }
    }

    #[tokio::test]
    async fn test_claims_until_ceiling() {
        let (_, _, tracker) = setup();
        let limit = per_day(2);

        assert!(tracker.try_increment_usage(Provider::Finnhub, &limit).await.unwrap().is_some());
        assert!(tracker.try_increment_usage(Provider::Finnhub, &limit).await.unwrap().is_some());
        assert!(tracker.try_increment_usage(Provider::Finnhub, &limit).await.unwrap().is_none());
        assert_eq!(tracker.get_usage(Provider::Finnhub).await.unwrap().used_count, 2);
    }

    #[tokio::test]
    async fn test_refused_claim_does_not_mutate() {
        let (clock, store, tracker) = setup();
        let before = LimitUsage::new(clock.now() - Duration::seconds(30), 5);
        store.set(Provider::AlphaVantage, before);

        let claimed = tracker
            .try_increment_usage(Provider::AlphaVantage, &per_day(5))
            .await
            .unwrap();

        assert!(claimed.is_none());
        assert_eq!(tracker.get_usage(Provider::AlphaVantage).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_claim_after_midnight_restarts_count() {
        let (clock, _, tracker) = setup();
        let limit = per_day(1);
        assert!(tracker.try_increment_usage(Provider::Finnhub, &limit).await.unwrap().is_some());
        assert!(tracker.try_increment_usage(Provider::Finnhub, &limit).await.unwrap().is_none());

        clock.advance(Duration::minutes(1));
        let usage = tracker
            .try_increment_usage(Provider::Finnhub, &limit)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(usage.used_count, 1);
        assert_eq!(usage.last_used_at, Some(clock.now()));
    }

    /// Commits a competing claim, stamped by the advanced clock, before
    /// applying the queued update.
    struct InterleavingStore {
        inner: Arc<InMemoryQuotaStore>,
        clock: Arc<ManualClock>,
        advance_to: std::sync::Mutex<Option<chrono::DateTime<Utc>>>,
    }

    #[async_trait::async_trait]
    impl QuotaStore for InterleavingStore {
        async fn get_usage(&self, provider: Provider) -> Result<Option<LimitUsage>> {
            self.inner.get_usage(provider).await
        }

        async fn update_usage(
            &self,
            provider: Provider,
            update: crate::quota::UsageUpdate,
        ) -> Result<Option<LimitUsage>> {
            let advance_to = self.advance_to.lock().unwrap().take();
            if let Some(at) = advance_to {
                self.clock.set(at);
                self.inner
                    .update_usage(provider, Box::new(move |u| Some(increment_at(u, at))))
                    .await?;
            }
            self.inner.update_usage(provider, update).await
        }

        async fn reset_usage(&self, provider: Provider) -> Result<()> {
            self.inner.reset_usage(provider).await
        }

        async fn reset_all_usage(&self) -> Result<()> {
            self.inner.reset_all_usage().await
        }

        async fn get_all_usage(&self) -> Result<Vec<(Provider, LimitUsage)>> {
            self.inner.get_all_usage().await
        }
    }

    fn increment_at(usage: LimitUsage, at: chrono::DateTime<Utc>) -> LimitUsage {
        crate::quota::quota_policy::increment(&usage, &per_day(1), at)
    }

    #[tokio::test]
    async fn test_claim_overtaken_by_next_day_claim_is_refused() {
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 23, 59, 59).unwrap();
        let midnight = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(late));
        let inner = Arc::new(InMemoryQuotaStore::new());
        inner.set(Provider::Finnhub, LimitUsage::new(late - Duration::hours(1), 1));

        let store = Arc::new(InterleavingStore {
            inner: inner.clone(),
            clock: clock.clone(),
            advance_to: std::sync::Mutex::new(Some(midnight)),
        });
        let tracker = QuotaTracker::new(store, clock);

        let claimed = tracker
            .try_increment_usage(Provider::Finnhub, &per_day(1))
            .await
            .unwrap();

        assert!(claimed.is_none());
        assert_eq!(
            inner.get_usage(Provider::Finnhub).await.unwrap(),
            Some(LimitUsage::new(midnight, 1))
        );
    }

    #[tokio::test]
    async fn test_stored_claim_ahead_of_clock_counts_in_its_window() {
        let (clock, store, tracker) = setup();
        let ahead = clock.now() + Duration::minutes(5);
        store.set(Provider::Finnhub, LimitUsage::new(ahead, 1));

        let claimed = tracker
            .try_increment_usage(Provider::Finnhub, &per_day(1))
            .await
            .unwrap();

        assert!(claimed.is_none());
        assert_eq!(
            tracker.get_usage(Provider::Finnhub).await.unwrap(),
            LimitUsage::new(ahead, 1)
        );
    }

    #[tokio::test]
    async fn test_concurrent_claims_never_exceed_ceiling() {
        let (_, _, tracker) = setup();
        let tracker = Arc::new(tracker);
        let limit = per_day(10);

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let tracker = tracker.clone();
                tokio::spawn(async move {
                    tracker
                        .try_increment_usage(Provider::Polygon, &limit)
                        .await
                        .unwrap()
                        .is_some()
                })
            })
            .collect();

        let mut granted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                granted += 1;
            }
        }
        assert_eq!(granted, 10);
    }

    #[tokio::test]
    async fn test_reset_usage() {
        let (_, _, tracker) = setup();
        let limit = per_day(1);
        tracker.try_increment_usage(Provider::Finnhub, &limit).await.unwrap();
        tracker.try_increment_usage(Provider::Marketaux, &limit).await.unwrap();

        tracker.reset_usage(Provider::Finnhub).await.unwrap();
        assert_eq!(tracker.get_usage(Provider::Finnhub).await.unwrap(), LimitUsage::default());
        assert_eq!(tracker.get_all_usage().await.unwrap().len(), 1);

        tracker.reset_all_usage().await.unwrap();
        assert!(tracker.get_all_usage().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_usage_report() {
        let (_, _, tracker) = setup();
        let mut config = RoutingConfig::default();
        config.providers.insert(
            Provider::AlphaVantage,
            ProviderConfig::new("https://av", "k", per_day(25)),
        );
        config.providers.insert(
            Provider::Finnhub,
            ProviderConfig::new("https://fh", "k", LimitConfig::unlimited()),
        );
        tracker
            .try_increment_usage(Provider::AlphaVantage, &per_day(25))
            .await
            .unwrap();

        let report = tracker.usage_report(&config).await.unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].provider, Provider::Finnhub);
        assert_eq!(report[0].remaining, None);
        assert_eq!(report[1].provider, Provider::AlphaVantage);
        assert_eq!(report[1].remaining, Some(24));
        assert!(report[1].available);
        assert_eq!(
            tracker
                .remaining_capacity(Provider::AlphaVantage, &per_day(25))
                .await
                .unwrap(),
            24
        );
    }
}

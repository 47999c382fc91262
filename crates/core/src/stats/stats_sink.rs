use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use log::{debug, warn};
use tickerhub_market_data::Provider;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{ProviderStats, StatKind, StatsEvent, StatsSink, StatsStore};
use crate::clock::Clock;
use crate::errors::Result;

/// Drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpStatsSink;

impl StatsSink for NoOpStatsSink {
    fn record_selection(&self, _provider: Provider) {}

    fn record_failure(&self, _provider: Provider) {}
}

/// Counts events in memory; used by tests to assert on routing outcomes.
#[derive(Debug, Default)]
pub struct MockStatsSink {
    events: Mutex<Vec<(Provider, StatKind)>>,
}

impl MockStatsSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(Provider, StatKind)>> {
        self.events.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub fn events(&self) -> Vec<(Provider, StatKind)> {
        self.lock().clone()
    }

    pub fn count(&self, provider: Provider, kind: StatKind) -> usize {
        self.lock()
            .iter()
            .filter(|(p, k)| *p == provider && *k == kind)
            .count()
    }
}

impl StatsSink for MockStatsSink {
    fn record_selection(&self, provider: Provider) {
        self.lock().push((provider, StatKind::Selection));
    }

    fn record_failure(&self, provider: Provider) {
        self.lock().push((provider, StatKind::Failure));
    }
}

/// Hands events to a background worker over an unbounded channel.
#[derive(Clone)]
pub struct ChannelStatsSink {
    tx: mpsc::UnboundedSender<StatsEvent>,
    clock: Arc<dyn Clock>,
}

impl ChannelStatsSink {
    fn send(&self, provider: Provider, kind: StatKind) {
        let event = StatsEvent {
            provider,
            kind,
            at: self.clock.now(),
        };
        if self.tx.send(event).is_err() {
            debug!("Stats worker stopped; dropping {:?} for {}", kind, provider);
        }
    }
}

impl StatsSink for ChannelStatsSink {
    fn record_selection(&self, provider: Provider) {
        self.send(provider, StatKind::Selection);
    }

    fn record_failure(&self, provider: Provider) {
        self.send(provider, StatKind::Failure);
    }
}

/// Spawns the worker that drains events into `store`.
///
/// The worker exits once every sink clone is dropped.
pub fn spawn_stats_worker(
    store: Arc<dyn StatsStore>,
    clock: Arc<dyn Clock>,
) -> (ChannelStatsSink, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<StatsEvent>();

    let handle = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            if let Err(e) = store.record(event).await {
                warn!("Failed to record {:?} for {}: {}", event.kind, event.provider, e);
            }
        }
        debug!("Stats worker finished");
    });

    (ChannelStatsSink { tx, clock }, handle)
}

/// Process-local [`StatsStore`].
#[derive(Default)]
pub struct InMemoryStatsStore {
    stats: Mutex<HashMap<Provider, ProviderStats>>,
}

impl InMemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatsStore for InMemoryStatsStore {
    async fn record(&self, event: StatsEvent) -> Result<()> {
        self.stats
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .entry(event.provider)
            .or_insert_with(|| ProviderStats::empty(event.provider))
            .apply(event.kind, event.at);
        Ok(())
    }

    async fn all_stats(&self) -> Result<Vec<ProviderStats>> {
        let mut all: Vec<_> = self
            .stats
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .values()
            .cloned()
            .collect();
        all.sort_by_key(|s| s.provider);
        Ok(all)
    }
}

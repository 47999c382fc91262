//! Provider selection and failure statistics.

mod stats_model;
mod stats_sink;
mod stats_traits;

pub use stats_model::{ProviderStats, StatKind, StatsEvent};
pub use stats_sink::{
    spawn_stats_worker, ChannelStatsSink, InMemoryStatsStore, MockStatsSink, NoOpStatsSink,
};
pub use stats_traits::{StatsSink, StatsStore};

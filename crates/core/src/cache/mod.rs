//! TTL caching: the entry model, a bounded in-process layer, a durable layer
//! over a pluggable store, the two-layer pipeline and the startup janitor.

mod cache_janitor;
mod cache_namespace;
mod cache_pipeline;
mod durable_cache;
mod durable_traits;
mod local_cache;
mod memory_store;
mod ttl_entry;

pub use cache_janitor::{CacheJanitor, JanitorReport};
pub use cache_namespace::{CacheNamespace, CacheSettings};
pub use cache_pipeline::CachePipeline;
pub use durable_cache::{sanitize_key, DurableCache, MAX_KEY_BYTES};
pub use durable_traits::{DurableStore, ExpiringCache};
pub use local_cache::LocalCache;
pub use memory_store::InMemoryDurableStore;
pub use ttl_entry::TtlEntry;

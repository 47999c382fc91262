//! Quota-aware provider routing.

mod provider_adapters;
mod provider_router;
mod router_caches;
mod selection;


pub use provider_adapters::ProviderAdapters;
pub use provider_router::ProviderRouter;
pub use router_caches::RouterCaches;
pub use selection::{SelectionDiagnostics, SkipReason};

//! TickerHub Core - caching, quotas and provider routing.
//!
//! This crate contains the routing logic for TickerHub. It is
//! database-agnostic and defines store traits that are implemented
//! by the `storage-sqlite` crate.

pub mod cache;
pub mod clock;
pub mod errors;
pub mod quota;
pub mod router;
pub mod routing;
pub mod stats;

// Re-export error types
pub use errors::Error;
pub use errors::Result;

pub use clock::{Clock, ManualClock, SystemClock};
pub use router::{ProviderAdapters, ProviderRouter, RouterCaches};

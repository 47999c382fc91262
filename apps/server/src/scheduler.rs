//! Background cache maintenance.
//!
//! Expired durable rows are swept once at startup; reads purge anything that
//! expires later, so no periodic task is needed.

use std::sync::Arc;
use tracing::{info, warn};

use crate::main_lib::AppState;

/// Spawns the one-shot startup sweep without waiting for it.
pub fn start_cache_janitor(state: Arc<AppState>) {
    let sweep = state.janitor.spawn_startup_cleanup();
    tokio::spawn(async move {
        match sweep.await {
            Ok(report) if report.failed.is_empty() => {
                info!(
                    "Startup cache sweep removed {} expired entries",
                    report.total_removed()
                );
            }
            Ok(report) => {
                warn!(
                    "Startup cache sweep removed {} expired entries; {} cache(s) failed",
                    report.total_removed(),
                    report.failed.len()
                );
            }
            Err(e) => warn!("Startup cache sweep task did not complete: {}", e),
        }
    });
}

//! Provider selection diagnostics.

use std::fmt;

use tickerhub_market_data::Provider;

/// Why a ranked provider was passed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// No adapter implements the operation for this provider.
    NoAdapter,

    /// The priority table names it but no `ProviderConfig` is loaded.
    NotConfigured,

    /// Quota claim refused.
    NoCapacity,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SkipReason::NoAdapter => "no adapter",
            SkipReason::NotConfigured => "not configured",
            SkipReason::NoCapacity => "no capacity",
        };
        f.write_str(s)
    }
}

/// Walk of the priority list for one request.
#[derive(Clone, Debug, Default)]
pub struct SelectionDiagnostics {
    pub skipped: Vec<(Provider, SkipReason)>,
    pub selected: Option<Provider>,
}

impl SelectionDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_skip(&mut self, provider: Provider, reason: SkipReason) {
        self.skipped.push((provider, reason));
    }

    pub fn record_selected(&mut self, provider: Provider) {
        self.selected = Some(provider);
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        let mut parts: Vec<String> = self
            .skipped
            .iter()
            .map(|(p, reason)| format!("{}: SKIPPED ({})", p, reason))
            .collect();
        if let Some(p) = self.selected {
            parts.push(format!("{}: SELECTED", p));
        }
        if parts.is_empty() {
            return "no ranked providers".to_string();
        }
        parts.join(" -> ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary() {
        let mut diag = SelectionDiagnostics::new();
        assert_eq!(diag.summary(), "no ranked providers");

        diag.record_skip(Provider::AlphaVantage, SkipReason::NoCapacity);
        diag.record_skip(Provider::Polygon, SkipReason::NotConfigured);
        diag.record_selected(Provider::Finnhub);

        assert_eq!(
            diag.summary(),
            "ALPHA_VANTAGE: SKIPPED (no capacity) -> POLYGON: SKIPPED (not configured) -> FINNHUB: SELECTED"
        );
    }
}

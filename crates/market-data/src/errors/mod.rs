//! Error types for the market data crate.
//!
//! [`MarketDataError`] covers everything a provider adapter can fail with.
//! Some failures are recoverable at the adapter boundary (see
//! [`MarketDataError::is_recoverable`]): adapters turn those into an empty
//! result instead of surfacing them to the router.

use thiserror::Error;

/// Errors that can occur while calling a market data provider.
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// The provider rate limited the request (HTTP 429, quota notes).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The provider rejected the configured API key.
    #[error("Unauthorized: {provider}")]
    Unauthorized {
        /// The provider that rejected the key
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// A provider-specific error occurred.
    #[error("Provider error: {provider} - {message}")]
    ProviderError {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider answered with a body we could not interpret.
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse {
        provider: String,
        message: String,
    },

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Whether an adapter should swallow this error and answer with an empty
    /// result instead.
    ///
    /// Rate-limit and rejected-key answers are vendor states the caller can
    /// do nothing about within the request; everything else propagates.
    ///
    /// # Examples
    ///
    /// ```
    /// use tickerhub_market_data::errors::MarketDataError;
    ///
    /// let error = MarketDataError::RateLimited { provider: "FINNHUB".to_string() };
    /// assert!(error.is_recoverable());
    ///
    /// let error = MarketDataError::Timeout { provider: "FINNHUB".to_string() };
    /// assert!(!error.is_recoverable());
    /// ```
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Unauthorized { .. })
    }

    /// Provider id attached to the error, when there is one.
    pub fn provider(&self) -> Option<&str> {
        match self {
            Self::RateLimited { provider }
            | Self::Unauthorized { provider }
            | Self::Timeout { provider }
            | Self::ProviderError { provider, .. }
            | Self::InvalidResponse { provider, .. } => Some(provider),
            Self::Network(_) => None,
        }
    }
}

//! Per-provider connection and quota policy.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Quota ceilings for one provider.
///
/// Each ceiling is optional; a config with none set is unlimited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_minute: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_day: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_month: Option<u32>,
}

impl LimitConfig {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn is_unlimited(&self) -> bool {
        self.per_minute.is_none() && self.per_day.is_none() && self.per_month.is_none()
    }
}

/// Connection details and quota policy for one provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub base_uri: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default)]
    pub limit: LimitConfig,
}

impl ProviderConfig {
    pub fn new(base_uri: impl Into<String>, api_key: impl Into<String>, limit: LimitConfig) -> Self {
        Self {
            base_uri: base_uri.into(),
            api_key: api_key.into(),
            limit,
        }
    }

    /// Base URI without a trailing slash, ready for path concatenation.
    pub fn base(&self) -> &str {
        self.base_uri.trim_end_matches('/')
    }
}

// Keeps API keys out of debug logs.
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_uri", &self.base_uri)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("limit", &self.limit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_config_unlimited() {
        assert!(LimitConfig::unlimited().is_unlimited());
        let limited = LimitConfig {
            per_day: Some(25),
            ..LimitConfig::default()
        };
        assert!(!limited.is_unlimited());
    }

    #[test]
    fn test_provider_config_parses_camel_case() {
        let json = r#"{
            "baseUri": "https://finnhub.io/api/v1/",
            "apiKey": "secret",
            "limit": { "perMinute": 60 }
        }"#;
        let config: ProviderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.base(), "https://finnhub.io/api/v1");
        assert_eq!(config.limit.per_minute, Some(60));
        assert_eq!(config.limit.per_day, None);
    }

    #[test]
    fn test_debug_masks_api_key() {
        let config = ProviderConfig::new("https://example.com", "secret", LimitConfig::default());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("***"));
    }
}

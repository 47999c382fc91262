use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use tickerhub_core::cache::CacheSettings;

/// Process configuration, read from `TH_*` environment variables.
#[derive(Clone, Debug)]
pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub providers_file: String,
    /// `None` when `TH_PROVIDER_TIMEOUT_MS` is 0.
    pub provider_timeout: Option<Duration>,
    pub cache: CacheSettings,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = CacheSettings::default();
        let timeout_ms: u64 = env_or("TH_PROVIDER_TIMEOUT_MS", 10_000);

        Self {
            listen_addr: env_or("TH_LISTEN_ADDR", SocketAddr::from(([0, 0, 0, 0], 8080))),
            db_path: env_or("TH_DB_PATH", "./db/tickerhub.db".to_string()),
            providers_file: env_or("TH_PROVIDERS_FILE", "./providers.json".to_string()),
            provider_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
            cache: CacheSettings {
                local_capacity: env_or("TH_LOCAL_CACHE_CAPACITY", defaults.local_capacity),
                search_ttl: secs_or("TH_SEARCH_TTL_SECS", defaults.search_ttl),
                news_ttl: secs_or("TH_NEWS_TTL_SECS", defaults.news_ttl),
                info_ttl: secs_or("TH_INFO_TTL_SECS", defaults.info_ttl),
            },
            request_timeout: Duration::from_millis(env_or("TH_REQUEST_TIMEOUT_MS", 30_000)),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid {}='{}', using default", key, raw);
                default
            }
        },
        _ => default,
    }
}

fn secs_or(key: &str, default: chrono::Duration) -> chrono::Duration {
    chrono::Duration::seconds(env_or(key, default.num_seconds()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("TH_TEST_CAPACITY", "lots");
        assert_eq!(env_or("TH_TEST_CAPACITY", 500usize), 500);
        std::env::set_var("TH_TEST_CAPACITY", " 42 ");
        assert_eq!(env_or("TH_TEST_CAPACITY", 500usize), 42);
        std::env::remove_var("TH_TEST_CAPACITY");
        assert_eq!(env_or("TH_TEST_CAPACITY", 500usize), 500);
    }

    #[test]
    fn test_secs_or_reads_seconds() {
        std::env::set_var("TH_TEST_TTL_SECS", "90");
        assert_eq!(
            secs_or("TH_TEST_TTL_SECS", chrono::Duration::seconds(60)),
            chrono::Duration::seconds(90)
        );
        std::env::remove_var("TH_TEST_TTL_SECS");
    }
}

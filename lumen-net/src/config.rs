use std::time::Duration;

use lumen_api::limits::MAX_RESPONSE_BYTES;
use lumen_query::DEFAULT_PAGE_SIZE;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: String,

    pub request_timeout_ms: u64, // 10_000

    pub page_size: u32,     // 20
    pub popular_limit: u32, // 20
    pub history_limit: u32, // 20

    pub search_ttl_secs: u64,  // 60
    pub popular_ttl_secs: u64, // 300
    pub cache_capacity: usize, // 50

    /// Interval of the background token refresh. 0 disables the refresher.
    pub token_refresh_secs: u64, // 300

    pub max_response_bytes: usize, // 10 MB
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000/api".to_string(),
            request_timeout_ms: 10_000,
            page_size: DEFAULT_PAGE_SIZE,
            popular_limit: 20,
            history_limit: 20,
            search_ttl_secs: 60,
            popular_ttl_secs: 300,
            cache_capacity: 50,
            token_refresh_secs: 300,
            max_response_bytes: MAX_RESPONSE_BYTES,
        }
    }
}

impl ClientConfig {
    /// - LUMEN_API_URL (default http://127.0.0.1:8000/api)
    /// - LUMEN_REQUEST_TIMEOUT_MS (default 10000)
    /// - LUMEN_PAGE_SIZE (default 20)
    /// - LUMEN_POPULAR_LIMIT (default 20)
    /// - LUMEN_HISTORY_LIMIT (default 20)
    /// - LUMEN_SEARCH_TTL_SECS (default 60)
    /// - LUMEN_POPULAR_TTL_SECS (default 300)
    /// - LUMEN_CACHE_CAPACITY (default 50)
    /// - LUMEN_TOKEN_REFRESH_SECS (default 300)
    /// - LUMEN_MAX_RESPONSE_BYTES (default 10 MB)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(url) = lookup("LUMEN_API_URL") {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                cfg.api_url = url.to_string();
            }
        }

        cfg.request_timeout_ms =
            parse_u64(&lookup, "LUMEN_REQUEST_TIMEOUT_MS", cfg.request_timeout_ms);
        cfg.page_size = parse_u32(&lookup, "LUMEN_PAGE_SIZE", cfg.page_size).clamp(1, 100);
        cfg.popular_limit = parse_u32(&lookup, "LUMEN_POPULAR_LIMIT", cfg.popular_limit).clamp(1, 50);
        cfg.history_limit = parse_u32(&lookup, "LUMEN_HISTORY_LIMIT", cfg.history_limit).clamp(1, 100);
        cfg.search_ttl_secs = parse_u64(&lookup, "LUMEN_SEARCH_TTL_SECS", cfg.search_ttl_secs);
        cfg.popular_ttl_secs = parse_u64(&lookup, "LUMEN_POPULAR_TTL_SECS", cfg.popular_ttl_secs);
        cfg.cache_capacity =
            parse_u64(&lookup, "LUMEN_CACHE_CAPACITY", cfg.cache_capacity as u64).max(1) as usize;
        cfg.token_refresh_secs =
            parse_u64(&lookup, "LUMEN_TOKEN_REFRESH_SECS", cfg.token_refresh_secs);
        cfg.max_response_bytes =
            parse_u64(&lookup, "LUMEN_MAX_RESPONSE_BYTES", cfg.max_response_bytes as u64) as usize;

        cfg
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn search_ttl(&self) -> Duration {
        Duration::from_secs(self.search_ttl_secs)
    }

    pub fn popular_ttl(&self) -> Duration {
        Duration::from_secs(self.popular_ttl_secs)
    }

    pub fn token_refresh_interval(&self) -> Option<Duration> {
        (self.token_refresh_secs > 0).then(|| Duration::from_secs(self.token_refresh_secs))
    }
}

fn parse_u32<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: u32) -> u32 {
    lookup(key)
        .and_then(|s| s.trim().parse::<u32>().ok())
        .unwrap_or(default)
}

fn parse_u64<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str, default: u64) -> u64 {
    lookup(key)
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

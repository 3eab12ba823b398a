use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub feed: FeedConfig,
    pub media: MediaConfig,
    pub seed_sample_data: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Upper bound on a single author's post fetch.
    pub source_timeout_ms: u64,
    /// Upper bound on concurrently running author fetches.
    pub max_in_flight: usize,
}

impl FeedConfig {
    pub fn source_timeout(&self) -> Duration {
        Duration::from_millis(self.source_timeout_ms)
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            source_timeout_ms: 5000,
            max_in_flight: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// First segment of every rewritten media path, e.g. `users/{id}/pictures/{file}`.
    pub url_prefix: String,
    /// Directory that holds `{url_prefix}/...` on disk.
    pub root: PathBuf,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            url_prefix: "users".to_string(),
            root: PathBuf::from("resources"),
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let feed_defaults = FeedConfig::default();
        let media_defaults = MediaConfig::default();

        let config = Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/social_feed.db".to_string()),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env_or("SERVER_PORT", 8080),
            },
            cache: CacheConfig {
                capacity: env_or("CACHE_CAPACITY", 1000),
            },
            feed: FeedConfig {
                source_timeout_ms: env_or("FEED_SOURCE_TIMEOUT_MS", feed_defaults.source_timeout_ms),
                max_in_flight: env_or("FEED_MAX_IN_FLIGHT", feed_defaults.max_in_flight),
            },
            media: MediaConfig {
                url_prefix: env::var("MEDIA_URL_PREFIX").unwrap_or(media_defaults.url_prefix),
                root: env::var("MEDIA_ROOT")
                    .map(PathBuf::from)
                    .unwrap_or(media_defaults.root),
            },
            seed_sample_data: env_or("SEED_SAMPLE_DATA", false),
        };

        if config.feed.max_in_flight == 0 {
            anyhow::bail!("FEED_MAX_IN_FLIGHT must be at least 1");
        }
        if config.cache.capacity == 0 {
            anyhow::bail!("CACHE_CAPACITY must be at least 1");
        }

        Ok(config)
    }

    /// Configuration for tests and embedded use: in-memory database, default tuning.
    pub fn in_memory() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite::memory:".to_string(),
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            cache: CacheConfig { capacity: 1000 },
            feed: FeedConfig::default(),
            media: MediaConfig::default(),
            seed_sample_data: false,
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

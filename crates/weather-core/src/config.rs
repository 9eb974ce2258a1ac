use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use weather_cache::RespConfig;

/// Everything needed to assemble the resolution pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub weather: ResolverConfig,
    /// Per-provider credentials and endpoints, keyed by provider name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_ttl")]
    pub ttl_seconds: u64,
    #[serde(default)]
    pub backend: CacheBackend,
    #[serde(default)]
    pub redis: RedisConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_addr")]
    pub address: String,
    #[serde(default)]
    pub database: u32,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
    #[serde(default = "default_pool_size")]
    pub pool_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Provider names, highest priority first.
    #[serde(default = "default_provider_order")]
    pub provider_order: Vec<String>,
    #[serde(default = "default_logging_enabled")]
    pub logging_enabled: bool,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    /// Overrides the provider's public endpoint.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl PipelineConfig {
    /// Fill API keys from `<NAME>_API_KEY` environment variables
    /// (e.g. `WEATHERAPI_API_KEY`). The environment wins over the file.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|var| std::env::var(var).ok());
    }

    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for name in &self.weather.provider_order {
            let var = format!("{}_API_KEY", name.to_uppercase());
            if let Some(key) = lookup(&var).filter(|k| !k.is_empty()) {
                self.providers.entry(name.clone()).or_default().api_key = key;
                tracing::debug!(provider = %name, var = %var, "API key taken from environment");
            }
        }
    }

    pub fn provider(&self, name: &str) -> ProviderConfig {
        self.providers.get(name).cloned().unwrap_or_default()
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl ResolverConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl RedisConfig {
    pub fn to_resp_config(&self) -> RespConfig {
        RespConfig {
            address: self.address.clone(),
            database: self.database,
            password: self.password.clone().filter(|p| !p.is_empty()),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            io_timeout: Duration::from_millis(self.io_timeout_ms),
            max_idle: self.pool_size,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_seconds: default_ttl(),
            backend: CacheBackend::default(),
            redis: RedisConfig::default(),
        }
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            address: default_redis_addr(),
            database: 0,
            password: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            io_timeout_ms: default_io_timeout_ms(),
            pool_size: default_pool_size(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            provider_order: default_provider_order(),
            logging_enabled: default_logging_enabled(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_cache_enabled() -> bool {
    true
}
fn default_ttl() -> u64 {
    600
}
fn default_redis_addr() -> String {
    "127.0.0.1:6379".to_string()
}
fn default_connect_timeout_ms() -> u64 {
    2000
}
fn default_io_timeout_ms() -> u64 {
    1000
}
fn default_pool_size() -> usize {
    8
}
fn default_provider_order() -> Vec<String> {
    vec!["weatherapi".to_string(), "openweathermap".to_string()]
}
fn default_logging_enabled() -> bool {
    true
}
fn default_request_timeout_ms() -> u64 {
    10_000
}

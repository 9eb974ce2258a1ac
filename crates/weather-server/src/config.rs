use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use weather_core::PipelineConfig;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// `[cache]`, `[weather]` and `[providers.*]` tables.
    #[serde(flatten)]
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Upper bound on a whole HTTP request, including every provider attempt.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(contents)?;
        anyhow::ensure!(
            config.server.request_timeout_ms > 0,
            "server.request_timeout_ms must be positive"
        );
        Ok(config)
    }

    /// Missing file means defaults; a file that exists but does not parse is an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let config = Self::load(path)?;
            tracing::info!(path = %path.display(), "loaded config");
            Ok(config)
        } else {
            tracing::info!(path = %path.display(), "no config file found, using defaults");
            Ok(Self::default())
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}
fn default_request_timeout_ms() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use weather_core::config::CacheBackend;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.server.request_timeout(), Duration::from_secs(30));
        assert!(config.pipeline.cache.enabled);
        assert_eq!(config.pipeline.cache.ttl_seconds, 600);
    }

    #[test]
    fn full_file() {
        let config = Config::parse(
            r#"
            [server]
            listen_addr = "127.0.0.1:9000"

            [cache]
            ttl_seconds = 120
            backend = "redis"

            [cache.redis]
            address = "10.0.0.5:6379"
            database = 2

            [weather]
            provider_order = ["openweathermap"]
            logging_enabled = false

            [providers.openweathermap]
            api_key = "abc"
            base_url = "http://localhost:8081"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
        let pipeline = &config.pipeline;
        assert_eq!(pipeline.cache.ttl_seconds, 120);
        assert_eq!(pipeline.cache.backend, CacheBackend::Redis);
        assert_eq!(pipeline.cache.redis.address, "10.0.0.5:6379");
        assert_eq!(pipeline.cache.redis.database, 2);
        assert_eq!(pipeline.weather.provider_order, vec!["openweathermap"]);
        assert!(!pipeline.weather.logging_enabled);
        let owm = pipeline.provider("openweathermap");
        assert_eq!(owm.api_key, "abc");
        assert_eq!(owm.base_url.as_deref(), Some("http://localhost:8081"));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        assert!(Config::parse("[cache]\nbackend = \"memcached\"").is_err());
    }

    #[test]
    fn zero_request_timeout_is_rejected() {
        let err = Config::parse("[server]\nrequest_timeout_ms = 0").unwrap_err();
        assert!(err.to_string().contains("request_timeout_ms"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(Config::parse("[server\nlisten_addr = ").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default(Path::new("/nonexistent/weather.toml")).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
    }
}

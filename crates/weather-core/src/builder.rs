//! Assembles the pipeline from [`PipelineConfig`]: providers in configured
//! order, optional observation wrappers, the fallback resolver, the cache
//! backend and finally the service.

use crate::config::{CacheBackend, CacheConfig, PipelineConfig};
use crate::error::WeatherError;
use crate::fallback::FallbackResolver;
use crate::observe::Observed;
use crate::provider::{self, openweathermap, weatherapi, WeatherProvider};
use crate::service::{ServiceSettings, WeatherService};
use std::collections::HashSet;
use std::sync::Arc;
use weather_cache::{CacheStore, MemoryCache, RespCache};

/// Instantiate one provider per configured name, in order.
pub fn build_providers(
    config: &PipelineConfig,
) -> Result<Vec<Arc<dyn WeatherProvider>>, WeatherError> {
    let order = &config.weather.provider_order;
    if order.is_empty() {
        return Err(WeatherError::Configuration(
            "no weather providers configured".into(),
        ));
    }

    if config.weather.request_timeout_ms == 0 {
        return Err(WeatherError::Configuration(
            "weather.request_timeout_ms must be positive".into(),
        ));
    }

    let client = provider::http_client(config.weather.request_timeout())?;
    let mut seen = HashSet::new();
    let mut providers: Vec<Arc<dyn WeatherProvider>> = Vec::with_capacity(order.len());

    for name in order {
        if !seen.insert(name.as_str()) {
            return Err(WeatherError::Configuration(format!(
                "weather provider '{name}' listed twice"
            )));
        }

        let settings = config.provider(name);
        if settings.api_key.is_empty() {
            tracing::warn!(provider = %name, "no API key configured, provider will fail every request");
        }

        let built: Arc<dyn WeatherProvider> = match name.as_str() {
            weatherapi::NAME => Arc::new(weatherapi::WeatherApiProvider::new(
                client.clone(),
                settings.api_key,
                settings
                    .base_url
                    .unwrap_or_else(|| weatherapi::DEFAULT_BASE_URL.to_string()),
            )),
            openweathermap::NAME => Arc::new(openweathermap::OpenWeatherMapProvider::new(
                client.clone(),
                settings.api_key,
                settings
                    .base_url
                    .unwrap_or_else(|| openweathermap::DEFAULT_BASE_URL.to_string()),
            )),
            other => {
                return Err(WeatherError::Configuration(format!(
                    "unknown weather provider '{other}'"
                )))
            }
        };

        let provider: Arc<dyn WeatherProvider> = if config.weather.logging_enabled {
            Arc::new(Observed::new(built))
        } else {
            built
        };
        providers.push(provider);
    }

    Ok(providers)
}

/// Build the configured cache backend. An unreachable Redis is logged, not
/// fatal: reads fall through to providers until it comes back.
pub async fn build_cache(config: &CacheConfig) -> Result<Arc<dyn CacheStore>, WeatherError> {
    if config.ttl_seconds == 0 {
        return Err(WeatherError::Configuration(
            "cache ttl_seconds must be positive".into(),
        ));
    }

    match config.backend {
        CacheBackend::Memory => Ok(Arc::new(MemoryCache::new())),
        CacheBackend::Redis => {
            if config.redis.address.trim().is_empty() {
                return Err(WeatherError::Configuration(
                    "cache.redis.address must not be empty".into(),
                ));
            }
            if config.redis.connect_timeout_ms == 0 || config.redis.io_timeout_ms == 0 {
                return Err(WeatherError::Configuration(
                    "cache.redis connect_timeout_ms and io_timeout_ms must be positive".into(),
                ));
            }
            let cache = RespCache::new(config.redis.to_resp_config());
            if let Err(e) = cache.ping().await {
                tracing::warn!(addr = %config.redis.address, error = %e, "redis cache unreachable at startup");
            }
            Ok(Arc::new(cache))
        }
    }
}

pub async fn build_service(config: &PipelineConfig) -> Result<WeatherService, WeatherError> {
    let providers = build_providers(config)?;
    let resolver = FallbackResolver::new(providers);
    let provider_order = resolver.provider_names();

    let upstream: Arc<dyn WeatherProvider> = if config.weather.logging_enabled {
        Arc::new(Observed::new(resolver))
    } else {
        Arc::new(resolver)
    };

    let cache = build_cache(&config.cache).await?;

    Ok(WeatherService::new(
        upstream,
        cache,
        provider_order,
        ServiceSettings {
            cache_enabled: config.cache.enabled,
            cache_ttl: config.cache.ttl(),
            logging_enabled: config.weather.logging_enabled,
        },
    ))
}

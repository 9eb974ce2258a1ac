use crate::error::WeatherError;
use crate::provider::WeatherProvider;
use crate::reading::WeatherReading;
use async_trait::async_trait;
use std::sync::Arc;

pub const NAME: &str = "fallback";

/// Ordered provider chain.
///
/// Providers are tried one at a time in configured order and the first
/// success wins; later providers are never called. A failing provider,
/// whether it reported `NotFound` or an API error, just moves the chain on.
/// When all fail, the returned error carries the count and the last
/// provider's error only.
pub struct FallbackResolver {
    providers: Vec<Arc<dyn WeatherProvider>>,
}

impl FallbackResolver {
    pub fn new(providers: Vec<Arc<dyn WeatherProvider>>) -> Self {
        let order: Vec<&str> = providers.iter().map(|p| p.name()).collect();
        tracing::info!(?order, "fallback resolver initialized");
        Self { providers }
    }

    /// Provider names in the order they are tried.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub async fn resolve(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        let mut last_error = None;

        for (attempt, provider) in self.providers.iter().enumerate() {
            match provider.fetch(city).await {
                Ok(reading) => {
                    if attempt > 0 {
                        tracing::info!(
                            provider = provider.name(),
                            city,
                            attempt = attempt + 1,
                            "fallback provider succeeded"
                        );
                    }
                    return Ok(reading);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        city,
                        attempt = attempt + 1,
                        error = %e,
                        "weather provider failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last) => Err(WeatherError::AllProvidersFailed {
                tried: self.providers.len(),
                last: Box::new(last),
            }),
            None => Err(WeatherError::Configuration(
                "no weather providers configured".into(),
            )),
        }
    }
}

#[async_trait]
impl WeatherProvider for FallbackResolver {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        self.resolve(city).await
    }
}

use crate::error::WeatherError;
use crate::provider::WeatherProvider;
use crate::reading::WeatherReading;
use async_trait::async_trait;
use std::time::Instant;

/// Instrumenting wrapper for any [`WeatherProvider`], including the
/// fallback resolver.
///
/// Emits started / completed / failed events with wall-clock timing and
/// records `weather_fetch_total` and `weather_fetch_duration_seconds`.
/// The wrapped result is returned untouched. Wrappers stack.
pub struct Observed<P> {
    inner: P,
    component: String,
}

impl<P: WeatherProvider> Observed<P> {
    /// Observe `inner` under its own name.
    pub fn new(inner: P) -> Self {
        let component = inner.name().to_string();
        Self { inner, component }
    }

    /// Observe `inner` under a custom component label.
    pub fn with_component(inner: P, component: impl Into<String>) -> Self {
        Self {
            inner,
            component: component.into(),
        }
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: WeatherProvider> WeatherProvider for Observed<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        tracing::info!(component = %self.component, city, "weather fetch started");
        let start = Instant::now();

        let result = self.inner.fetch(city).await;

        let elapsed = start.elapsed();
        let duration_ms = elapsed.as_secs_f64() * 1000.0;
        let outcome = match &result {
            Ok(reading) => {
                tracing::info!(
                    component = %self.component,
                    city,
                    duration_ms,
                    temperature = reading.temperature(),
                    humidity = reading.humidity(),
                    description = reading.description(),
                    "weather fetch completed"
                );
                "success"
            }
            Err(e) => {
                tracing::warn!(
                    component = %self.component,
                    city,
                    duration_ms,
                    error = %e,
                    "weather fetch failed"
                );
                "failure"
            }
        };

        metrics::counter!(
            "weather_fetch_total",
            "component" => self.component.clone(),
            "outcome" => outcome
        )
        .increment(1);
        metrics::histogram!(
            "weather_fetch_duration_seconds",
            "component" => self.component.clone()
        )
        .record(elapsed.as_secs_f64());

        result
    }
}

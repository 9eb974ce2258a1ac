//! Third-party weather sources.
//!
//! Each provider talks to one HTTP API and maps its outcomes onto a valid
//! [`WeatherReading`], [`WeatherError::NotFound`] or
//! [`WeatherError::ExternalApi`]. Providers never retry; falling back to the
//! next source is the resolver's job.

pub mod openweathermap;
pub mod weatherapi;

use crate::error::WeatherError;
use crate::reading::WeatherReading;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use openweathermap::OpenWeatherMapProvider;
pub use weatherapi::WeatherApiProvider;

const USER_AGENT: &str = concat!("weather-core/", env!("CARGO_PKG_VERSION"));
/// Longest slice of an error body carried into error text.
const MAX_ERROR_BODY: usize = 300;

/// A source of current weather for a city.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Stable identifier used for ordering and diagnostics.
    fn name(&self) -> &str;

    /// Fetch the current reading for a non-empty city name.
    async fn fetch(&self, city: &str) -> Result<WeatherReading, WeatherError>;
}

#[async_trait]
impl<P: WeatherProvider + ?Sized> WeatherProvider for Arc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        (**self).fetch(city).await
    }
}

/// HTTP client shared by the provider implementations.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, WeatherError> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .pool_max_idle_per_host(4)
        .timeout(timeout)
        .build()
        .map_err(|e| WeatherError::Configuration(format!("failed to build HTTP client: {e}")))
}

fn truncate_body(body: &str) -> &str {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

//! OpenWeatherMap client (`/weather`, metric units).

use super::{truncate_body, WeatherProvider};
use crate::error::WeatherError;
use crate::reading::WeatherReading;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

pub const NAME: &str = "openweathermap";
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherMapProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    #[serde(default)]
    weather: Vec<Condition>,
    main: Main,
}

#[derive(Debug, Deserialize)]
struct Condition {
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct Main {
    temp: f64,
    humidity: f64,
}

impl OpenWeatherMapProvider {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherMapProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        if self.api_key.is_empty() {
            return Err(WeatherError::external(NAME, "API key not configured"));
        }

        let url = format!("{}/weather", self.base_url);
        tracing::debug!(url = %url, city, "requesting OpenWeatherMap current weather");

        let resp = self
            .client
            .get(&url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(|e| WeatherError::external(NAME, format!("HTTP error for {city}: {e}")))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(WeatherError::NotFound(city.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(WeatherError::external(
                NAME,
                format!("status {}: {}", status.as_u16(), truncate_body(&body)),
            ));
        }

        let payload: WeatherResponse = resp
            .json()
            .await
            .map_err(|e| WeatherError::external(NAME, format!("JSON parse error for {city}: {e}")))?;

        let description = payload
            .weather
            .into_iter()
            .next()
            .map(|c| c.description)
            .ok_or_else(|| WeatherError::external(NAME, format!("no weather conditions for {city}")))?;

        Ok(WeatherReading::new(
            payload.main.temp,
            payload.main.humidity,
            description,
            city,
            Utc::now(),
        ))
    }
}

//! WeatherAPI.com client (`/current.json`).

use super::{truncate_body, WeatherProvider};
use crate::error::WeatherError;
use crate::reading::WeatherReading;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;

pub const NAME: &str = "weatherapi";
pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// WeatherAPI's error code for "No matching location found."
const NO_MATCHING_LOCATION: i64 = 1006;

#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: Current,
}

#[derive(Debug, Deserialize)]
struct Current {
    temp_c: f64,
    humidity: f64,
    condition: Condition,
}

#[derive(Debug, Deserialize)]
struct Condition {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: i64,
    #[serde(default)]
    message: String,
}

impl WeatherApiProvider {
    pub fn new(client: reqwest::Client, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self, city: &str) -> Result<WeatherReading, WeatherError> {
        if self.api_key.is_empty() {
            return Err(WeatherError::external(NAME, "API key not configured"));
        }

        let url = format!("{}/current.json", self.base_url);
        tracing::debug!(url = %url, city, "requesting WeatherAPI current conditions");

        let resp = self
            .client
            .get(&url)
            .query(&[("key", self.api_key.as_str()), ("q", city), ("aqi", "no")])
            .send()
            .await
            .map_err(|e| WeatherError::external(NAME, format!("HTTP error for {city}: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            if let Ok(err) = serde_json::from_str::<ErrorResponse>(&body) {
                if err.error.code == NO_MATCHING_LOCATION {
                    return Err(WeatherError::NotFound(city.to_string()));
                }
                return Err(WeatherError::external(
                    NAME,
                    format!("status {} (code {}): {}", status.as_u16(), err.error.code, err.error.message),
                ));
            }
            return Err(WeatherError::external(
                NAME,
                format!("status {}: {}", status.as_u16(), truncate_body(&body)),
            ));
        }

        let payload: CurrentResponse = resp
            .json()
            .await
            .map_err(|e| WeatherError::external(NAME, format!("JSON parse error for {city}: {e}")))?;

        Ok(WeatherReading::new(
            payload.current.temp_c,
            payload.current.humidity,
            payload.current.condition.text,
            city,
            Utc::now(),
        ))
    }
}

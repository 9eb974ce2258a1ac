use crate::error::WeatherError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest physically possible temperature in °C.
pub const ABSOLUTE_ZERO_C: f64 = -273.15;

/// One point-in-time observation for a city.
///
/// Fields are private so a reading cannot change after construction; it
/// serializes as a flat record (`temperature`, `humidity`, `description`,
/// `city`, `timestamp` as RFC 3339).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    temperature: f64,
    humidity: f64,
    description: String,
    city: String,
    timestamp: DateTime<Utc>,
}

impl WeatherReading {
    pub fn new(
        temperature: f64,
        humidity: f64,
        description: impl Into<String>,
        city: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            temperature,
            humidity,
            description: description.into(),
            city: city.into(),
            timestamp,
        }
    }

    /// Degrees Celsius.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Relative humidity, percent.
    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check the reading's invariants. Out-of-range values are rejected,
    /// never clamped, and non-finite numbers never pass.
    pub fn validate(&self) -> Result<(), WeatherError> {
        if !self.temperature.is_finite() {
            return Err(WeatherError::Validation(format!(
                "temperature {} is not a finite number",
                self.temperature
            )));
        }
        if self.temperature < ABSOLUTE_ZERO_C {
            return Err(WeatherError::Validation(format!(
                "temperature {} is below absolute zero",
                self.temperature
            )));
        }
        if !(0.0..=100.0).contains(&self.humidity) {
            return Err(WeatherError::Validation(format!(
                "humidity {} is outside 0-100%",
                self.humidity
            )));
        }
        if self.description.trim().is_empty() {
            return Err(WeatherError::Validation("description is empty".into()));
        }
        if self.city.trim().is_empty() {
            return Err(WeatherError::Validation("city is empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(temperature: f64, humidity: f64, description: &str, city: &str) -> WeatherReading {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        WeatherReading::new(temperature, humidity, description, city, ts)
    }

    #[test]
    fn non_finite_temperature_rejected() {
        for t in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let r = reading(t, 50.0, "Clear", "Oslo");
            assert!(!r.is_valid(), "{t} accepted");
            assert!(matches!(r.validate(), Err(WeatherError::Validation(_))));
        }
        assert!(!reading(10.0, f64::INFINITY, "Clear", "Oslo").is_valid());
    }

    #[test]
    fn valid_reading_survives_json() {
        let r = reading(1e300, 0.0, "Hot", "Oslo");
        assert!(r.is_valid());
        let back: WeatherReading = serde_json::from_str(&serde_json::to_string(&r).unwrap()).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn valid_reading() {
        assert!(reading(15.0, 76.0, "Partly cloudy", "London").is_valid());
    }

    #[test]
    fn boundaries_are_inclusive() {
        assert!(reading(ABSOLUTE_ZERO_C, 0.0, "Cold", "Vostok").is_valid());
        assert!(reading(40.0, 100.0, "Humid", "Manaus").is_valid());
    }

    #[test]
    fn below_absolute_zero_rejected() {
        let err = reading(-273.16, 50.0, "Clear", "X").validate().unwrap_err();
        assert!(matches!(err, WeatherError::Validation(ref m) if m.contains("absolute zero")));
    }

    #[test]
    fn humidity_out_of_range_rejected() {
        assert!(!reading(10.0, -0.1, "Clear", "X").is_valid());
        assert!(!reading(10.0, 100.1, "Clear", "X").is_valid());
    }

    #[test]
    fn nan_rejected() {
        assert!(!reading(f64::NAN, 50.0, "Clear", "X").is_valid());
        assert!(!reading(10.0, f64::NAN, "Clear", "X").is_valid());
    }

    #[test]
    fn empty_text_rejected() {
        assert!(!reading(10.0, 50.0, "", "X").is_valid());
        assert!(!reading(10.0, 50.0, "Clear", "  ").is_valid());
    }

    #[test]
    fn serializes_as_flat_record() {
        let r = reading(15.0, 76.0, "Partly cloudy", "London");
        let json: serde_json::Value = serde_json::to_value(&r).unwrap();

        assert_eq!(json["temperature"], 15.0);
        assert_eq!(json["humidity"], 76.0);
        assert_eq!(json["description"], "Partly cloudy");
        assert_eq!(json["city"], "London");
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00Z");

        let back: WeatherReading = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }
}

use serde::Serialize;

/// Error classes callers branch on. The HTTP layer maps these to status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    ExternalApi,
    Configuration,
}

#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("external API error ({service}): {message}")]
    ExternalApi {
        service: String,
        message: String,
        #[source]
        cause: Option<Box<WeatherError>>,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    /// Every provider in the chain failed. Only the last failure is kept.
    #[error("all weather providers failed (tried {tried}): {last}")]
    AllProvidersFailed {
        tried: usize,
        #[source]
        last: Box<WeatherError>,
    },
}

impl WeatherError {
    pub fn external(service: impl Into<String>, message: impl Into<String>) -> Self {
        WeatherError::ExternalApi {
            service: service.into(),
            message: message.into(),
            cause: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            WeatherError::Validation(_) => ErrorKind::Validation,
            WeatherError::NotFound(_) => ErrorKind::NotFound,
            WeatherError::ExternalApi { .. } | WeatherError::AllProvidersFailed { .. } => {
                ErrorKind::ExternalApi
            }
            WeatherError::Configuration(_) => ErrorKind::Configuration,
        }
    }

    /// True when this error, or the last failure wrapped by a chain failure,
    /// says the city is unknown.
    pub fn is_not_found(&self) -> bool {
        match self {
            WeatherError::NotFound(_) => true,
            WeatherError::AllProvidersFailed { last, .. } => last.is_not_found(),
            _ => false,
        }
    }

    /// Strip chain-failure wrappers down to the last provider's own error.
    pub fn into_last_failure(self) -> WeatherError {
        match self {
            WeatherError::AllProvidersFailed { last, .. } => last.into_last_failure(),
            other => other,
        }
    }
}

//! Weather resolution pipeline.
//!
//! [`WeatherService`] answers "current weather for a city" cache-aside: it
//! looks up a [`CacheStore`](weather_cache::CacheStore), and on a miss asks a
//! [`FallbackResolver`] that tries each configured [`WeatherProvider`] in
//! order. [`Observed`] wraps any provider (or the resolver) with structured
//! logging and metrics.

pub mod builder;
pub mod config;
pub mod error;
pub mod fallback;
pub mod observe;
pub mod provider;
pub mod reading;
pub mod service;

pub use builder::build_service;
pub use config::PipelineConfig;
pub use error::{ErrorKind, WeatherError};
pub use fallback::FallbackResolver;
pub use observe::Observed;
pub use provider::WeatherProvider;
pub use reading::WeatherReading;
pub use service::{cache_key, ProviderInfo, ServiceSettings, WeatherService};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use weather_cache::CacheStats;

/// Install the global Prometheus recorder and describe the series we emit.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    metrics::describe_counter!(
        "weather_fetch_total",
        "Weather fetches by component and outcome"
    );
    metrics::describe_histogram!(
        "weather_fetch_duration_seconds",
        "Weather fetch latency by component"
    );
    metrics::describe_gauge!("weather_cache_hits", "Cache lookups that found an entry");
    metrics::describe_gauge!("weather_cache_misses", "Cache lookups that found nothing");
    metrics::describe_gauge!("weather_cache_hit_ratio", "hits / (hits + misses)");

    Ok(handle)
}

/// Cache counters live in the store; mirror them into gauges at scrape time.
pub fn publish_cache_stats(stats: CacheStats, backend: &'static str) {
    metrics::gauge!("weather_cache_hits", "backend" => backend).set(stats.hits as f64);
    metrics::gauge!("weather_cache_misses", "backend" => backend).set(stats.misses as f64);
    metrics::gauge!("weather_cache_hit_ratio", "backend" => backend).set(stats.hit_ratio());
}

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and publish the cache TTL.
    /// Fails if a recorder is already installed in this process.
    pub fn init(cache_ttl_ms: u64) -> Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("prometheus: install recorder")?;

        describe_counter!("collector_cache_hits_total", "Aggregate responses served from cache.");
        describe_counter!(
            "collector_cache_misses_total",
            "Aggregate requests that ran a collection."
        );
        describe_gauge!("collector_cache_ttl_ms", "Absolute TTL of the aggregate cache.");
        gauge!("collector_cache_ttl_ms").set(cache_ttl_ms as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

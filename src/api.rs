//! HTTP surface: cached aggregate endpoint, health and diagnostics.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use metrics::counter;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::collector::{Collection, Collector};
use crate::config::ServerConfig;
use crate::context::FetchContext;
use crate::error::CancelReason;
use crate::metrics::Metrics;

/// Response header telling whether `/` was served from cache.
pub const CACHE_HEADER: &str = "X-Cache";

/// Last good collection with an absolute expiry.
pub struct ResponseCache {
    ttl: Duration,
    entry: RwLock<Option<(Instant, Arc<Collection>)>>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Cached collection if it is younger than the TTL.
    pub fn get(&self) -> Option<Arc<Collection>> {
        let guard = self.entry.read().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some((stored_at, c)) if stored_at.elapsed() < self.ttl => Some(Arc::clone(c)),
            _ => None,
        }
    }

    /// Most recent collection regardless of age.
    pub fn last(&self) -> Option<Arc<Collection>> {
        let guard = self.entry.read().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|(_, c)| Arc::clone(c))
    }

    pub fn put(&self, collection: Arc<Collection>) {
        let mut guard = self.entry.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Some((Instant::now(), collection));
    }
}

#[derive(Clone)]
pub struct AppState {
    collector: Arc<Collector>,
    cache: Arc<ResponseCache>,
    /// Serializes refills so concurrent misses run one collection.
    refill: Arc<tokio::sync::Mutex<()>>,
    /// Cancelled on process shutdown.
    shutdown: FetchContext,
    request_timeout: Duration,
}

impl AppState {
    pub fn new(collector: Arc<Collector>, shutdown: FetchContext, server: &ServerConfig) -> Self {
        Self {
            collector,
            cache: Arc::new(ResponseCache::new(server.cache_ttl())),
            refill: Arc::new(tokio::sync::Mutex::new(())),
            shutdown,
            request_timeout: server.request_timeout(),
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

fn debug_routes_enabled() -> bool {
    std::env::var("DEBUG_ROUTES")
        .ok()
        .is_some_and(|v| v == "1")
}

/// Build the router. `/metrics` is mounted only when `metrics` is given;
/// `/debug/snapshot` only with `DEBUG_ROUTES=1`.
pub fn router(state: AppState, metrics: Option<&Metrics>) -> Router {
    let mut r = Router::new()
        .route("/", get(get_result))
        .route("/health", get(|| async { "ok" }));
    if debug_routes_enabled() {
        r = r.route("/debug/snapshot", get(debug_snapshot));
    }
    let mut app = r
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state);
    if let Some(m) = metrics {
        app = app.merge(m.router());
    }
    app
}

fn verdict_response(collection: &Collection, cache: &'static str) -> Response {
    ([(CACHE_HEADER, cache)], Json(&collection.verdict)).into_response()
}

async fn get_result(State(state): State<AppState>) -> Response {
    if let Some(c) = state.cache.get() {
        counter!("collector_cache_hits_total").increment(1);
        return verdict_response(&c, "HIT");
    }

    let _refill = state.refill.lock().await;
    // another request may have refilled while we waited
    if let Some(c) = state.cache.get() {
        counter!("collector_cache_hits_total").increment(1);
        return verdict_response(&c, "HIT");
    }
    counter!("collector_cache_misses_total").increment(1);

    let ctx = state.shutdown.with_timeout(state.request_timeout);
    let collection = state.collector.collect(&ctx).await;

    match collection.interrupted {
        None => {
            let collection = Arc::new(collection);
            state.cache.put(Arc::clone(&collection));
            verdict_response(&collection, "MISS")
        }
        Some(CancelReason::DeadlineExceeded) => {
            tracing::warn!(
                timeout_ms = state.request_timeout.as_millis() as u64,
                "collection hit request deadline"
            );
            (StatusCode::GATEWAY_TIMEOUT, "collection timed out").into_response()
        }
        Some(CancelReason::Cancelled) => {
            (StatusCode::SERVICE_UNAVAILABLE, "shutting down").into_response()
        }
    }
}

async fn debug_snapshot(State(state): State<AppState>) -> Response {
    match state.cache.last() {
        Some(c) => Json(&*c).into_response(),
        None => (StatusCode::NOT_FOUND, "no collection yet").into_response(),
    }
}

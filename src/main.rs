//! State collector service: binary entrypoint.
//! Loads configuration, wires the collector into the HTTP router and serves
//! until SIGINT/SIGTERM. `--once` runs a single collection and prints the
//! verdict instead.

use std::future::IntoFuture;
use std::sync::Arc;

use anyhow::{Context, Result};
use state_collector::{
    api, config, metrics::Metrics, CancelHandle, Collector, CollectorConfig, FetchContext,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// `RUST_LOG` filter (default `info`), `LOG_FORMAT=json` for JSON lines.
fn init_tracing() {
    let (filter, bad_filter) = match EnvFilter::try_from_default_env() {
        Ok(f) => (f, None),
        Err(e) if std::env::var_os("RUST_LOG").is_some() => (EnvFilter::new("info"), Some(e)),
        Err(_) => (EnvFilter::new("info"), None),
    };

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }

    if let Some(e) = bad_filter {
        tracing::warn!(error = %e, "invalid RUST_LOG, falling back to info");
    }
}

/// Resolves on Ctrl+C or SIGTERM and cancels every in-flight collection.
async fn shutdown_signal(cancel: CancelHandle) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received ctrl-c"),
        _ = terminate => tracing::info!("received SIGTERM"),
    }
    cancel.cancel();
}

async fn run_once(cfg: &CollectorConfig) -> Result<()> {
    let collector = Collector::from_config(cfg)?;
    let ctx = FetchContext::background().with_timeout(cfg.server.request_timeout());
    let collection = collector.collect(&ctx).await;
    let out = serde_json::to_string_pretty(&collection.verdict).context("encoding verdict")?;
    println!("{out}");
    Ok(())
}

async fn serve(cfg: CollectorConfig) -> Result<()> {
    let metrics = match Metrics::init(cfg.server.cache_ttl_ms) {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = ?e, "metrics disabled");
            None
        }
    };

    let collector = Arc::new(Collector::from_config(&cfg)?);
    let (shutdown_ctx, cancel) = FetchContext::cancellable();
    let state = api::AppState::new(collector, shutdown_ctx, &cfg.server);
    let app = api::router(state, metrics.as_ref());

    let listener = tokio::net::TcpListener::bind(&cfg.server.addr)
        .await
        .with_context(|| format!("binding {}", cfg.server.addr))?;
    tracing::info!(addr = %cfg.server.addr, "listening");

    let (stopped_tx, stopped_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal(cancel).await;
        let _ = stopped_tx.send(());
    });

    let grace = cfg.server.shutdown_grace();
    let mut server = std::pin::pin!(server.into_future());
    tokio::select! {
        res = &mut server => res.context("server error")?,
        _ = async {
            let _ = stopped_rx.await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(grace_ms = grace.as_millis() as u64, "graceful shutdown timed out");
        }
    }
    tracing::info!("server stopped");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = config::load_default().context("loading collector config")?;

    if std::env::args().skip(1).any(|a| a == "--once") {
        return run_once(&cfg).await;
    }
    serve(cfg).await
}

use std::net::SocketAddr;

use anyhow::Context;
use axum::{routing::get, Router};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static PROM_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub const API_REQUESTS_TOTAL: &str = "api_requests_total";
pub const API_ERRORS_TOTAL: &str = "api_errors_total";
pub const METADATA_CATALOG_LOADS_TOTAL: &str = "metadata_catalog_loads_total";

/// Installs the global Prometheus recorder once and returns its handle.
pub fn install_recorder() -> anyhow::Result<&'static PrometheusHandle> {
    PROM_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("failed to install Prometheus metrics recorder")?;
        describe();
        Ok(handle)
    })
}

/// Installs the recorder and serves `/metrics` on `bind_addr`.
pub fn init(bind_addr: &str) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .with_context(|| format!("invalid metrics bind address {bind_addr}"))?;

    install_recorder()?;

    tokio::spawn(async move {
        let app = Router::new().route("/metrics", get(metrics_handler));

        match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => {
                tracing::info!(%addr, "metrics listener started");
                if let Err(e) = axum::serve(listener, app.into_make_service()).await {
                    tracing::error!(error = %e, "metrics server error");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to bind metrics listener");
            }
        }
    });

    Ok(())
}

fn describe() {
    metrics::describe_counter!(API_REQUESTS_TOTAL, "HTTP API requests, by route");
    metrics::describe_counter!(API_ERRORS_TOTAL, "HTTP API error responses, by status");
    metrics::describe_counter!(
        METADATA_CATALOG_LOADS_TOTAL,
        "Successful metadata catalog loads and reloads"
    );
}

async fn metrics_handler() -> String {
    PROM_HANDLE.get().map(|h| h.render()).unwrap_or_default()
}

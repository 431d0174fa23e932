// src/metrics.rs
//! Pipeline telemetry through the `metrics` facade. The binary installs a
//! Prometheus recorder when `--metrics-addr` is given; otherwise the calls are
//! no-ops until the embedding process installs its own.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;

pub const ITEMS_FETCHED: &str = "digest_items_fetched_total";
pub const ITEMS_KEPT: &str = "digest_items_kept_total";
pub const DUPLICATES_REMOVED: &str = "digest_duplicates_removed_total";
pub const PROVIDER_ERRORS: &str = "digest_provider_errors_total";
pub const SEND_FAILURES: &str = "digest_send_failures_total";
pub const PARSE_MS: &str = "digest_parse_ms";

/// One-time metric descriptions so series carry help text.
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(ITEMS_FETCHED, "Items parsed from feed providers.");
        describe_counter!(ITEMS_KEPT, "Items kept after keyword filtering and dedup.");
        describe_counter!(DUPLICATES_REMOVED, "Items dropped as title/link duplicates.");
        describe_counter!(PROVIDER_ERRORS, "Feed fetch/parse errors.");
        describe_counter!(SEND_FAILURES, "Webhook deliveries that failed after retries.");
        describe_histogram!(PARSE_MS, "Feed parse time in milliseconds.");
    });
}

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
/// Must be called from inside a Tokio runtime.
pub fn serve_prometheus(addr: SocketAddr) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("prometheus: listen on {addr}"))?;
    ensure_described();
    tracing::info!(target: "metrics", %addr, "prometheus exporter listening");
    Ok(())
}

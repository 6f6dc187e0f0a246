//! Observability metrics for the harvest pipeline
//!
//! Counters cover request activity and the per-layer failure classes the
//! pipeline absorbs instead of raising. A Prometheus scrape endpoint can be
//! installed once at startup; when it is not installed the counters degrade
//! to no-ops.

use metrics::{counter, describe_counter, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use tracing::{debug, info};

static METRICS_INSTALLED: OnceCell<()> = OnceCell::new();

/// Install the Prometheus exporter and register counter descriptions
///
/// Idempotent: later calls are ignored.
///
/// # Arguments
/// * `addr` - Socket address for the Prometheus scrape endpoint
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INSTALLED.get().is_some() {
        debug!("metrics already initialized, skipping");
        return Ok(());
    }

    info!("initializing metrics endpoint on {addr}");

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("failed to install Prometheus exporter: {e}"))?;

    describe_counter!(
        "indexer_requests_total",
        Unit::Count,
        "Total HTTP requests issued to the indexer"
    );
    describe_counter!(
        "indexer_retries_total",
        Unit::Count,
        "Total HTTP retry attempts"
    );
    describe_counter!(
        "catalog_fetch_failures_total",
        Unit::Count,
        "Market catalog fetches that returned no data"
    );
    describe_counter!(
        "market_fetch_failures_total",
        Unit::Count,
        "Per-market funding fetches that failed"
    );
    describe_counter!(
        "observations_retained_total",
        Unit::Count,
        "Funding observations folded into per-market series"
    );
    describe_counter!(
        "archive_lines_written_total",
        Unit::Count,
        "Lines written to archive files"
    );
    describe_counter!(
        "archive_persist_failures_total",
        Unit::Count,
        "Archive writes that failed"
    );

    let _ = METRICS_INSTALLED.set(());
    Ok(())
}

/// Count one outbound indexer request
pub fn record_request() {
    counter!("indexer_requests_total").increment(1);
}

/// Count one HTTP retry attempt
pub fn record_retry() {
    counter!("indexer_retries_total").increment(1);
}

/// Count one failed market catalog fetch
pub fn record_catalog_failure() {
    counter!("catalog_fetch_failures_total").increment(1);
}

/// Count one failed per-market funding fetch
pub fn record_market_fetch_failure() {
    counter!("market_fetch_failures_total").increment(1);
}

/// Count observations retained during accumulation
pub fn record_observations_retained(count: u64) {
    counter!("observations_retained_total").increment(count);
}

/// Count lines written to an archive file
pub fn record_archive_written(lines: u64) {
    counter!("archive_lines_written_total").increment(lines);
}

/// Count one failed archive persist
pub fn record_persist_failure() {
    counter!("archive_persist_failures_total").increment(1);
}

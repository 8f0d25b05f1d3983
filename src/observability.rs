use std::net::SocketAddr;

use crate::engine::PlaceError;
use crate::model::Rationale;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: units committed. Labels: rationale.
pub const PLACEMENTS_TOTAL: &str = "putaway_placements_total";

/// Counter: units that ended in a terminal failure. Labels: kind.
pub const PLACEMENT_FAILURES_TOTAL: &str = "putaway_placement_failures_total";

/// Counter: commit attempts retried after losing a capacity race.
pub const PLACEMENT_RETRIES_TOTAL: &str = "putaway_placement_retries_total";

/// Histogram: per-unit placement latency in seconds.
pub const PLACEMENT_DURATION_SECONDS: &str = "putaway_placement_duration_seconds";

/// Counter: units submitted through run_batch.
pub const BATCH_UNITS_TOTAL: &str = "putaway_batch_units_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Histogram: journal group-commit flush duration in seconds.
pub const JOURNAL_FLUSH_DURATION_SECONDS: &str = "putaway_journal_flush_duration_seconds";

/// Histogram: journal group-commit batch size (records per flush).
pub const JOURNAL_FLUSH_BATCH_SIZE: &str = "putaway_journal_flush_batch_size";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}

/// Install the default fmt tracing subscriber. Host binaries call this once.
pub fn init_tracing() {
    tracing_subscriber::fmt::init();
}

/// Map a rationale to a short label for metrics.
pub fn rationale_label(rationale: Rationale) -> &'static str {
    match rationale {
        Rationale::SameSkuMatch => "same_sku",
        Rationale::SimilarSkuMatch => "similar_sku",
        Rationale::EmptyFifoSlot => "empty_fifo_slot",
    }
}

/// Map a terminal error to a short label for metrics.
pub fn error_label(error: &PlaceError) -> &'static str {
    match error {
        PlaceError::NotFound(_) => "not_found",
        PlaceError::AlreadyAssigned(_) => "already_assigned",
        PlaceError::CapacityExceeded(_) => "capacity_exceeded",
        PlaceError::NoCapacity => "no_capacity",
        PlaceError::Timeout => "timeout",
        PlaceError::Cancelled => "cancelled",
        PlaceError::LimitExceeded(_) => "limit_exceeded",
        PlaceError::Journal(_) => "journal",
        PlaceError::Io(_) => "io",
    }
}

use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: booking requests that passed validation. Labels: outcome
/// (`granted`, `unavailable`, `room_missing`).
pub const BOOKINGS_TOTAL: &str = "roombook_bookings_total";

/// Counter: cancellation requests that passed validation. Labels: outcome
/// (`cancelled`, `not_found`, `started`).
pub const CANCELLATIONS_TOTAL: &str = "roombook_cancellations_total";

/// Counter: confirmations the notifier failed to deliver. Labels: kind.
pub const NOTIFICATION_FAILURES_TOTAL: &str = "roombook_notification_failures_total";

/// Histogram: scheduler operation latency in seconds. Labels: op.
pub const OPERATION_DURATION_SECONDS: &str = "roombook_operation_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: rooms held by the durable store.
pub const ROOMS: &str = "roombook_rooms";

/// Histogram: WAL append + fsync duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "roombook_wal_flush_duration_seconds";

/// Histogram: events written per room save.
pub const WAL_FLUSH_BATCH_SIZE: &str = "roombook_wal_flush_batch_size";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

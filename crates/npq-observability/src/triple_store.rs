use std::time::Duration;

use metrics::{counter, gauge, histogram};

pub fn record_triple_store_operation(
    backend: &str,
    op: &str,
    status: &str,
    error_class: &str,
    duration: Duration,
) {
    counter!(
        "npq_triple_store_operation_total",
        "backend" => backend.to_string(),
        "op" => op.to_string(),
        "status" => status.to_string(),
        "error_class" => error_class.to_string()
    )
    .increment(1);
    histogram!(
        "npq_triple_store_operation_duration_seconds",
        "backend" => backend.to_string(),
        "op" => op.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_triple_store_query_bytes_total(backend: &str, op: &str, bytes: usize) {
    counter!(
        "npq_triple_store_query_bytes_total",
        "backend" => backend.to_string(),
        "op" => op.to_string()
    )
    .increment(bytes as u64);
}

pub fn record_triple_store_permit_wait(backend: &str, op: &str, wait: Duration) {
    histogram!(
        "npq_triple_store_permit_wait_seconds",
        "backend" => backend.to_string(),
        "op" => op.to_string()
    )
    .record(wait.as_secs_f64());
}

pub fn record_triple_store_permit_snapshot(backend: &str, max: usize, available: usize) {
    gauge!(
        "npq_triple_store_permits_max",
        "backend" => backend.to_string()
    )
    .set(max as f64);
    gauge!(
        "npq_triple_store_permits_in_use",
        "backend" => backend.to_string()
    )
    .set(max.saturating_sub(available) as f64);
}

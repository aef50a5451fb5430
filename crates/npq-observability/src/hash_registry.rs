use std::time::Duration;

use metrics::{counter, gauge, histogram};

pub fn record_hash_registry_load(status: &str, entries: usize, duration: Duration) {
    counter!(
        "npq_hash_registry_load_total",
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "npq_hash_registry_load_duration_seconds",
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
    if status == "ok" {
        gauge!("npq_hash_registry_entries").set(entries as f64);
    }
}

/// `result` is one of `hit`, `miss` or `inserted`.
pub fn record_hash_registry_lookup(op: &str, result: &str) {
    counter!(
        "npq_hash_registry_lookup_total",
        "op" => op.to_string(),
        "result" => result.to_string()
    )
    .increment(1);
}

pub fn record_hash_registry_entries(entries: usize) {
    gauge!("npq_hash_registry_entries").set(entries as f64);
}

use std::time::Duration;

use npq_observability as observability;

pub(crate) fn record_load(ok: bool, entries: usize, duration: Duration) {
    let status = if ok { "ok" } else { "error" };
    observability::record_hash_registry_load(status, entries, duration);
}

pub(crate) fn record_lookup(op: &str, result: &str) {
    observability::record_hash_registry_lookup(op, result);
}

pub(crate) fn record_entries(entries: usize) {
    observability::record_hash_registry_entries(entries);
}

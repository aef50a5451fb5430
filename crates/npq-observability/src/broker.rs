use std::time::Duration;

use metrics::{counter, gauge, histogram};

pub fn record_repository_provision(backend: &str, outcome: &str, duration: Duration) {
    counter!(
        "npq_repository_provision_total",
        "backend" => backend.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!(
        "npq_repository_provision_duration_seconds",
        "backend" => backend.to_string(),
        "outcome" => outcome.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_repository_open(backend: &str, status: &str, duration: Duration) {
    counter!(
        "npq_repository_open_total",
        "backend" => backend.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "npq_repository_open_duration_seconds",
        "backend" => backend.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_open_repositories(open: usize) {
    gauge!("npq_repository_handles_open").set(open as f64);
}

pub fn record_broker_shutdown(closed: usize, failed: usize, duration: Duration) {
    counter!("npq_broker_shutdown_total").increment(1);
    gauge!("npq_broker_shutdown_closed_handles").set(closed as f64);
    gauge!("npq_broker_shutdown_failed_handles").set(failed as f64);
    histogram!("npq_broker_shutdown_duration_seconds").record(duration.as_secs_f64());
}

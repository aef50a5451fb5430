use std::time::Duration;

use npq_observability as observability;

use crate::{error::TripleStoreError, provision::ProvisionOutcome};

pub(crate) fn record_query_bytes_total(backend: &str, op: &str, bytes: usize) {
    observability::record_triple_store_query_bytes_total(backend, op, bytes);
}

pub(crate) fn record_permit_wait(backend: &str, op: &str, wait: Duration) {
    observability::record_triple_store_permit_wait(backend, op, wait);
}

pub(crate) fn record_permit_snapshot(backend: &str, max: usize, available: usize) {
    observability::record_triple_store_permit_snapshot(backend, max, available);
}

pub(crate) fn record_operation(
    backend: &str,
    op: &str,
    error: Option<&TripleStoreError>,
    duration: Duration,
) {
    let status = if error.is_some() { "error" } else { "ok" };
    let error_class = error.map_or("none", classify_error);

    observability::record_triple_store_operation(backend, op, status, error_class, duration);
}

pub(crate) fn record_provision(backend: &str, outcome: &ProvisionOutcome, duration: Duration) {
    observability::record_repository_provision(backend, outcome.as_label(), duration);
}

pub(crate) fn record_open(backend: &str, error: Option<&TripleStoreError>, duration: Duration) {
    let status = error.map_or("ok", classify_error);
    observability::record_repository_open(backend, status, duration);
}

pub(crate) fn record_open_repositories(open: usize) {
    observability::record_open_repositories(open);
}

pub(crate) fn record_shutdown(closed: usize, failed: usize, duration: Duration) {
    observability::record_broker_shutdown(closed, failed, duration);
}

pub(crate) fn classify_error(error: &TripleStoreError) -> &'static str {
    match error {
        TripleStoreError::UnknownBackend(_) => "unknown_backend",
        TripleStoreError::MissingCredentials { .. } => "missing_credentials",
        TripleStoreError::InvalidRepositoryName(_) => "invalid_repository_name",
        TripleStoreError::ProvisioningFailed { .. } => "provisioning_failed",
        TripleStoreError::Http(_) => "http",
        TripleStoreError::Backend { status, .. } if *status >= 500 => "backend_5xx",
        TripleStoreError::Backend { status, .. } if *status >= 400 => "backend_4xx",
        TripleStoreError::Backend { .. } => "backend_other",
        TripleStoreError::ParseError { .. } => "parse_error",
        TripleStoreError::InvalidQuery { .. } => "invalid_query",
        TripleStoreError::RepositoryClosed(_) => "repository_closed",
        TripleStoreError::BrokerShutDown => "broker_shut_down",
        TripleStoreError::SemaphoreClosed => "semaphore_closed",
        TripleStoreError::Other(_) => "other",
    }
}

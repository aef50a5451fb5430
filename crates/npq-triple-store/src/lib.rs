mod backend;
mod config;
pub mod error;
mod handle;
mod metrics;
mod pattern;
mod provision;
mod sparql;
mod supervisor;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
mod value;
pub mod vocab;

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

pub use backend::{
    NativeStoreBackend, NativeStoreConnection, RepositoryConnector, SparqlConnection,
    StoreBackend, VirtuosoBackend, VirtuosoConnection,
};
pub use config::{
    ADMIN_REPOSITORY, BackendKind, ProvisioningConfig, ProvisioningPolicy, TimeoutConfig,
    TripleStoreConfig,
};
use dashmap::DashMap;
use error::{Result, TripleStoreError};
pub use handle::RepositoryHandle;
pub use provision::{
    HttpProvisioner, NATIVE_STORE_INDEXES, ProvisionOutcome, RepositoryProvisioner,
    native_store_config,
};
pub use sparql::{SelectResult, SelectRow};
pub use supervisor::BrokerSupervisor;
use tokio::sync::{OnceCell, Semaphore};
pub use value::{RdfValue, XSD_STRING, sparql_iri};

#[cfg(test)]
mod tests;

type RepositorySlot = Arc<OnceCell<Arc<RepositoryHandle>>>;

/// Repository Broker
///
/// Owns one [`RepositoryHandle`] per repository name. The first request for a
/// name provisions the repository on the remote store and opens a connection;
/// later requests get the cached handle. Handles are released together by
/// [`RepositoryBroker::shutdown`].
pub struct RepositoryBroker {
    connector: Box<dyn RepositoryConnector>,
    provisioner: Box<dyn RepositoryProvisioner>,
    config: TripleStoreConfig,
    repositories: DashMap<String, RepositorySlot>,
    /// Semaphore for limiting concurrent SPARQL operations
    concurrency_limiter: Arc<Semaphore>,
    shut_down: AtomicBool,
}

impl RepositoryBroker {
    /// Create a broker for the configured backend.
    ///
    /// An unknown `endpoint_type` fails here, before any network call.
    pub fn new(config: &TripleStoreConfig) -> Result<Self> {
        let backend = StoreBackend::from_config(config)?;
        let client = backend::build_client(&config.timeouts)?;
        let provisioner = HttpProvisioner::new(client, config);

        tracing::info!(
            backend = %backend.kind(),
            endpoint_base = %config.endpoint_base,
            admin_base = %config.admin_base,
            "Repository broker configured"
        );

        Ok(Self::from_parts(
            Box::new(backend),
            Box::new(provisioner),
            config.clone(),
        ))
    }

    /// Assemble a broker from explicit parts.
    pub fn from_parts(
        connector: Box<dyn RepositoryConnector>,
        provisioner: Box<dyn RepositoryProvisioner>,
        config: TripleStoreConfig,
    ) -> Self {
        let max_concurrent = config.max_concurrent_operations.max(1);
        if max_concurrent != config.max_concurrent_operations {
            tracing::warn!(
                configured = config.max_concurrent_operations,
                effective = max_concurrent,
                "Triple store max_concurrent_operations too low; clamped"
            );
        }
        let concurrency_limiter = Arc::new(Semaphore::new(max_concurrent));

        Self {
            connector,
            provisioner,
            config,
            repositories: DashMap::new(),
            concurrency_limiter,
            shut_down: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &TripleStoreConfig {
        &self.config
    }

    /// Backend name for logging/metrics
    pub fn backend(&self) -> &'static str {
        self.connector.backend()
    }

    /// Effective concurrency limit used by the internal semaphore.
    pub fn max_concurrent_operations(&self) -> usize {
        self.config.max_concurrent_operations.max(1)
    }

    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::Acquire)
    }

    /// Handle for `name`, provisioning and opening the repository on first use.
    ///
    /// Concurrent first requests for the same name share a single
    /// provisioning call and a single connection.
    pub async fn get_connection(&self, name: &str) -> Result<Arc<RepositoryHandle>> {
        if self.is_shut_down() {
            return Err(TripleStoreError::BrokerShutDown);
        }
        validate_repository_name(name)?;

        let slot = {
            let entry = self
                .repositories
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(OnceCell::new()));
            Arc::clone(entry.value())
        };

        let handle = slot
            .get_or_try_init(|| self.open_repository(name))
            .await
            .map(Arc::clone)?;

        // Shutdown may have swept the map while this handle was being opened.
        if self.is_shut_down() {
            if let Err(error) = handle.close().await {
                tracing::warn!(repository = %name, error = %error, "Failed to close late handle");
            }
            return Err(TripleStoreError::BrokerShutDown);
        }

        Ok(handle)
    }

    /// Handle for the repository holding the admin graph.
    pub async fn admin_connection(&self) -> Result<Arc<RepositoryHandle>> {
        self.get_connection(&self.config.admin_repository).await
    }

    /// Names of repositories with an open handle, sorted.
    pub fn open_repositories(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .repositories
            .iter()
            .filter(|entry| entry.value().initialized())
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    /// Close every open handle and stop handing out connections.
    ///
    /// Only the first call does any work; it returns the number of handles
    /// it closed.
    pub async fn shutdown(&self) -> usize {
        if self.shut_down.swap(true, Ordering::AcqRel) {
            return 0;
        }
        let started = Instant::now();

        let handles: Vec<Arc<RepositoryHandle>> = self
            .repositories
            .iter()
            .filter_map(|entry| entry.value().get().cloned())
            .collect();
        self.repositories.clear();

        let mut closed = 0;
        let mut failed = 0;
        for handle in handles {
            match handle.close().await {
                Ok(true) => closed += 1,
                Ok(false) => {}
                Err(error) => {
                    failed += 1;
                    tracing::warn!(
                        repository = %handle.name(),
                        error = %error,
                        "Failed to shut down repository connection"
                    );
                }
            }
        }

        metrics::record_shutdown(closed, failed, started.elapsed());
        metrics::record_open_repositories(0);
        tracing::info!(closed, failed, "Repository broker shut down");
        closed
    }

    async fn open_repository(&self, name: &str) -> Result<Arc<RepositoryHandle>> {
        let backend = self.connector.backend();

        let started = Instant::now();
        let outcome = self.provisioner.provision(name).await;
        metrics::record_provision(backend, &outcome, started.elapsed());

        match &outcome {
            ProvisionOutcome::Created => {
                tracing::info!(repository = %name, "Created repository");
            }
            ProvisionOutcome::AlreadyExists => {
                tracing::debug!(repository = %name, "Repository already exists");
            }
            ProvisionOutcome::Rejected { status, body } => {
                tracing::warn!(
                    repository = %name,
                    status = *status,
                    body = %body,
                    "Repository administration endpoint rejected provisioning"
                );
            }
            ProvisionOutcome::Unreachable { reason } => {
                tracing::warn!(
                    repository = %name,
                    error = %reason,
                    "Repository administration endpoint unreachable"
                );
            }
        }

        if !outcome.is_success() && self.config.provisioning.on_rejected == ProvisioningPolicy::Fail
        {
            return Err(TripleStoreError::ProvisioningFailed {
                name: name.to_string(),
                reason: outcome.to_string(),
            });
        }

        let started = Instant::now();
        let result = self.connector.open(name).await;
        metrics::record_open(backend, result.as_ref().err(), started.elapsed());
        let connection = result.inspect_err(|error| {
            tracing::error!(
                repository = %name,
                backend,
                error = %error,
                "Failed to open repository connection"
            );
        })?;

        let handle = RepositoryHandle::new(
            name.to_string(),
            connection,
            outcome,
            Arc::clone(&self.concurrency_limiter),
            self.max_concurrent_operations(),
            self.config.timeouts.clone(),
        );
        tracing::info!(
            repository = %name,
            backend,
            endpoint = %handle.endpoint(),
            "Repository connection opened"
        );

        // The slot for `name` is filled after this returns, hence the +1.
        metrics::record_open_repositories(self.open_repositories().len() + 1);
        Ok(Arc::new(handle))
    }
}

/// Repository names end up as a URL path segment.
fn validate_repository_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '/' | '?' | '#' | '%'));
    if invalid {
        return Err(TripleStoreError::InvalidRepositoryName(name.to_string()));
    }
    Ok(())
}

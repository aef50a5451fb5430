use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Instant,
};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::{
    backend::SparqlConnection,
    config::TimeoutConfig,
    error::{Result, TripleStoreError},
    metrics,
    provision::ProvisionOutcome,
    sparql::SelectResult,
};

/// Open connection to one named repository.
///
/// Handles are created and closed only by the
/// [`RepositoryBroker`](crate::RepositoryBroker); callers share them through
/// `Arc`. Every SPARQL call goes through the broker-wide concurrency limiter
/// and fails with [`TripleStoreError::RepositoryClosed`] once the broker has
/// shut down.
pub struct RepositoryHandle {
    name: String,
    connection: Box<dyn SparqlConnection>,
    provision: ProvisionOutcome,
    limiter: Arc<Semaphore>,
    max_concurrent: usize,
    timeouts: TimeoutConfig,
    closed: AtomicBool,
}

impl RepositoryHandle {
    pub(crate) fn new(
        name: String,
        connection: Box<dyn SparqlConnection>,
        provision: ProvisionOutcome,
        limiter: Arc<Semaphore>,
        max_concurrent: usize,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            name,
            connection,
            provision,
            limiter,
            max_concurrent,
            timeouts,
            closed: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn backend(&self) -> &'static str {
        self.connection.backend()
    }

    pub fn endpoint(&self) -> &str {
        self.connection.endpoint()
    }

    /// What the administration endpoint answered when this handle was opened.
    pub fn provision_outcome(&self) -> &ProvisionOutcome {
        &self.provision
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Execute a SPARQL SELECT with the configured query timeout.
    pub async fn select(&self, query: &str) -> Result<SelectResult> {
        let op = "select";
        let started = Instant::now();

        let result = match self.begin(op, query).await {
            Ok(permit) => {
                let result = self
                    .connection
                    .select(query, self.timeouts.query_timeout())
                    .await;
                self.end(permit);
                result
            }
            Err(error) => Err(error),
        };

        metrics::record_operation(self.backend(), op, result.as_ref().err(), started.elapsed());
        result
    }

    /// Execute a SPARQL ASK with the configured ask timeout.
    pub async fn ask(&self, query: &str) -> Result<bool> {
        let op = "ask";
        let started = Instant::now();

        let result = match self.begin(op, query).await {
            Ok(permit) => {
                let result = self
                    .connection
                    .ask(query, self.timeouts.ask_timeout())
                    .await;
                self.end(permit);
                result
            }
            Err(error) => Err(error),
        };

        metrics::record_operation(self.backend(), op, result.as_ref().err(), started.elapsed());
        result
    }

    /// Execute a SPARQL UPDATE with the configured update timeout.
    pub async fn update(&self, update: &str) -> Result<()> {
        let op = "update";
        let started = Instant::now();

        let result = match self.begin(op, update).await {
            Ok(permit) => {
                let result = self
                    .connection
                    .update(update, self.timeouts.update_timeout())
                    .await;
                self.end(permit);
                result
            }
            Err(error) => Err(error),
        };

        metrics::record_operation(self.backend(), op, result.as_ref().err(), started.elapsed());
        result
    }

    /// Close the underlying connection. Returns `false` if it was already
    /// closed, so the connection is shut down at most once.
    pub(crate) async fn close(&self) -> Result<bool> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(false);
        }
        self.connection.shut_down().await?;
        Ok(true)
    }

    async fn begin(&self, op: &str, query: &str) -> Result<OwnedSemaphorePermit> {
        if self.is_closed() {
            return Err(TripleStoreError::RepositoryClosed(self.name.clone()));
        }
        let backend = self.backend();
        metrics::record_query_bytes_total(backend, op, query.len());

        let wait_started = Instant::now();
        let permit = Arc::clone(&self.limiter)
            .acquire_owned()
            .await
            .map_err(|_| TripleStoreError::SemaphoreClosed)?;
        metrics::record_permit_wait(backend, op, wait_started.elapsed());
        metrics::record_permit_snapshot(backend, self.max_concurrent, self.limiter.available_permits());
        Ok(permit)
    }

    fn end(&self, permit: OwnedSemaphorePermit) {
        drop(permit);
        metrics::record_permit_snapshot(
            self.backend(),
            self.max_concurrent,
            self.limiter.available_permits(),
        );
    }
}

impl std::fmt::Debug for RepositoryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RepositoryHandle")
            .field("name", &self.name)
            .field("backend", &self.backend())
            .field("endpoint", &self.endpoint())
            .field("provision", &self.provision)
            .field("closed", &self.is_closed())
            .finish()
    }
}

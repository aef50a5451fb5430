mod native_store;
mod virtuoso;

use std::time::Duration;

use async_trait::async_trait;
pub use native_store::{NativeStoreBackend, NativeStoreConnection};
use reqwest::{Client, Response};
pub use virtuoso::{VirtuosoBackend, VirtuosoConnection};

use crate::{
    config::{BackendKind, TimeoutConfig, TripleStoreConfig},
    error::{Result, TripleStoreError},
    sparql::SelectResult,
};

/// A live SPARQL session with one repository.
///
/// Implementations provide the low-level query execution against a specific
/// store; lifecycle (caching, closing exactly once) is owned by the broker.
#[async_trait]
pub trait SparqlConnection: Send + Sync {
    /// Backend name for logging/metrics
    fn backend(&self) -> &'static str;

    /// Query endpoint this connection talks to
    fn endpoint(&self) -> &str;

    /// Backend-specific handshake, run once before the connection is cached
    async fn initialize(&self) -> Result<()>;

    /// Execute a SPARQL SELECT query
    async fn select(&self, query: &str, timeout: Duration) -> Result<SelectResult>;

    /// Execute a SPARQL ASK query
    async fn ask(&self, query: &str, timeout: Duration) -> Result<bool>;

    /// Execute a SPARQL UPDATE (INSERT/DELETE)
    async fn update(&self, update: &str, timeout: Duration) -> Result<()>;

    /// Release backend resources
    async fn shut_down(&self) -> Result<()>;
}

/// Opens initialized connections for repository names.
#[async_trait]
pub trait RepositoryConnector: Send + Sync {
    /// Backend name for logging/metrics
    fn backend(&self) -> &'static str;

    /// Construct and initialize a connection to `name`.
    async fn open(&self, name: &str) -> Result<Box<dyn SparqlConnection>>;
}

/// The backends this service can broker, selected once from configuration.
pub enum StoreBackend {
    NativeStore(NativeStoreBackend),
    Virtuoso(VirtuosoBackend),
}

impl StoreBackend {
    /// Build the configured backend. Fails on an unknown `endpoint_type`, or
    /// on Virtuoso without credentials, without touching the network.
    pub fn from_config(config: &TripleStoreConfig) -> Result<Self> {
        let kind = config.backend_kind()?;
        let client = build_client(&config.timeouts)?;

        match kind {
            BackendKind::NativeStore => Ok(Self::NativeStore(NativeStoreBackend::new(
                client,
                config.endpoint_base.clone(),
                config.timeouts.clone(),
            ))),
            BackendKind::Virtuoso => {
                let (username, password) =
                    config
                        .credentials()
                        .ok_or(TripleStoreError::MissingCredentials {
                            backend: kind.name(),
                        })?;
                Ok(Self::Virtuoso(VirtuosoBackend::new(
                    client,
                    config.endpoint_base.clone(),
                    username.to_string(),
                    password.to_string(),
                    config.timeouts.clone(),
                )))
            }
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            Self::NativeStore(_) => BackendKind::NativeStore,
            Self::Virtuoso(_) => BackendKind::Virtuoso,
        }
    }
}

#[async_trait]
impl RepositoryConnector for StoreBackend {
    fn backend(&self) -> &'static str {
        self.kind().name()
    }

    async fn open(&self, name: &str) -> Result<Box<dyn SparqlConnection>> {
        let connection: Box<dyn SparqlConnection> = match self {
            Self::NativeStore(backend) => Box::new(backend.connection(name)),
            Self::Virtuoso(backend) => Box::new(backend.connection(name)),
        };
        connection.initialize().await?;
        Ok(connection)
    }
}

/// Shared HTTP client for query endpoints and the administration API.
pub(crate) fn build_client(timeouts: &TimeoutConfig) -> Result<Client> {
    let client = Client::builder()
        // Connection pooling: keep up to 10 idle connections per host
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .connect_timeout(timeouts.connect_timeout())
        // Default request timeout (overridden per-request)
        .timeout(timeouts.query_timeout())
        .build()?;

    Ok(client)
}

/// Turn a non-success response into a `Backend` error carrying its body.
pub(crate) async fn backend_error(response: Response) -> TripleStoreError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    TripleStoreError::Backend { status, message }
}

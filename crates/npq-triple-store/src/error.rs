use thiserror::Error;

/// Triple store and broker errors
#[derive(Error, Debug)]
pub enum TripleStoreError {
    /// `ENDPOINT_TYPE` names a backend this service cannot talk to
    #[error("Unknown repository type: {0}")]
    UnknownBackend(String),

    /// The selected backend needs credentials that are not configured
    #[error("Backend {backend} requires a username and password")]
    MissingCredentials { backend: &'static str },

    /// Repository name cannot be used as a URL path segment
    #[error("Invalid repository name: {0:?}")]
    InvalidRepositoryName(String),

    /// Administration endpoint refused the repository and policy is `fail`
    #[error("Provisioning repository {name} failed: {reason}")]
    ProvisioningFailed { name: String, reason: String },

    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Triple store returned an error response
    #[error("Triple store error (status {status}): {message}")]
    Backend { status: u16, message: String },

    /// Failed to parse response
    #[error("Failed to parse response: {reason}")]
    ParseError { reason: String },

    /// Invalid SPARQL query or term
    #[error("Invalid SPARQL query: {reason}")]
    InvalidQuery { reason: String },

    /// Handle was closed by broker shutdown
    #[error("Repository {0} is closed")]
    RepositoryClosed(String),

    /// Broker no longer hands out connections
    #[error("Repository broker is shut down")]
    BrokerShutDown,

    /// Semaphore closed
    #[error("Semaphore closed")]
    SemaphoreClosed,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, TripleStoreError>;

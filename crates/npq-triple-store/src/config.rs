use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TripleStoreError};

/// Repository holding the admin graph (hash registry, service bookkeeping).
pub const ADMIN_REPOSITORY: &str = "admin";

/// Backend serving the repositories, fixed for the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// RDF4J server with native-store repositories.
    NativeStore,
    /// Virtuoso server reached with username/password.
    Virtuoso,
}

impl BackendKind {
    /// Resolve the `ENDPOINT_TYPE` setting.
    ///
    /// Unset or `rdf4j` selects the native store, `virtuoso` selects
    /// Virtuoso. Anything else, including an empty value, is a configuration
    /// error.
    pub fn from_endpoint_type(endpoint_type: Option<&str>) -> Result<Self> {
        match endpoint_type {
            None | Some("rdf4j") => Ok(Self::NativeStore),
            Some("virtuoso") => Ok(Self::Virtuoso),
            Some(other) => Err(TripleStoreError::UnknownBackend(other.to_string())),
        }
    }

    /// Label used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NativeStore => "native-store",
            Self::Virtuoso => "virtuoso",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What the broker does when the administration endpoint rejects a
/// provisioning request (any status other than 204/409, or no response).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProvisioningPolicy {
    /// Log the rejection and open the connection anyway.
    #[default]
    Continue,
    /// Fail `get_connection` with `ProvisioningFailed`.
    Fail,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct ProvisioningConfig {
    #[serde(default)]
    pub on_rejected: ProvisioningPolicy,
}

/// Configuration for the repository broker.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TripleStoreConfig {
    /// Prefix of repository query endpoints; the repository name is appended
    /// verbatim (e.g. "http://rdf4j:8080/rdf4j-server/repositories/").
    pub endpoint_base: String,

    /// Raw backend selector (`rdf4j`, `virtuoso` or unset).
    #[serde(default)]
    pub endpoint_type: Option<String>,

    /// Username for the Virtuoso backend
    #[serde(default)]
    pub username: Option<String>,

    /// Password for the Virtuoso backend
    #[serde(default)]
    pub password: Option<String>,

    /// Base URL of the repository administration API
    /// (`PUT {admin_base}/repositories/{name}`).
    pub admin_base: String,

    /// Name of the repository holding the admin graph.
    pub admin_repository: String,

    #[serde(default)]
    pub provisioning: ProvisioningConfig,

    /// Per-call timeouts
    pub timeouts: TimeoutConfig,

    /// Maximum concurrent SPARQL operations across all repositories.
    pub max_concurrent_operations: usize,
}

impl Default for TripleStoreConfig {
    fn default() -> Self {
        Self {
            endpoint_base: "http://rdf4j:8080/rdf4j-server/repositories/".to_string(),
            endpoint_type: None,
            username: None,
            password: None,
            admin_base: "http://rdf4j:8080/rdf4j-server".to_string(),
            admin_repository: ADMIN_REPOSITORY.to_string(),
            provisioning: ProvisioningConfig::default(),
            timeouts: TimeoutConfig::default(),
            max_concurrent_operations: 16,
        }
    }
}

impl TripleStoreConfig {
    /// Backend selected by `endpoint_type`.
    pub fn backend_kind(&self) -> Result<BackendKind> {
        BackendKind::from_endpoint_type(self.endpoint_type.as_deref())
    }

    /// Username/password pair, present only when both are configured.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some((user.as_str(), pass.as_str())),
            _ => None,
        }
    }
}

/// Timeouts for the different remote calls, in milliseconds.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct TimeoutConfig {
    /// SELECT queries
    pub query_ms: u64,

    /// SPARQL updates
    pub update_ms: u64,

    /// ASK queries
    pub ask_ms: u64,

    /// Repository administration PUT
    pub provision_ms: u64,

    /// TCP connect, and the connection handshake
    pub connect_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            query_ms: 60_000,
            update_ms: 300_000,
            ask_ms: 10_000,
            provision_ms: 30_000,
            connect_ms: 10_000,
        }
    }
}

impl TimeoutConfig {
    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_ms)
    }

    pub fn update_timeout(&self) -> Duration {
        Duration::from_millis(self.update_ms)
    }

    pub fn ask_timeout(&self) -> Duration {
        Duration::from_millis(self.ask_ms)
    }

    pub fn provision_timeout(&self) -> Duration {
        Duration::from_millis(self.provision_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_type_selects_backend() {
        assert_eq!(
            BackendKind::from_endpoint_type(None).unwrap(),
            BackendKind::NativeStore
        );
        assert_eq!(
            BackendKind::from_endpoint_type(Some("rdf4j")).unwrap(),
            BackendKind::NativeStore
        );
        assert_eq!(
            BackendKind::from_endpoint_type(Some("virtuoso")).unwrap(),
            BackendKind::Virtuoso
        );
    }

    #[test]
    fn unknown_endpoint_type_is_rejected() {
        let err = BackendKind::from_endpoint_type(Some("graphdb")).unwrap_err();
        assert!(matches!(err, TripleStoreError::UnknownBackend(ref t) if t == "graphdb"));
    }

    #[test]
    fn empty_endpoint_type_is_rejected() {
        let err = BackendKind::from_endpoint_type(Some("")).unwrap_err();
        assert!(matches!(err, TripleStoreError::UnknownBackend(ref t) if t.is_empty()));
    }

    #[test]
    fn credentials_require_both_parts() {
        let mut config = TripleStoreConfig {
            username: Some("dba".to_string()),
            ..TripleStoreConfig::default()
        };
        assert!(config.credentials().is_none());

        config.password = Some("secret".to_string());
        assert_eq!(config.credentials(), Some(("dba", "secret")));
    }
}

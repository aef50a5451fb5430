//! Remote repository creation through the RDF4J administration API.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::config::TripleStoreConfig;

/// Triple indexes of every provisioned native store.
pub const NATIVE_STORE_INDEXES: &str = "spoc,posc,ospc,opsc,psoc,sopc,cpos,cosp,cops,cpso,csop";

/// Result of a provisioning attempt. Only `Created` and `AlreadyExists` count
/// as success; the others are reported, not raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// 204 No Content
    Created,
    /// 409 Conflict
    AlreadyExists,
    /// Any other status, with the response body
    Rejected { status: u16, body: String },
    /// No response at all
    Unreachable { reason: String },
}

impl ProvisionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Created | Self::AlreadyExists)
    }

    /// Label used in logs and metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AlreadyExists => "already_exists",
            Self::Rejected { .. } => "rejected",
            Self::Unreachable { .. } => "unreachable",
        }
    }

    pub(crate) fn from_status(status: StatusCode, body: String) -> Self {
        match status {
            StatusCode::NO_CONTENT => Self::Created,
            StatusCode::CONFLICT => Self::AlreadyExists,
            other => Self::Rejected {
                status: other.as_u16(),
                body,
            },
        }
    }
}

impl fmt::Display for ProvisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => f.write_str("created"),
            Self::AlreadyExists => f.write_str("already exists"),
            Self::Rejected { status, body } => write!(f, "rejected with status {status}: {body}"),
            Self::Unreachable { reason } => write!(f, "unreachable: {reason}"),
        }
    }
}

/// Ensures a named repository exists on the remote store.
#[async_trait]
pub trait RepositoryProvisioner: Send + Sync {
    /// Create `name` if missing. Never fails; problems are in the outcome.
    async fn provision(&self, name: &str) -> ProvisionOutcome;
}

/// `PUT <admin-base>/repositories/<name>` with a native-store template.
pub struct HttpProvisioner {
    client: Client,
    admin_base: String,
    timeout: Duration,
}

impl HttpProvisioner {
    pub fn new(client: Client, config: &TripleStoreConfig) -> Self {
        Self {
            client,
            admin_base: config.admin_base.trim_end_matches('/').to_string(),
            timeout: config.timeouts.provision_timeout(),
        }
    }

    fn url(&self, name: &str) -> String {
        format!("{}/repositories/{}", self.admin_base, name)
    }
}

#[async_trait]
impl RepositoryProvisioner for HttpProvisioner {
    async fn provision(&self, name: &str) -> ProvisionOutcome {
        let url = self.url(name);
        let response = self
            .client
            .put(&url)
            .header("Content-Type", "text/turtle")
            .body(native_store_config(name))
            .timeout(self.timeout)
            .send()
            .await;

        match response {
            Ok(response) => {
                let status = response.status();
                let body = if status == StatusCode::NO_CONTENT || status == StatusCode::CONFLICT {
                    String::new()
                } else {
                    response.text().await.unwrap_or_default()
                };
                ProvisionOutcome::from_status(status, body)
            }
            Err(error) => ProvisionOutcome::Unreachable {
                reason: error.to_string(),
            },
        }
    }
}

/// Turtle description of a SailRepository backed by a NativeStore.
pub fn native_store_config(name: &str) -> String {
    let id = escape_turtle_string(name);
    format!(
        "@prefix rdfs: <http://www.w3.org/2000/01/rdf-schema#>.\n\
         @prefix rep: <http://www.openrdf.org/config/repository#>.\n\
         @prefix sr: <http://www.openrdf.org/config/repository/sail#>.\n\
         @prefix sail: <http://www.openrdf.org/config/sail#>.\n\
         @prefix ns: <http://www.openrdf.org/config/sail/native#>.\n\
         @prefix sb: <http://www.openrdf.org/config/sail/base#>.\n\
         \n\
         [] a rep:Repository ;\n    \
             rep:repositoryID \"{id}\" ;\n    \
             rdfs:label \"{id} native store\" ;\n    \
             rep:repositoryImpl [\n        \
                 rep:repositoryType \"openrdf:SailRepository\" ;\n        \
                 sr:sailImpl [\n            \
                     sail:sailType \"openrdf:NativeStore\" ;\n            \
                     sail:iterationCacheSyncThreshold \"10000\" ;\n            \
                     ns:tripleIndexes \"{NATIVE_STORE_INDEXES}\" ;\n            \
                     sb:defaultQueryEvaluationMode \"STANDARD\"\n        \
                 ]\n    \
             ].\n"
    )
}

fn escape_turtle_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_outcomes() {
        assert_eq!(
            ProvisionOutcome::from_status(StatusCode::NO_CONTENT, String::new()),
            ProvisionOutcome::Created
        );
        assert_eq!(
            ProvisionOutcome::from_status(StatusCode::CONFLICT, String::new()),
            ProvisionOutcome::AlreadyExists
        );
        let rejected =
            ProvisionOutcome::from_status(StatusCode::BAD_REQUEST, "bad config".to_string());
        assert!(!rejected.is_success());
        assert_eq!(rejected.as_label(), "rejected");
        assert_eq!(
            rejected.to_string(),
            "rejected with status 400: bad config"
        );
    }

    #[test]
    fn provisioning_url_is_derived_from_admin_base() {
        let config = TripleStoreConfig {
            admin_base: "http://store/rdf4j-server/".to_string(),
            ..TripleStoreConfig::default()
        };
        let provisioner = HttpProvisioner::new(Client::new(), &config);

        assert_eq!(
            provisioner.url("admin"),
            "http://store/rdf4j-server/repositories/admin"
        );
    }

    #[test]
    fn template_names_the_repository() {
        let turtle = native_store_config("admin");
        assert!(turtle.contains("rep:repositoryID \"admin\" ;"));
        assert!(turtle.contains("rdfs:label \"admin native store\" ;"));
        assert!(turtle.contains(&format!("ns:tripleIndexes \"{NATIVE_STORE_INDEXES}\"")));
        assert!(turtle.contains("sail:iterationCacheSyncThreshold \"10000\""));
        assert!(turtle.contains("sb:defaultQueryEvaluationMode \"STANDARD\""));
    }

    #[test]
    fn index_set_has_no_duplicates() {
        let indexes: Vec<_> = NATIVE_STORE_INDEXES.split(',').collect();
        let unique: std::collections::HashSet<_> = indexes.iter().collect();
        assert_eq!(indexes.len(), 11);
        assert_eq!(unique.len(), indexes.len());
    }
}

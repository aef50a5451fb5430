#![allow(clippy::unwrap_used)]

//! Integration tests against a live RDF4J server.
//!
//! Start one with: `docker run -d -p 8080:8080 eclipse/rdf4j-workbench`
//! and run with `RUN_RDF4J_TESTS=1`.

use std::time::{SystemTime, UNIX_EPOCH};

use crate::{ProvisionOutcome, RdfValue, RepositoryBroker, TripleStoreConfig, vocab};

fn rdf4j_config() -> TripleStoreConfig {
    let server =
        std::env::var("RDF4J_URL").unwrap_or_else(|_| "http://localhost:8080/rdf4j-server".into());
    TripleStoreConfig {
        endpoint_base: format!("{server}/repositories/"),
        admin_base: server,
        ..TripleStoreConfig::default()
    }
}

fn unique_name(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    format!("{prefix}_{nanos}")
}

#[tokio::test]
async fn test_rdf4j_provision_insert_and_query() {
    if !super::require_rdf4j() {
        return;
    }

    let broker = RepositoryBroker::new(&rdf4j_config()).unwrap();
    let name = unique_name("npq_test");

    let handle = match broker.get_connection(&name).await {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Skipping test - RDF4J not available: {e}");
            return;
        }
    };
    assert_eq!(handle.provision_outcome(), &ProvisionOutcome::Created);

    handle
        .update(&format!(
            "INSERT DATA {{ GRAPH <{g}> {{ <http://example.org/s1> <http://example.org/p1> \"object1\" }} }}",
            g = vocab::ADMIN_GRAPH
        ))
        .await
        .unwrap();

    let object = handle
        .object_for_pattern(vocab::ADMIN_GRAPH, "http://example.org/s1", "http://example.org/p1")
        .await
        .unwrap();
    assert_eq!(object, Some(RdfValue::literal("object1")));

    broker.shutdown().await;

    // A fresh broker sees the repository left behind by the first one.
    let broker = RepositoryBroker::new(&rdf4j_config()).unwrap();
    let handle = broker.get_connection(&name).await.unwrap();
    assert_eq!(handle.provision_outcome(), &ProvisionOutcome::AlreadyExists);
    assert!(
        handle
            .ask("ASK { ?s <http://example.org/p1> ?o }")
            .await
            .unwrap()
    );
    broker.shutdown().await;
}

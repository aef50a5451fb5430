#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use npq_triple_store::{
    RdfValue, RepositoryBroker, TripleStoreConfig,
    error::TripleStoreError,
    testing::{MemoryConnector, RecordingProvisioner},
    vocab::{ADMIN_GRAPH, IS_HASH_OF},
};

use crate::{HashRegistry, error::HashRegistryError, hash_iri, hash_of};

fn broker(connector: &MemoryConnector) -> Arc<RepositoryBroker> {
    Arc::new(RepositoryBroker::from_parts(
        Box::new(connector.clone()),
        Box::new(RecordingProvisioner::new()),
        TripleStoreConfig::default(),
    ))
}

fn setup() -> (HashRegistry, MemoryConnector) {
    let connector = MemoryConnector::new();
    let registry = HashRegistry::new(broker(&connector));
    (registry, connector)
}

async fn seed_admin_graph(broker: &RepositoryBroker, triples: &str) {
    let admin = broker.admin_connection().await.unwrap();
    admin
        .update(&format!(
            "INSERT DATA {{ GRAPH <{ADMIN_GRAPH}> {{ {triples} }} }}"
        ))
        .await
        .unwrap();
}

#[tokio::test]
async fn hash_for_persists_new_values() {
    let (registry, connector) = setup();
    let value = RdfValue::iri("http://example.org/pubkey/1");

    let hash = registry.hash_for(&value).await.unwrap();

    assert_eq!(hash, hash_of(&value));
    assert_eq!(connector.stats("admin").updates, 1);
    assert!(registry.contains(&hash));
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn round_trip_returns_original_value() {
    let (registry, _connector) = setup();
    let values = [
        RdfValue::iri("http://example.org/a"),
        RdfValue::literal("plain"),
        RdfValue::lang_literal("bonjour", "fr"),
        RdfValue::typed_literal("42", "http://www.w3.org/2001/XMLSchema#integer"),
    ];

    for value in values {
        let hash = registry.hash_for(&value).await.unwrap();
        assert_eq!(registry.value_for(&hash).await.unwrap(), Some(value));
    }

    let hash = registry.hash_for("some text").await.unwrap();
    assert_eq!(
        registry.value_for(&hash).await.unwrap(),
        Some(RdfValue::literal("some text"))
    );
}

#[tokio::test]
async fn repeated_hash_for_writes_once() {
    let (registry, connector) = setup();
    let value = RdfValue::literal("same");

    let first = registry.hash_for(&value).await.unwrap();
    let second = registry.hash_for(&value).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(connector.stats("admin").updates, 1);
}

#[tokio::test]
async fn concurrent_hash_for_writes_once() {
    let (registry, connector) = setup();
    let registry = Arc::new(registry);

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                registry
                    .hash_for(&RdfValue::iri("http://example.org/shared"))
                    .await
            })
        })
        .collect();

    let mut hashes = Vec::new();
    for task in tasks {
        hashes.push(task.await.unwrap().unwrap());
    }

    assert!(hashes.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(connector.stats("admin").updates, 1);
    assert_eq!(registry.len(), 1);
}

#[tokio::test]
async fn first_access_loads_with_one_scan() {
    let (registry, connector) = setup();
    assert!(!registry.is_loaded());

    assert_eq!(registry.value_for("00").await.unwrap(), None);
    registry.value_for("11").await.unwrap();
    registry.hash_for("x").await.unwrap();

    assert!(registry.is_loaded());
    assert_eq!(connector.stats("admin").selects, 1);
}

#[tokio::test]
async fn fresh_registry_sees_persisted_entries() {
    let connector = MemoryConnector::new();
    let first = HashRegistry::new(broker(&connector));
    let value = RdfValue::iri("http://example.org/pubkey/2");
    let hash = first.hash_for(&value).await.unwrap();

    let second = HashRegistry::new(broker(&connector));
    assert_eq!(second.preload().await.unwrap(), 1);
    assert_eq!(second.value_for(&hash).await.unwrap(), Some(value.clone()));

    // Already known: no second write.
    assert_eq!(second.hash_for(&value).await.unwrap(), hash);
    assert_eq!(connector.stats("admin").updates, 1);
}

#[tokio::test]
async fn load_skips_subjects_without_hash_prefix() {
    let connector = MemoryConnector::new();
    let broker = broker(&connector);
    let known = RdfValue::literal("known");
    let hash = hash_of(&known);
    seed_admin_graph(
        &broker,
        &format!(
            "<{hash_iri}> <{IS_HASH_OF}> \"known\" . \
             <http://example.org/not-a-hash> <{IS_HASH_OF}> \"stray\" .",
            hash_iri = hash_iri(&hash),
        ),
    )
    .await;

    let registry = HashRegistry::new(broker);
    assert_eq!(registry.preload().await.unwrap(), 1);
    assert_eq!(registry.value_for(&hash).await.unwrap(), Some(known));
}

#[tokio::test]
async fn preload_is_idempotent() {
    let (registry, connector) = setup();
    registry.hash_for("a").await.unwrap();

    assert_eq!(registry.preload().await.unwrap(), 1);
    assert_eq!(registry.preload().await.unwrap(), 1);
    assert_eq!(connector.stats("admin").selects, 1);
}

#[tokio::test]
async fn store_failures_propagate_and_load_is_retried() {
    let (registry, connector) = setup();
    connector.fail_opens_for("admin");

    let err = registry.hash_for("value").await.unwrap_err();
    assert!(matches!(
        err,
        HashRegistryError::Store(TripleStoreError::Backend { status: 404, .. })
    ));
    assert!(!registry.is_loaded());
    assert!(registry.is_empty());

    connector.recover("admin");
    let hash = registry.hash_for("value").await.unwrap();

    assert!(registry.is_loaded());
    assert_eq!(
        registry.value_for(&hash).await.unwrap(),
        Some(RdfValue::literal("value"))
    );
    assert_eq!(connector.stats("admin").updates, 1);
}

#[tokio::test]
async fn shut_down_broker_surfaces_as_store_error() {
    let connector = MemoryConnector::new();
    let broker = broker(&connector);
    let registry = HashRegistry::new(Arc::clone(&broker));
    registry.preload().await.unwrap();

    broker.shutdown().await;

    let err = registry.hash_for("late").await.unwrap_err();
    assert!(matches!(
        err,
        HashRegistryError::Store(TripleStoreError::BrokerShutDown)
    ));
    // Cached reads keep working.
    assert_eq!(registry.value_for("missing").await.unwrap(), None);
}

use npq_triple_store::{
    RdfValue, sparql_iri,
    vocab::{ADMIN_GRAPH, IS_HASH_OF},
};

use crate::{
    HashRegistry,
    codec::{Hashable, hash_iri, hash_of},
    error::Result,
    metrics,
};

impl HashRegistry {
    /// Hash of `value`, recording the mapping in the admin graph the first
    /// time this hash is seen.
    pub async fn hash_for<V: Hashable + ?Sized>(&self, value: &V) -> Result<String> {
        let hash = hash_of(value);
        self.ensure_loaded().await?;

        if self.entries.contains_key(&hash) {
            metrics::record_lookup("hash_for", "hit");
            return Ok(hash);
        }

        let _gate = self.insert_gate.lock().await;
        // Another caller may have written it while we waited.
        if self.entries.contains_key(&hash) {
            metrics::record_lookup("hash_for", "hit");
            return Ok(hash);
        }

        let value = value.to_rdf_value();
        let update = insert_hash_query(&hash, &value)?;
        let admin = self.broker.admin_connection().await?;
        admin.update(&update).await?;

        self.entries.insert(hash.clone(), value);
        metrics::record_lookup("hash_for", "inserted");
        metrics::record_entries(self.entries.len());
        tracing::debug!(hash = %hash, "Registered new hash");

        Ok(hash)
    }

    /// Value a hash was computed from, if known.
    pub async fn value_for(&self, hash: &str) -> Result<Option<RdfValue>> {
        self.ensure_loaded().await?;

        let value = self.entries.get(hash).map(|entry| entry.value().clone());
        metrics::record_lookup("value_for", if value.is_some() { "hit" } else { "miss" });
        Ok(value)
    }
}

fn insert_hash_query(hash: &str, value: &RdfValue) -> Result<String> {
    Ok(format!(
        "INSERT DATA {{ GRAPH {graph} {{ {subject} {predicate} {object} }} }}",
        graph = sparql_iri(ADMIN_GRAPH)?,
        subject = sparql_iri(&hash_iri(hash))?,
        predicate = sparql_iri(IS_HASH_OF)?,
        object = value.to_sparql()?,
    ))
}

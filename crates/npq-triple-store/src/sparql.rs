use std::collections::HashMap;

use serde::Deserialize;

use crate::{
    error::{Result, TripleStoreError},
    value::RdfValue,
};

/// A row from a SPARQL SELECT query result
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectRow {
    pub bindings: HashMap<String, RdfValue>,
}

impl SelectRow {
    /// Get a binding value by variable name
    pub fn get(&self, var: &str) -> Option<&RdfValue> {
        self.bindings.get(var)
    }

    /// Get a binding value as a string
    pub fn get_str(&self, var: &str) -> Option<&str> {
        self.bindings.get(var).map(RdfValue::as_str)
    }
}

/// Result from a SPARQL SELECT query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectResult {
    pub variables: Vec<String>,
    pub rows: Vec<SelectRow>,
}

impl SelectResult {
    /// All bound values of one variable, in row order.
    pub fn column(&self, var: &str) -> Vec<RdfValue> {
        self.rows
            .iter()
            .filter_map(|row| row.get(var).cloned())
            .collect()
    }
}

#[derive(Deserialize)]
struct SparqlSelectResponse {
    #[serde(default)]
    head: SparqlHead,
    results: SparqlSelectResults,
}

#[derive(Deserialize, Default)]
struct SparqlHead {
    #[serde(default)]
    vars: Vec<String>,
}

#[derive(Deserialize)]
struct SparqlSelectResults {
    bindings: Vec<HashMap<String, SparqlBinding>>,
}

#[derive(Deserialize)]
struct SparqlBinding {
    #[serde(rename = "type")]
    kind: String,
    value: String,
    #[serde(default)]
    datatype: Option<String>,
    #[serde(rename = "xml:lang", default)]
    language: Option<String>,
}

impl SparqlBinding {
    fn into_value(self) -> Result<RdfValue> {
        match self.kind.as_str() {
            "uri" => Ok(RdfValue::Iri(self.value)),
            "bnode" => Ok(RdfValue::BlankNode(self.value)),
            // "typed-literal" is emitted by older Virtuoso releases
            "literal" | "typed-literal" => Ok(RdfValue::from_literal_parts(
                self.value,
                self.datatype,
                self.language,
            )),
            other => Err(TripleStoreError::ParseError {
                reason: format!("unsupported binding type {other:?}"),
            }),
        }
    }
}

/// Parse a `application/sparql-results+json` SELECT document.
pub(crate) fn parse_select_json(json: &str) -> Result<SelectResult> {
    let response: SparqlSelectResponse =
        serde_json::from_str(json).map_err(|e| TripleStoreError::ParseError {
            reason: format!("Failed to parse SELECT response: {e}"),
        })?;

    let mut rows = Vec::with_capacity(response.results.bindings.len());
    for binding in response.results.bindings {
        let mut row = SelectRow::default();
        for (var, value) in binding {
            row.bindings.insert(var, value.into_value()?);
        }
        rows.push(row);
    }

    Ok(SelectResult {
        variables: response.head.vars,
        rows,
    })
}

#[derive(Deserialize)]
struct SparqlAskResponse {
    boolean: bool,
}

pub(crate) fn parse_ask_json(json: &str) -> Result<bool> {
    let response: SparqlAskResponse =
        serde_json::from_str(json).map_err(|e| TripleStoreError::ParseError {
            reason: format!("Failed to parse ASK response: {e}"),
        })?;

    Ok(response.boolean)
}

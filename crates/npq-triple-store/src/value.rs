//! RDF terms as returned by SELECT queries and written by updates.

use std::fmt;

use crate::error::{Result, TripleStoreError};

pub const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";
pub const RDF_LANG_STRING: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#langString";

/// An RDF value: IRI, literal or blank node.
///
/// `Display` yields the canonical string form: the bare IRI text, `"label"`,
/// `"label"@lang`, `"label"^^<datatype>` or `_:id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RdfValue {
    Iri(String),
    Literal {
        value: String,
        datatype: Option<String>,
        language: Option<String>,
    },
    BlankNode(String),
}

impl RdfValue {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri(iri.into())
    }

    /// Plain (`xsd:string`) literal.
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    /// Literal with a datatype. `xsd:string` collapses to a plain literal.
    pub fn typed_literal(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        let datatype = datatype.into();
        Self::Literal {
            value: value.into(),
            datatype: (datatype != XSD_STRING).then_some(datatype),
            language: None,
        }
    }

    pub fn lang_literal(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self::Literal {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    /// Build a literal from the parts found in query results. The
    /// `rdf:langString` and `xsd:string` datatypes are implied and dropped.
    pub fn from_literal_parts(
        value: String,
        datatype: Option<String>,
        language: Option<String>,
    ) -> Self {
        let datatype = datatype.filter(|dt| {
            dt != XSD_STRING && !(language.is_some() && dt == RDF_LANG_STRING)
        });
        Self::Literal {
            value,
            datatype,
            language,
        }
    }

    /// Lexical value regardless of the term kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Iri(s) | Self::BlankNode(s) => s,
            Self::Literal { value, .. } => value,
        }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Self::Iri(_))
    }

    /// Encode the value as a SPARQL term, for use in `INSERT DATA` blocks and
    /// query patterns.
    pub fn to_sparql(&self) -> Result<String> {
        match self {
            Self::Iri(iri) => sparql_iri(iri),
            Self::BlankNode(id) => {
                if id.is_empty()
                    || !id
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
                {
                    return Err(TripleStoreError::InvalidQuery {
                        reason: format!("invalid blank node label {id:?}"),
                    });
                }
                Ok(format!("_:{id}"))
            }
            Self::Literal {
                value,
                datatype,
                language,
            } => {
                let quoted = format!("\"{}\"", escape_literal(value));
                match (language, datatype) {
                    (Some(lang), _) => {
                        if lang.is_empty()
                            || !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
                        {
                            return Err(TripleStoreError::InvalidQuery {
                                reason: format!("invalid language tag {lang:?}"),
                            });
                        }
                        Ok(format!("{quoted}@{lang}"))
                    }
                    (None, Some(dt)) => Ok(format!("{quoted}^^{}", sparql_iri(dt)?)),
                    (None, None) => Ok(quoted),
                }
            }
        }
    }
}

impl fmt::Display for RdfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Iri(iri) => f.write_str(iri),
            Self::BlankNode(id) => write!(f, "_:{id}"),
            Self::Literal {
                value,
                datatype,
                language,
            } => match (language, datatype) {
                (Some(lang), _) => write!(f, "\"{value}\"@{lang}"),
                (None, Some(dt)) => write!(f, "\"{value}\"^^<{dt}>"),
                (None, None) => write!(f, "\"{value}\""),
            },
        }
    }
}

/// Wrap an IRI in angle brackets, rejecting characters that cannot appear in
/// an IRIREF.
pub fn sparql_iri(iri: &str) -> Result<String> {
    let invalid = iri.is_empty()
        || iri.chars().any(|c| {
            c.is_whitespace()
                || c.is_control()
                || matches!(c, '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\')
        });
    if invalid {
        return Err(TripleStoreError::InvalidQuery {
            reason: format!("invalid IRI {iri:?}"),
        });
    }
    Ok(format!("<{iri}>"))
}

fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(c),
        }
    }
    escaped
}

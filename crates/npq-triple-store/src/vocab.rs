//! Nanopub admin vocabulary.

/// Named graph holding the service's own bookkeeping triples.
pub const ADMIN_GRAPH: &str = "http://purl.org/nanopub/admin/graph";

/// Links a hash IRI to the value it was computed from.
pub const IS_HASH_OF: &str = "http://purl.org/nanopub/admin/isHashOf";

/// Prefix of hash IRIs; the lowercase hex digest is appended.
pub const HASH_PREFIX: &str = "http://purl.org/nanopub/admin/hash/";

//! Value/hash codec.

use npq_triple_store::{RdfValue, vocab::HASH_PREFIX};
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `text`'s UTF-8 bytes.
pub fn sha256_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Something the registry can hash and persist.
pub trait Hashable {
    /// String the hash is computed over.
    fn canonical_string(&self) -> String;

    /// Object written to the admin graph.
    fn to_rdf_value(&self) -> RdfValue;
}

impl Hashable for RdfValue {
    fn canonical_string(&self) -> String {
        self.to_string()
    }

    fn to_rdf_value(&self) -> RdfValue {
        self.clone()
    }
}

/// Plain text hashes as-is and is stored as a plain literal. Note that the
/// hash of `"abc"` as text differs from the hash of the literal `"abc"`,
/// whose canonical form carries the quotes.
impl Hashable for str {
    fn canonical_string(&self) -> String {
        self.to_string()
    }

    fn to_rdf_value(&self) -> RdfValue {
        RdfValue::literal(self)
    }
}

impl Hashable for String {
    fn canonical_string(&self) -> String {
        self.as_str().canonical_string()
    }

    fn to_rdf_value(&self) -> RdfValue {
        self.as_str().to_rdf_value()
    }
}

pub fn hash_of<V: Hashable + ?Sized>(value: &V) -> String {
    sha256_hex(&value.canonical_string())
}

pub fn hash_iri(hash: &str) -> String {
    format!("{HASH_PREFIX}{hash}")
}

/// Hash part of a hash IRI; `None` unless the IRI carries the hash prefix
/// followed by 64 lowercase hex digits.
pub fn hash_from_iri(iri: &str) -> Option<&str> {
    let hash = iri.strip_prefix(HASH_PREFIX)?;
    let well_formed =
        hash.len() == 64 && hash.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    well_formed.then_some(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn sha256_hex_matches_known_digests() {
        assert_eq!(sha256_hex("abc"), ABC);
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn text_hashes_as_is() {
        assert_eq!(hash_of("abc"), ABC);
        assert_eq!(hash_of(&"abc".to_string()), ABC);
        assert_eq!("abc".to_rdf_value(), RdfValue::literal("abc"));
    }

    #[test]
    fn rdf_values_hash_their_canonical_form() {
        let iri = RdfValue::iri("http://example.org/a");
        assert_eq!(hash_of(&iri), sha256_hex("http://example.org/a"));

        let literal = RdfValue::literal("abc");
        assert_eq!(hash_of(&literal), sha256_hex("\"abc\""));
        assert_ne!(hash_of(&literal), hash_of("abc"));

        let tagged = RdfValue::lang_literal("chat", "fr");
        assert_eq!(hash_of(&tagged), sha256_hex("\"chat\"@fr"));

        let typed = RdfValue::typed_literal("1", "http://www.w3.org/2001/XMLSchema#int");
        assert_eq!(
            hash_of(&typed),
            sha256_hex("\"1\"^^<http://www.w3.org/2001/XMLSchema#int>")
        );
    }

    #[test]
    fn xsd_string_hashes_like_plain_literal() {
        let typed = RdfValue::typed_literal("abc", npq_triple_store::XSD_STRING);
        assert_eq!(hash_of(&typed), hash_of(&RdfValue::literal("abc")));
    }

    #[test]
    fn hash_is_deterministic() {
        let value = RdfValue::iri("http://example.org/pubkey");
        assert_eq!(hash_of(&value), hash_of(&value.clone()));
        assert_eq!(hash_of(&value).len(), 64);
    }

    #[test]
    fn hash_iri_round_trips() {
        let iri = hash_iri(ABC);
        assert_eq!(iri, format!("http://purl.org/nanopub/admin/hash/{ABC}"));
        assert_eq!(hash_from_iri(&iri), Some(ABC));
    }

    #[test]
    fn hash_from_iri_rejects_foreign_subjects() {
        assert_eq!(hash_from_iri("http://example.org/hash/abc"), None);
        assert_eq!(hash_from_iri(&hash_iri("abc")), None);
        assert_eq!(hash_from_iri(&hash_iri(&ABC.to_uppercase())), None);
        assert_eq!(hash_from_iri(HASH_PREFIX), None);
    }
}

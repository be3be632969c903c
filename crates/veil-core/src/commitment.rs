//! # Commitment — One-Way Content Digests
//!
//! A `Commitment` binds to data without revealing it: a proof can reference
//! "this value" while only the 256-bit SHA-256 digest crosses the boundary.
//!
//! ## Security Invariant
//!
//! Commitments are keyless. A party holding only the digest (and the
//! candidate preimage) can verify it without access to any encryption key.
//!
//! ## Wire Format
//!
//! `Display` renders the external form: `0x` followed by 64 lowercase hex
//! characters. `to_hex()` is the internal form: unprefixed lowercase hex.
//! `parse()` accepts the external form.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::CanonicalBytes;
use crate::error::CoreError;

/// Length of a commitment digest in bytes.
pub const COMMITMENT_LEN: usize = 32;

/// A 256-bit one-way commitment to some content.
///
/// Deterministic: the same input bytes always produce the same commitment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Commitment([u8; COMMITMENT_LEN]);

impl Commitment {
    /// Commit to canonicalized structured data.
    ///
    /// This is the required path for anything built from key/value fields:
    /// the `CanonicalBytes` argument guarantees both sides of a comparison
    /// serialized identically.
    pub fn of(data: &CanonicalBytes) -> Self {
        Self::of_bytes(data.as_bytes())
    }

    /// Commit to an opaque byte payload.
    pub fn of_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        let mut bytes = [0u8; COMMITMENT_LEN];
        bytes.copy_from_slice(&hash);
        Self(bytes)
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; COMMITMENT_LEN] {
        &self.0
    }

    /// Render the digest as unprefixed lowercase hex (internal form).
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a commitment from its external `0x`-prefixed hex form.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidCommitment` if the prefix is missing,
    /// the length is wrong, or a character is not lowercase hex.
    pub fn parse(s: &str) -> Result<Self, CoreError> {
        let hex = s
            .strip_prefix("0x")
            .ok_or_else(|| CoreError::InvalidCommitment(format!("missing 0x prefix: {s:?}")))?;
        if hex.len() != COMMITMENT_LEN * 2 {
            return Err(CoreError::InvalidCommitment(format!(
                "expected {} hex chars, got {}",
                COMMITMENT_LEN * 2,
                hex.len()
            )));
        }
        if hex.bytes().any(|b| b.is_ascii_uppercase()) {
            return Err(CoreError::InvalidCommitment(format!(
                "hex must be lowercase: {s:?}"
            )));
        }
        let mut bytes = [0u8; COMMITMENT_LEN];
        for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk)
                .map_err(|_| CoreError::InvalidCommitment("non-utf8 hex".to_string()))?;
            bytes[i] = u8::from_str_radix(pair, 16)
                .map_err(|_| CoreError::InvalidCommitment(format!("invalid hex pair: {pair:?}")))?;
        }
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// Commit to a named subset of a string payload.
///
/// The subset is canonicalized as a JSON object (JCS sorts keys
/// lexicographically), so the commitment is reproducible regardless of the
/// order field names are supplied in.
///
/// # Errors
///
/// Returns `CoreError::MissingField` if a named field is absent from the
/// payload, and propagates canonicalization failures.
pub fn commit_fields<'a>(
    payload: &std::collections::BTreeMap<String, String>,
    fields: impl IntoIterator<Item = &'a String>,
) -> Result<Commitment, CoreError> {
    let mut subset = std::collections::BTreeMap::new();
    for name in fields {
        let value = payload
            .get(name)
            .ok_or_else(|| CoreError::MissingField(name.clone()))?;
        subset.insert(name.as_str(), value.as_str());
    }
    let cb = CanonicalBytes::new(&subset)?;
    Ok(Commitment::of(&cb))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = Commitment::of_bytes(b"hello");
        let b = Commitment::of_bytes(b"hello");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_inputs_distinct_commitments() {
        // Many distinct inputs, no collisions expected at 256 bits.
        let mut seen = std::collections::HashSet::new();
        for i in 0..1000u32 {
            let c = Commitment::of_bytes(&i.to_be_bytes());
            assert!(seen.insert(c), "collision at input {i}");
        }
    }

    #[test]
    fn canonical_and_raw_paths_agree() {
        let cb = CanonicalBytes::new(&serde_json::json!({"a": 1})).unwrap();
        assert_eq!(Commitment::of(&cb), Commitment::of_bytes(cb.as_bytes()));
    }

    #[test]
    fn display_is_prefixed_lowercase_hex() {
        let c = Commitment::of_bytes(b"data");
        let s = c.to_string();
        assert!(s.starts_with("0x"));
        assert_eq!(s.len(), 2 + 64);
        assert!(s[2..].chars().all(|ch| ch.is_ascii_hexdigit() && !ch.is_ascii_uppercase()));
    }

    #[test]
    fn parse_round_trips_display() {
        let c = Commitment::of_bytes(b"round trip");
        let parsed = Commitment::parse(&c.to_string()).expect("parse");
        assert_eq!(c, parsed);
    }

    #[test]
    fn parse_rejects_missing_prefix() {
        let hex = Commitment::of_bytes(b"x").to_hex();
        assert!(Commitment::parse(&hex).is_err());
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert!(Commitment::parse("0xabcd").is_err());
    }

    #[test]
    fn parse_rejects_non_hex() {
        let s = format!("0x{}", "zz".repeat(32));
        assert!(Commitment::parse(&s).is_err());
    }

    #[test]
    fn parse_rejects_uppercase_hex() {
        let upper = Commitment::of_bytes(b"case").to_string().to_uppercase();
        let s = format!("0x{}", &upper[2..]);
        assert!(Commitment::parse(&s).is_err());
    }

    #[test]
    fn commit_fields_order_independent() {
        let payload: std::collections::BTreeMap<String, String> = [
            ("name", "Alice"),
            ("age", "30"),
            ("country", "US"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let forward = vec!["age".to_string(), "name".to_string()];
        let backward = vec!["name".to_string(), "age".to_string()];
        let a = commit_fields(&payload, &forward).expect("commit");
        let b = commit_fields(&payload, &backward).expect("commit");
        assert_eq!(a, b);
    }

    #[test]
    fn commit_fields_missing_field() {
        let payload = std::collections::BTreeMap::new();
        let fields = vec!["ghost".to_string()];
        match commit_fields(&payload, &fields) {
            Err(CoreError::MissingField(name)) => assert_eq!(name, "ghost"),
            other => panic!("expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn commit_fields_subset_differs_from_full() {
        let payload: std::collections::BTreeMap<String, String> =
            [("a", "1"), ("b", "2")]
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
        let just_a = vec!["a".to_string()];
        let both = vec!["a".to_string(), "b".to_string()];
        assert_ne!(
            commit_fields(&payload, &just_a).unwrap(),
            commit_fields(&payload, &both).unwrap()
        );
    }

    #[test]
    fn known_sha256_vector() {
        // SHA256 of the empty JSON object "{}".
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(
            Commitment::of(&cb).to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }
}

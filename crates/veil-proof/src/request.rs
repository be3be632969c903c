//! # ProofRequest — Classified Payload Model
//!
//! The data shape a caller submits to the lifecycle engine. Every payload
//! field must be classified into exactly one of the private or public sets
//! — total classification. A field in both sets or in neither is a
//! construction error, not a runtime surprise three stages later.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What the proof is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProofKind {
    /// Prove facts about an identity without revealing it.
    Identity,
    /// Prove properties of a transaction.
    Transaction,
    /// Prove that data matches a commitment.
    DataIntegrity,
}

impl ProofKind {
    /// Returns the kind identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Transaction => "transaction",
            Self::DataIntegrity => "data_integrity",
        }
    }
}

impl std::fmt::Display for ProofKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A malformed proof request. Caller bug; not retryable as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    /// A field appears in both the private and the public set.
    #[error("invalid request: field {0:?} is classified as both private and public")]
    DoublyClassified(String),

    /// A payload field appears in neither set.
    #[error("invalid request: field {0:?} is not classified as private or public")]
    Unclassified(String),

    /// A classified field name has no corresponding payload entry.
    #[error("invalid request: classified field {0:?} is absent from the payload")]
    UnknownField(String),
}

/// A proof request: payload plus a total, disjoint field classification.
///
/// Construct via [`ProofRequest::new`], which rejects any violation of the
/// classification invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRequest {
    kind: ProofKind,
    payload: BTreeMap<String, String>,
    private_fields: BTreeSet<String>,
    public_fields: BTreeSet<String>,
}

impl ProofRequest {
    /// Build a request, enforcing the classification invariant.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] if the private and public sets overlap,
    /// if a payload field is left unclassified, or if a classified name
    /// has no payload entry.
    pub fn new(
        kind: ProofKind,
        payload: BTreeMap<String, String>,
        private_fields: BTreeSet<String>,
        public_fields: BTreeSet<String>,
    ) -> Result<Self, RequestError> {
        let request = Self {
            kind,
            payload,
            private_fields,
            public_fields,
        };
        request.validate()?;
        Ok(request)
    }

    /// Re-check the classification invariant.
    ///
    /// The constructor already enforces it; the engine's Validation stage
    /// calls this again so a request that arrived through deserialization
    /// is held to the same rule.
    pub fn validate(&self) -> Result<(), RequestError> {
        if let Some(field) = self.private_fields.intersection(&self.public_fields).next() {
            return Err(RequestError::DoublyClassified(field.clone()));
        }
        for field in self.private_fields.iter().chain(&self.public_fields) {
            if !self.payload.contains_key(field) {
                return Err(RequestError::UnknownField(field.clone()));
            }
        }
        for field in self.payload.keys() {
            if !self.private_fields.contains(field) && !self.public_fields.contains(field) {
                return Err(RequestError::Unclassified(field.clone()));
            }
        }
        Ok(())
    }

    /// What the proof is about.
    pub fn kind(&self) -> ProofKind {
        self.kind
    }

    /// The full field→value payload.
    pub fn payload(&self) -> &BTreeMap<String, String> {
        &self.payload
    }

    /// Field names whose values must never leave the client.
    pub fn private_fields(&self) -> &BTreeSet<String> {
        &self.private_fields
    }

    /// Field names whose commitments become public signals.
    pub fn public_fields(&self) -> &BTreeSet<String> {
        &self.public_fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn names(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn total_disjoint_classification_accepted() {
        let request = ProofRequest::new(
            ProofKind::Identity,
            payload(&[("name", "Alice"), ("age", "30"), ("country", "US")]),
            names(&["name", "age"]),
            names(&["country"]),
        )
        .expect("valid request");
        assert_eq!(request.kind(), ProofKind::Identity);
        assert_eq!(request.private_fields().len(), 2);
        assert_eq!(request.public_fields().len(), 1);
    }

    #[test]
    fn field_in_both_sets_rejected() {
        let err = ProofRequest::new(
            ProofKind::Transaction,
            payload(&[("amount", "100")]),
            names(&["amount"]),
            names(&["amount"]),
        )
        .unwrap_err();
        assert_eq!(err, RequestError::DoublyClassified("amount".to_string()));
    }

    #[test]
    fn unclassified_field_rejected() {
        let err = ProofRequest::new(
            ProofKind::DataIntegrity,
            payload(&[("doc", "hash"), ("stray", "x")]),
            names(&["doc"]),
            names(&[]),
        )
        .unwrap_err();
        assert_eq!(err, RequestError::Unclassified("stray".to_string()));
    }

    #[test]
    fn classified_but_absent_field_rejected() {
        let err = ProofRequest::new(
            ProofKind::Identity,
            payload(&[("name", "Bob")]),
            names(&["name", "ghost"]),
            names(&[]),
        )
        .unwrap_err();
        assert_eq!(err, RequestError::UnknownField("ghost".to_string()));
    }

    #[test]
    fn empty_payload_with_empty_sets_is_valid() {
        assert!(ProofRequest::new(
            ProofKind::DataIntegrity,
            BTreeMap::new(),
            BTreeSet::new(),
            BTreeSet::new(),
        )
        .is_ok());
    }

    #[test]
    fn kind_strings() {
        assert_eq!(ProofKind::Identity.to_string(), "identity");
        assert_eq!(ProofKind::Transaction.to_string(), "transaction");
        assert_eq!(ProofKind::DataIntegrity.to_string(), "data_integrity");
    }
}

//! # Data Model
//!
//! Entities from the specification's data model: DID documents and their
//! constituents, W3C Verifiable Presentations/Credentials, and the proof
//! envelope carried by both.
//!
//! All types here are immutable value objects constructed for the duration
//! of a single resolution call (see the crate's concurrency notes); there is
//! no process-wide mutable state in this module.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Kind, OneMany};

/// A resolved DID document.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DidDocument {
    /// The DID this document describes.
    pub id: String,

    /// Services advertised by the DID subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<Vec<Service>>,

    /// Verification methods (keys) associated with the DID subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<Vec<VerificationMethod>>,
}

impl DidDocument {
    /// Services whose `type` equals `type_name`.
    pub fn services_of_type<'a>(&'a self, type_name: &'a str) -> impl Iterator<Item = &'a Service> {
        self.service.iter().flatten().filter(move |s| s.type_ == type_name)
    }

    /// Looks up a verification method by its full `id` (`<DID>#<fragment>`).
    #[must_use]
    pub fn verification_method(&self, id: &str) -> Option<&VerificationMethod> {
        self.verification_method.as_ref()?.iter().find(|vm| vm.id == id)
    }
}

/// A service entry in a DID document.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    /// `<DID>#<fragment>`.
    pub id: String,

    /// Service type, e.g. `LinkedVerifiablePresentation`.
    #[serde(rename = "type")]
    pub type_: String,

    /// One or more endpoint URLs.
    pub service_endpoint: OneMany<String>,
}

impl Service {
    /// The fragment portion of `id` (after `#`), used to match the
    /// `vpr-schemas*-c-vp` / `vpr-ecs*-c-vp` patterns.
    #[must_use]
    pub fn fragment(&self) -> &str {
        self.id.split_once('#').map_or("", |(_, frag)| frag)
    }

    /// The first endpoint URL.
    #[must_use]
    pub fn first_endpoint(&self) -> Option<&str> {
        match &self.service_endpoint {
            OneMany::One(s) => Some(s.as_str()),
            OneMany::Many(many) => many.first().map(String::as_str),
        }
    }
}

/// Key material format carried by a [`VerificationMethod`].
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// `<DID>#<fragment>`.
    pub id: String,

    /// Suite/type, e.g. `Ed25519VerificationKey2020`.
    #[serde(rename = "type")]
    pub type_: String,

    /// The DID that controls this key.
    pub controller: String,

    /// Multibase-encoded public key (only `z`-prefixed / base58-btc
    /// accepted, per C1).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_multibase: Option<String>,

    /// Base58 (no multibase prefix) encoded public key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_base58: Option<String>,

    /// JSON Web Key form.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_key_jwk: Option<Value>,
}

/// A W3C Verifiable Presentation.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiablePresentation {
    /// `@context`.
    #[serde(rename = "@context")]
    pub context: Value,

    /// Presentation `id`, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Must include `VerifiablePresentation`.
    #[serde(rename = "type")]
    pub type_: OneMany<String>,

    /// The entity presenting the credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,

    /// Embedded credentials.
    pub verifiable_credential: Vec<Kind<VerifiableCredential>>,

    /// Embedded Data Integrity proof(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<OneMany<Proof>>,
}

impl VerifiablePresentation {
    /// `type` includes `VerifiablePresentation`.
    #[must_use]
    pub fn is_presentation(&self) -> bool {
        match &self.type_ {
            OneMany::One(t) => t == "VerifiablePresentation",
            OneMany::Many(ts) => ts.iter().any(|t| t == "VerifiablePresentation"),
        }
    }
}

/// A W3C Verifiable Credential.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    /// `@context`.
    #[serde(rename = "@context")]
    pub context: Value,

    /// Credential `id`, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Must include `VerifiableCredential`.
    #[serde(rename = "type")]
    pub type_: OneMany<String>,

    /// The entity that issued the credential: a bare DID or an object
    /// carrying at least `id`.
    pub issuer: Kind<IssuerObject>,

    /// ISO-8601 issuance timestamp.
    pub issuance_date: String,

    /// Schema reference; single object or singleton array (normalized by
    /// [`crate::credential`]).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_schema: Option<OneMany<CredentialSchema>>,

    /// Subject claims; single object or singleton array (normalized by
    /// [`crate::credential`]).
    pub credential_subject: OneMany<Value>,

    /// Embedded Data Integrity proof(s).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<OneMany<Proof>>,
}

impl VerifiableCredential {
    /// The issuer DID, whichever form (`Kind::String` or `Kind::Object`)
    /// it was expressed in.
    #[must_use]
    pub fn issuer_id(&self) -> &str {
        match &self.issuer {
            Kind::String(s) => s.as_str(),
            Kind::Object(o) => o.id.as_str(),
        }
    }
}

/// Object form of `issuer`: `{ id: DID, ... }`.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IssuerObject {
    /// The issuer DID.
    pub id: String,

    /// Any additional issuer metadata, preserved but not interpreted.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

/// `credentialSchema` entry.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CredentialSchema {
    /// Schema document `id`/URL.
    pub id: String,

    /// `JsonSchemaCredential` (one more hop to resolve) or `JsonSchema`
    /// (terminal).
    #[serde(rename = "type")]
    pub type_: String,

    /// SRI digest over the schema bytes fetched from `id`.
    #[serde(rename = "digestSRI", skip_serializing_if = "Option::is_none")]
    pub digest_sri: Option<String>,
}

/// Data Integrity proof, covering both supported cryptosuites.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// `Ed25519Signature2018` or `Ed25519Signature2020`.
    #[serde(rename = "type")]
    pub type_: String,

    /// DID URL of the key used to produce the proof.
    pub verification_method: String,

    /// Creation timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,

    /// Intended use of the proof, e.g. `assertionMethod`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_purpose: Option<String>,

    /// 2020-suite signature: multibase base58.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_value: Option<String>,

    /// 2018-suite signature: detached JWS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jws: Option<String>,

    /// Challenge, present on presentation proofs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,

    /// Any remaining proof members (e.g. `domain`), preserved for
    /// canonicalization but not otherwise interpreted.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn service_fragment_splits_on_hash() {
        let svc = Service {
            id: "did:web:example.com#vpr-schemas-trust-registry-c-vp".to_string(),
            type_: "LinkedVerifiablePresentation".to_string(),
            service_endpoint: OneMany::One("https://example.com/vp".to_string()),
        };
        assert_eq!(svc.fragment(), "vpr-schemas-trust-registry-c-vp");
    }

    #[test]
    fn issuer_id_handles_both_forms() {
        let vc_str_issuer: VerifiableCredential = serde_json::from_value(json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential"],
            "issuer": "did:web:example.com",
            "issuanceDate": "2025-01-01T00:00:00Z",
            "credentialSubject": {"id": "did:web:example.com"}
        }))
        .unwrap();
        assert_eq!(vc_str_issuer.issuer_id(), "did:web:example.com");

        let vc_obj_issuer: VerifiableCredential = serde_json::from_value(json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential"],
            "issuer": {"id": "did:web:example.com", "name": "Example"},
            "issuanceDate": "2025-01-01T00:00:00Z",
            "credentialSubject": {"id": "did:web:example.com"}
        }))
        .unwrap();
        assert_eq!(vc_obj_issuer.issuer_id(), "did:web:example.com");
    }

    #[test]
    fn one_many_credential_subject_normalizes() {
        let vc: VerifiableCredential = serde_json::from_value(json!({
            "@context": ["https://www.w3.org/2018/credentials/v1"],
            "type": ["VerifiableCredential"],
            "issuer": "did:web:example.com",
            "issuanceDate": "2025-01-01T00:00:00Z",
            "credentialSubject": [{"id": "did:web:example.com"}]
        }))
        .unwrap();
        assert_eq!(vc.credential_subject.len(), 1);
        assert!(vc.credential_subject.first().is_some());
    }
}

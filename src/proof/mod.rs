//! # JSON-LD Proof Verifier (C5)
//!
//! Verifies the Data Integrity proof on a Verifiable Presentation or
//! Verifiable Credential: URDNA2015 canonicalization of the document and its
//! proof options, SHA-256 hashing of both, and an Ed25519 signature check
//! over the suite-specific `verifyData` encoding.

mod canonicalize;
mod jose;

use std::sync::Arc;

use ed25519_dalek::{Signature, VerifyingKey};
use iref::IriBuf;
use serde_json::Value;

use crate::error::{Result, TrustError};
use crate::hash::{ed25519_raw_key, multibase_decode, Algorithm};
use crate::loader::TrustDocumentLoader;
use crate::model::{DidDocument, Proof};
use crate::resolver::SharedDidResolver;

const ED25519_2018: &str = "Ed25519Signature2018";
const ED25519_2020: &str = "Ed25519Signature2020";

/// Verifies every proof reachable from `document` (a JSON-LD-serialized VP
/// or VC): the document's own proof, and if it is a presentation, every
/// embedded credential's proof, one presentation level deep (§4.C5's
/// "a VP cannot appear inside a VP" bound).
pub async fn verify_document(
    document: &Value, did_resolver: &SharedDidResolver, loader: &TrustDocumentLoader,
) -> Result<()> {
    verify_one(document, did_resolver, loader).await?;

    let is_presentation = type_includes(document, "VerifiablePresentation");
    if is_presentation {
        let credentials = document
            .get("verifiableCredential")
            .map(|v| if let Value::Array(a) = v { a.clone() } else { vec![v.clone()] })
            .unwrap_or_default();
        for credential in &credentials {
            if credential.get("proof").is_some() {
                if type_includes(credential, "VerifiablePresentation") {
                    return Err(TrustError::Invalid("a verifiable presentation cannot embed another presentation".into()));
                }
                verify_one(credential, did_resolver, loader).await?;
            }
        }
    }

    Ok(())
}

fn type_includes(document: &Value, wanted: &str) -> bool {
    match document.get("type") {
        Some(Value::String(s)) => s == wanted,
        Some(Value::Array(items)) => items.iter().any(|t| t.as_str() == Some(wanted)),
        _ => false,
    }
}

/// Verifies a single document's own `proof` member (C5 steps 1-9).
async fn verify_one(document: &Value, did_resolver: &SharedDidResolver, loader: &TrustDocumentLoader) -> Result<()> {
    if !type_includes(document, "VerifiablePresentation") && !type_includes(document, "VerifiableCredential") {
        return Err(TrustError::Invalid("document type includes neither VerifiablePresentation nor VerifiableCredential".into()));
    }

    let context = document
        .get("@context")
        .or_else(|| document.get("context"))
        .cloned()
        .ok_or_else(|| TrustError::Invalid("document has no @context".to_string()))?;

    let proof_value = document.get("proof").ok_or_else(|| TrustError::Invalid("document has no proof".to_string()))?;
    let proof: Proof = serde_json::from_value(proof_value.clone())
        .map_err(|e| TrustError::Invalid(format!("malformed proof: {e}")))?;

    if proof.type_ != ED25519_2018 && proof.type_ != ED25519_2020 {
        return Err(TrustError::Invalid(format!("unsupported proof type {:?}", proof.type_)));
    }
    if proof.verification_method.is_empty() {
        return Err(TrustError::Invalid("proof has no verificationMethod".to_string()));
    }

    let proof_options = build_proof_options(proof_value, &context)?;
    let document_copy = without_member(document, "proof");

    let base = synthetic_base_iri(document);
    let proof_options_nquads = canonicalize::canonicalize(&to_syntax(&proof_options)?, &base, loader).await?;
    let document_nquads = canonicalize::canonicalize(&to_syntax(&document_copy)?, &base, loader).await?;

    let proof_hash = Algorithm::Sha256.digest(proof_options_nquads.as_bytes());
    let doc_hash = Algorithm::Sha256.digest(document_nquads.as_bytes());

    let (signature, verify_data) = match proof.type_.as_str() {
        ED25519_2020 => {
            let proof_value = proof
                .proof_value
                .as_ref()
                .ok_or_else(|| TrustError::Invalid("2020 proof missing proofValue".to_string()))?;
            let signature = multibase_decode(proof_value)?;
            let mut verify_data = proof_hash;
            verify_data.extend_from_slice(&doc_hash);
            (signature, verify_data)
        }
        ED25519_2018 => {
            let jws = proof.jws.as_ref().ok_or_else(|| TrustError::Invalid("2018 proof missing jws".to_string()))?;
            let parsed = jose::parse_detached(jws)?;
            let mut verify_data = format!("{}.", parsed.protected_header).into_bytes();
            verify_data.extend_from_slice(&proof_hash);
            verify_data.extend_from_slice(&doc_hash);
            (parsed.signature, verify_data)
        }
        other => return Err(TrustError::Invalid(format!("unsupported proof type {other:?}"))),
    };

    let public_key = resolve_public_key(&proof.verification_method, did_resolver).await?;
    ed25519_verify(&public_key, &verify_data, &signature)
}

fn build_proof_options(proof: &Value, context: &Value) -> Result<Value> {
    let mut object = proof
        .as_object()
        .cloned()
        .ok_or_else(|| TrustError::Invalid("proof is not an object".to_string()))?;
    object.remove("proofValue");
    object.remove("jws");
    object.insert("@context".to_string(), context.clone());
    Ok(Value::Object(object))
}

fn without_member(document: &Value, member: &str) -> Value {
    let mut object = document.as_object().cloned().unwrap_or_default();
    object.remove(member);
    Value::Object(object)
}

fn to_syntax(value: &Value) -> Result<json_syntax::Value> {
    Ok(json_syntax::Value::from(value.clone()))
}

/// Every canonicalization needs a base IRI to resolve relative `@context`
/// entries against; the document's own `id`, if any, else a fixed opaque
/// placeholder (canonicalization never emits the base IRI itself into the
/// dataset unless the document uses relative IRIs, which ours never do).
fn synthetic_base_iri(document: &Value) -> IriBuf {
    let candidate = document.get("id").and_then(Value::as_str).unwrap_or("urn:uuid:00000000-0000-0000-0000-000000000000");
    IriBuf::new(candidate.to_string())
        .unwrap_or_else(|_| IriBuf::new("urn:uuid:00000000-0000-0000-0000-000000000000".to_string()).unwrap())
}

/// Resolves `verification_method` (a `<DID>#<fragment>` URL) via the
/// configured resolver and extracts its Ed25519 public key, trying
/// `publicKeyMultibase`, then `publicKeyBase58`, then `publicKeyJwk.x` in
/// that order (C5 step 8).
async fn resolve_public_key(verification_method: &str, did_resolver: &SharedDidResolver) -> Result<VerifyingKey> {
    let did = verification_method.split_once('#').map_or(verification_method, |(base, _)| base);
    let document: DidDocument = did_resolver.resolve(did).await?;
    let vm = document
        .verification_method(verification_method)
        .ok_or_else(|| TrustError::NotFound(format!("verification method {verification_method:?} not found in {did:?}")))?;

    let raw = if let Some(multibase) = &vm.public_key_multibase {
        ed25519_raw_key(&multibase_decode(multibase)?)?
    } else if let Some(base58) = &vm.public_key_base58 {
        ed25519_raw_key(&bs58::decode(base58).into_vec().map_err(|e| TrustError::Invalid(format!("invalid base58 public key: {e}")))?)?
    } else if let Some(jwk) = &vm.public_key_jwk {
        let x = jwk
            .get("x")
            .and_then(Value::as_str)
            .ok_or_else(|| TrustError::Invalid("publicKeyJwk missing x".to_string()))?;
        ed25519_raw_key(&crate::hash::base64url_decode(x)?)?
    } else {
        return Err(TrustError::Invalid(format!("verification method {verification_method:?} carries no recognized key material")));
    };

    VerifyingKey::from_bytes(&raw).map_err(|e| TrustError::Invalid(format!("invalid ed25519 public key: {e}")))
}

fn ed25519_verify(public_key: &VerifyingKey, data: &[u8], signature: &[u8]) -> Result<()> {
    let signature = Signature::from_slice(signature)
        .map_err(|e| TrustError::VerificationFailed(format!("malformed ed25519 signature: {e}")))?;
    public_key
        .verify_strict(data, &signature)
        .map_err(|_| TrustError::VerificationFailed("ed25519 signature verification failed".to_string()))
}

/// Convenience: builds the default, shared DID resolver + document loader
/// pair used when a caller has not supplied its own.
#[must_use]
pub fn default_verification_context() -> (SharedDidResolver, TrustDocumentLoader) {
    let resolver: SharedDidResolver = Arc::new(crate::resolver::DefaultDidResolver::new());
    let loader = TrustDocumentLoader::new(resolver.clone());
    (resolver, loader)
}

//! Shared fixture builders for the end-to-end trust resolution tests.
//!
//! Builds real Ed25519-signed VPs/VCs over a real URDNA2015 canonicalization,
//! reimplemented here independently of the library's own (private)
//! canonicalizer so these tests exercise the library's verification path on
//! its own terms.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use iref::IriBuf;
use json_ld::rdf::RdfDirection;
use json_ld::{JsonLdProcessor, RdfQuads, RemoteDocument, RemoteDocumentReference};
use oxrdf::{BlankNode, Dataset, GraphName, Literal, NamedNode, Quad, Subject, Term};
use rdf_types::generator;
use serde_json::{json, Map, Value};
use sha2::Digest as _;
use url::Url;
use verifiable_trust::core::OneMany;
use verifiable_trust::hash::{base64_decode, base64_encode};
use verifiable_trust::loader::with_default_resolver;
use verifiable_trust::model::{DidDocument, Service, VerificationMethod};
use verifiable_trust::registry::VerifiablePublicRegistry;
use verifiable_trust::resolver::{BoxFuture, DidResolver};
use verifiable_trust::{Result, TrustError};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A fixed issuance/creation timestamp used across fixtures; only its
/// position relative to a permission's effective window matters.
pub const FIXED_DATE: &str = "2026-01-01T00:00:00Z";

/// A generic schema validating the outer VC wrapper shape, independent of
/// subject classification.
const OUTER_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "type": "object",
  "required": ["@context", "type", "issuer", "issuanceDate", "credentialSubject"]
}"#;

/// Wraps a fixed Ed25519 keypair used to sign fixture VPs/VCs.
pub struct FixtureSigner {
    signing_key: SigningKey,
}

impl FixtureSigner {
    #[must_use]
    pub fn new(seed: [u8; 32]) -> Self {
        Self { signing_key: SigningKey::from_bytes(&seed) }
    }

    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }

    /// `z`-prefixed multibase, multicodec-prefixed Ed25519 public key.
    #[must_use]
    pub fn multibase_public_key(&self) -> String {
        let mut bytes = vec![0xed, 0x01];
        bytes.extend_from_slice(self.verifying_key().as_bytes());
        format!("z{}", bs58::encode(bytes).into_string())
    }
}

#[must_use]
pub fn did_document(did: &str, services: Vec<Service>, verification_methods: Vec<VerificationMethod>) -> DidDocument {
    DidDocument {
        id: did.to_string(),
        service: if services.is_empty() { None } else { Some(services) },
        verification_method: if verification_methods.is_empty() { None } else { Some(verification_methods) },
    }
}

#[must_use]
pub fn service(did: &str, fragment: &str, type_: &str, endpoint: &str) -> Service {
    Service { id: format!("{did}#{fragment}"), type_: type_.to_string(), service_endpoint: OneMany::One(endpoint.to_string()) }
}

#[must_use]
pub fn verification_method(did: &str, fragment: &str, signer: &FixtureSigner) -> VerificationMethod {
    VerificationMethod {
        id: format!("{did}#{fragment}"),
        type_: "Ed25519VerificationKey2020".to_string(),
        controller: did.to_string(),
        public_key_multibase: Some(signer.multibase_public_key()),
        public_key_base58: None,
        public_key_jwk: None,
    }
}

/// Resolves DIDs from a fixed in-memory table, failing any DID not present.
pub struct MockDidResolver {
    documents: HashMap<String, DidDocument>,
}

impl MockDidResolver {
    pub fn new(entries: impl IntoIterator<Item = (String, DidDocument)>) -> Self {
        Self { documents: entries.into_iter().collect() }
    }
}

impl DidResolver for MockDidResolver {
    fn resolve<'a>(&'a self, did: &'a str) -> BoxFuture<'a, Result<DidDocument>> {
        Box::pin(async move {
            self.documents.get(did).cloned().ok_or_else(|| TrustError::NotFound(format!("no fixture DID document for {did:?}")))
        })
    }
}

/// Like [`MockDidResolver`], but records the distinct DIDs resolved, in
/// first-seen order, so a test can assert exactly which DIDs were touched.
pub struct CountingMockDidResolver {
    inner: MockDidResolver,
    pub resolved_dids: Arc<Mutex<Vec<String>>>,
}

impl CountingMockDidResolver {
    pub fn new(entries: impl IntoIterator<Item = (String, DidDocument)>) -> Self {
        Self { inner: MockDidResolver::new(entries), resolved_dids: Arc::new(Mutex::new(Vec::new())) }
    }
}

impl DidResolver for CountingMockDidResolver {
    fn resolve<'a>(&'a self, did: &'a str) -> BoxFuture<'a, Result<DidDocument>> {
        Box::pin(async move {
            {
                let mut seen = self.resolved_dids.lock().expect("resolved_dids mutex is never poisoned");
                if !seen.iter().any(|d| d == did) {
                    seen.push(did.to_string());
                }
            }
            self.inner.resolve(did).await
        })
    }
}

/// Mounts a passing `ISSUER` permission at `{path_prefix}/perm/v1/list`.
pub async fn mount_permission_ok(server: &MockServer, path_prefix: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{path_prefix}/perm/v1/list")))
        .and(query_param("type", "ISSUER"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "permissions": [{
                "type": "ISSUER",
                "created": "2020-01-01T00:00:00Z",
                "effective_until": "2100-01-01T00:00:00Z"
            }]
        })))
        .mount(server)
        .await;
}

/// Builds an unsigned `JsonSchemaCredential`-shaped VC whose
/// `credentialSubject.jsonSchema.$ref` is `json_schema_ref`. Used only by
/// [`verifiable_trust::verify_permissions`], which never checks its proof.
#[must_use]
pub fn build_json_schema_credential(_signer: &FixtureSigner, did: &str, json_schema_ref: &str) -> Value {
    json!({
        "@context": ["https://www.w3.org/2018/credentials/v1"],
        "id": format!("urn:uuid:json-schema-credential-{did}"),
        "type": ["VerifiableCredential"],
        "issuer": did,
        "issuanceDate": FIXED_DATE,
        "credentialSubject": {
            "id": did,
            "jsonSchema": {"$ref": json_schema_ref}
        }
    })
}

/// Corrupts the embedded VC's outer `credentialSchema.digestSRI` so the
/// schema fetch's SRI check fails, while staying valid base64 (so the
/// failure is a digest mismatch, not a parse error).
pub fn corrupt_outer_digest(vp: &mut Value) {
    let digest = vp["verifiableCredential"][0]["credentialSchema"]["digestSRI"]
        .as_str()
        .expect("fixture VC carries credentialSchema.digestSRI")
        .to_string();
    let (algo, b64) = digest.split_once('-').expect("fixture digest is algo-base64");
    let mut bytes = base64_decode(b64).expect("fixture digest is valid base64");
    bytes[0] ^= 0xff;
    vp["verifiableCredential"][0]["credentialSchema"]["digestSRI"] = json!(format!("{algo}-{}", base64_encode(&bytes)));
}

/// Builds a signed `LinkedVerifiablePresentation` VP embedding a single,
/// signed, `JsonSchema`-typed VC over `subject_attrs`.
///
/// `vp_signer`/`vp_did` sign and identify the presentation (the DID hosting
/// the service); `vc_signer`/`vc_issuer_did` sign and identify the embedded
/// credential's issuer — distinct from the VP's own signer whenever the
/// service was issued by an external trust authority.
///
/// The embedded `credentialSubject.jsonSchema.$ref` is written as
/// `registry.id`-prefixed (the logical, claimed URL), while the inner
/// schema is actually served from `registry.base_urls[0]` (the physical
/// origin) — exactly as C7 expects to rewrite one into the other. The two
/// are allowed to differ: a test exercising that rewrite passes a
/// `registry.id` that is not itself fetchable.
#[allow(clippy::too_many_arguments)]
pub async fn build_vp_for_subject(
    vp_signer: &FixtureSigner, vp_did: &str, vc_signer: &FixtureSigner, vc_issuer_did: &str, server: &MockServer,
    kind: &str, subject_attrs: Value, inner_schema_text: &str, registry: &VerifiablePublicRegistry,
) -> Value {
    let base_url = registry.base_urls.first().expect("fixture registry carries a base URL");
    let inner_ref = format!("{}schemas/ecs-{kind}-inner.json", registry.id);
    let inner_physical_url = format!("{base_url}schemas/ecs-{kind}-inner.json");
    mount_text(server, &inner_physical_url, inner_schema_text).await;
    let inner_digest = format!("sha256-{}", base64_encode(&sha2::Sha256::digest(inner_schema_text.as_bytes())));

    let outer_url = format!("{}/schemas/{kind}-outer.json", server.uri());
    mount_text(server, &outer_url, OUTER_SCHEMA).await;
    let outer_digest = format!("sha256-{}", base64_encode(&sha2::Sha256::digest(OUTER_SCHEMA.as_bytes())));

    let mut subject = subject_attrs.as_object().cloned().expect("subject_attrs is a JSON object");
    subject.insert("jsonSchema".to_string(), json!({"$ref": inner_ref}));
    subject.insert("digestSRI".to_string(), json!(inner_digest));

    let context = json!(["https://www.w3.org/2018/credentials/v1", {"@vocab": "https://example.test/vocab#"}]);

    let mut vc = Map::new();
    vc.insert("@context".to_string(), context.clone());
    vc.insert("id".to_string(), json!(format!("urn:uuid:vc-{kind}-{vc_issuer_did}")));
    vc.insert("type".to_string(), json!(["VerifiableCredential"]));
    vc.insert("issuer".to_string(), json!(vc_issuer_did));
    vc.insert("issuanceDate".to_string(), json!(FIXED_DATE));
    vc.insert("credentialSchema".to_string(), json!({"id": outer_url, "type": "JsonSchema", "digestSRI": outer_digest}));
    vc.insert("credentialSubject".to_string(), Value::Object(subject));
    sign(&mut vc, &context, &format!("{vc_issuer_did}#key-1"), vc_signer).await;

    let mut vp = Map::new();
    vp.insert("@context".to_string(), context.clone());
    vp.insert("id".to_string(), json!(format!("urn:uuid:vp-{kind}-{vp_did}")));
    vp.insert("type".to_string(), json!(["VerifiablePresentation"]));
    vp.insert("holder".to_string(), json!(vp_did));
    vp.insert("verifiableCredential".to_string(), json!([Value::Object(vc)]));
    sign(&mut vp, &context, &format!("{vp_did}#key-1"), vp_signer).await;

    Value::Object(vp)
}

async fn mount_text(server: &MockServer, url: &str, body: &str) {
    let parsed = Url::parse(url).expect("fixture URL is valid");
    Mock::given(method("GET"))
        .and(path(parsed.path().to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

/// Signs `document` (a JSON-LD object with no `proof` member yet) in place
/// with an `Ed25519Signature2020` proof, reimplementing the library's own
/// URDNA2015-canonicalize-then-hash-then-sign pipeline over its public
/// dependencies.
async fn sign(document: &mut Map<String, Value>, context: &Value, verification_method: &str, signer: &FixtureSigner) {
    let mut proof_claims = Map::new();
    proof_claims.insert("type".to_string(), json!("Ed25519Signature2020"));
    proof_claims.insert("verificationMethod".to_string(), json!(verification_method));
    proof_claims.insert("created".to_string(), json!(FIXED_DATE));
    proof_claims.insert("proofPurpose".to_string(), json!("assertionMethod"));

    let mut proof_options = proof_claims.clone();
    proof_options.insert("@context".to_string(), context.clone());

    let document_value = Value::Object(document.clone());
    let base = synthetic_base_iri(&document_value);

    let proof_options_nquads = canonicalize(&Value::Object(proof_options), &base).await;
    let document_nquads = canonicalize(&document_value, &base).await;

    let proof_hash = sha2::Sha256::digest(proof_options_nquads.as_bytes());
    let doc_hash = sha2::Sha256::digest(document_nquads.as_bytes());
    let mut verify_data = proof_hash.to_vec();
    verify_data.extend_from_slice(&doc_hash);

    let signature = signer.signing_key.sign(&verify_data);
    let proof_value = format!("z{}", bs58::encode(signature.to_bytes()).into_string());
    proof_claims.insert("proofValue".to_string(), json!(proof_value));

    document.insert("proof".to_string(), Value::Object(proof_claims));
}

fn synthetic_base_iri(document: &Value) -> IriBuf {
    let candidate = document.get("id").and_then(Value::as_str).unwrap_or("urn:uuid:00000000-0000-0000-0000-000000000000");
    IriBuf::new(candidate.to_string()).unwrap_or_else(|_| IriBuf::new("urn:uuid:00000000-0000-0000-0000-000000000000".to_string()).unwrap())
}

async fn canonicalize(document: &Value, base: &IriBuf) -> String {
    let loader = with_default_resolver();
    let json_doc = json_syntax::Value::from(document.clone());
    let remote = RemoteDocument::new(Some(base.clone()), None, json_doc);
    let expanded = RemoteDocumentReference::Loaded(remote).expand(&loader).await.expect("fixture document expands cleanly");

    let mut generator = generator::Blank::new_with_prefix("b".to_string());
    let dataset: Dataset = expanded
        .rdf_quads(&mut generator, Some(RdfDirection::I18nDatatype))
        .map(|quad| quad_to_oxrdf(quad).expect("fixture document has no generalized-RDF constructs"))
        .collect();

    rdf_canon::canonicalize(&dataset).expect("fixture document canonicalizes cleanly")
}

type JsonLdQuadRef<'a> = json_ld::rdf::QuadRef<'a, IriBuf, rdf_types::BlankIdBuf, rdf_types::Literal>;

fn quad_to_oxrdf(quad: JsonLdQuadRef<'_>) -> Result<Quad> {
    let rdf_types::Quad(subject, predicate, object, graph) = quad;

    let subject = valid_id_to_subject(&subject)?;
    let predicate = match &*predicate {
        rdf_types::Id::Iri(iri) => named_node(iri),
        rdf_types::Id::Blank(_) => {
            return Err(TrustError::VerificationFailed("generalized RDF (blank-node predicate) is not supported".into()));
        }
    };
    let object = value_to_term(&object)?;
    let graph_name = match graph {
        Some(g) => valid_id_to_graph_name(g),
        None => GraphName::DefaultGraph,
    };

    Ok(Quad::new(subject, predicate, object, graph_name))
}

fn named_node(iri: &IriBuf) -> NamedNode {
    NamedNode::new_unchecked(iri.as_str())
}

fn blank_node(id: &rdf_types::BlankIdBuf) -> BlankNode {
    BlankNode::new_unchecked(id.suffix())
}

fn valid_id_to_subject(id: &rdf_types::Id<IriBuf, rdf_types::BlankIdBuf>) -> Result<Subject> {
    Ok(match id {
        rdf_types::Id::Iri(iri) => Subject::NamedNode(named_node(iri)),
        rdf_types::Id::Blank(b) => Subject::BlankNode(blank_node(b)),
    })
}

fn valid_id_to_graph_name(id: &rdf_types::Id<IriBuf, rdf_types::BlankIdBuf>) -> GraphName {
    match id {
        rdf_types::Id::Iri(iri) => GraphName::NamedNode(named_node(iri)),
        rdf_types::Id::Blank(b) => GraphName::BlankNode(blank_node(b)),
    }
}

fn value_to_term(value: &rdf_types::Object<rdf_types::Id<IriBuf, rdf_types::BlankIdBuf>, rdf_types::Literal>) -> Result<Term> {
    Ok(match value {
        rdf_types::Term::Id(rdf_types::Id::Iri(iri)) => Term::NamedNode(named_node(iri)),
        rdf_types::Term::Id(rdf_types::Id::Blank(b)) => Term::BlankNode(blank_node(b)),
        rdf_types::Term::Literal(lit) => Term::Literal(literal(lit)),
    })
}

fn literal(lit: &rdf_types::Literal) -> Literal {
    match &lit.type_ {
        rdf_types::LiteralType::Any(datatype) => Literal::new_typed_literal(lit.value.clone(), NamedNode::new_unchecked(datatype.as_str())),
        rdf_types::LiteralType::LangString(tag) => Literal::new_language_tagged_literal_unchecked(lit.value.clone(), tag.as_str().to_ascii_lowercase()),
    }
}

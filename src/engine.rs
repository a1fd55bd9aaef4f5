//! # Trust Resolution Engine (C10)
//!
//! Orchestrates DID → services → VPs → credentials → outcome: fetches a DID
//! document via C4, fans out over its matching `LinkedVerifiablePresentation`
//! services, verifies each VP's proof via C5, processes its first credential
//! via C9, and folds the results into a `service` + `serviceProvider` pair —
//! recursing (bounded to one level) when the service credential's issuer is
//! an external DID.

use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;

use crate::credential::{self, ICredential, Inherited};
use crate::error::{Result, TrustError};
use crate::loader::TrustDocumentLoader;
use crate::model::{DidDocument, VerifiableCredential, VerifiablePresentation};
use crate::proof;
use crate::registry::{Outcome, VerifiablePublicRegistry};
use crate::resolver::{DefaultDidResolver, SharedDidResolver};
use crate::schema::SchemaType;

/// Options accepted by the public entry points.
#[derive(Clone)]
pub struct ResolverConfig {
    /// Verifiable Public Registries trusted for schema resolution (C7).
    pub verifiable_public_registries: Vec<VerifiablePublicRegistry>,
    /// DID resolver; defaults to [`DefaultDidResolver`] if unset.
    pub did_resolver: Option<SharedDidResolver>,
    /// If `true`, a fetched VP/VC's signature is assumed valid and C5 is
    /// skipped.
    pub cached: bool,
    /// If `true`, SRI digest checks on fetched schema bytes are skipped.
    pub skip_digest_sri_check: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { verifiable_public_registries: Vec::new(), did_resolver: None, cached: false, skip_digest_sri_check: false }
    }
}

impl ResolverConfig {
    fn resolver(&self) -> SharedDidResolver {
        self.did_resolver.clone().unwrap_or_else(|| Arc::new(DefaultDidResolver::new()))
    }
}

/// Error metadata carried by a failed [`TrustResolution`].
#[derive(Clone, Debug)]
pub struct Metadata {
    /// The stable snake_case error code (see [`TrustError::code`]).
    pub error_code: String,
    /// The human-readable error message.
    pub error_message: String,
}

/// The result of [`resolve_did`].
#[derive(Clone, Debug)]
pub struct TrustResolution {
    /// The resolved DID document, if resolution reached that point.
    pub did_document: Option<DidDocument>,
    /// Whether the full resolution succeeded.
    pub verified: bool,
    /// The final trust verdict.
    pub outcome: Outcome,
    /// The classified `Service` credential, if found.
    pub service: Option<ICredential>,
    /// The classified `Org`/`Person` credential, if found.
    pub service_provider: Option<ICredential>,
    /// Failure details, present iff `verified == false`.
    pub metadata: Option<Metadata>,
}

impl TrustResolution {
    fn failed(err: &TrustError) -> Self {
        Self {
            did_document: None,
            verified: false,
            outcome: Outcome::Invalid,
            service: None,
            service_provider: None,
            metadata: Some(Metadata { error_code: err.code().to_string(), error_message: err.message() }),
        }
    }
}

/// The result of [`resolve_credential`].
#[derive(Clone, Debug)]
pub struct CredentialResolution {
    /// Whether C9 processing succeeded.
    pub verified: bool,
    /// The final trust verdict.
    pub outcome: Outcome,
    /// The credential's issuer DID, if resolution reached that point.
    pub issuer: Option<String>,
    /// Failure details, present iff `verified == false`.
    pub metadata: Option<Metadata>,
}

const SERVICE_FRAGMENT_PREFIXES: &[&str] = &["vpr-schemas", "vpr-ecs"];
const SERVICE_FRAGMENT_SUFFIX: &str = "-c-vp";

/// Matches the compiled fragment patterns `^vpr-schemas.*-c-vp$` /
/// `^vpr-ecs.*-c-vp$`, implemented directly over prefix/suffix checks since
/// both patterns reduce to "starts with one of two literals, ends with a
/// fixed literal" with no other metacharacters.
fn fragment_matches_service_pattern(fragment: &str) -> bool {
    fragment.ends_with(SERVICE_FRAGMENT_SUFFIX)
        && SERVICE_FRAGMENT_PREFIXES.iter().any(|prefix| fragment.starts_with(prefix))
}

/// The outcome of fanning a single DID's matching services out through C5/C9
/// (one level of C10, with no knowledge of whether it is the top-level call
/// or a bounded recursion for an external issuer).
struct Resolved {
    did_document: DidDocument,
    service: Option<ICredential>,
    service_provider: Option<ICredential>,
    outcome: Outcome,
}

/// Primary entry point: resolves `did`'s trust according to `config` (C10).
pub async fn resolve_did(did: &str, config: &ResolverConfig) -> TrustResolution {
    match resolve_component(did, config, true).await {
        Ok(resolved) => match (resolved.service, resolved.service_provider) {
            (Some(service), Some(service_provider)) => TrustResolution {
                did_document: Some(resolved.did_document),
                verified: true,
                outcome: resolved.outcome,
                service: Some(service),
                service_provider: Some(service_provider),
                metadata: None,
            },
            _ => TrustResolution::failed(&TrustError::NotFound(format!("no matching service/serviceProvider credential found for {did:?}"))),
        },
        Err(err) => TrustResolution::failed(&err),
    }
}

/// Resolves a single DID's own `service`/`serviceProvider` candidates,
/// without following any external-issuer recursion. `resolve_component`
/// calls this at most twice (once for the requested DID, once more for an
/// external issuer), so the recursion never needs to be expressed as a
/// self-referential async fn.
async fn resolve_component_base(did: &str, config: &ResolverConfig) -> Result<Resolved> {
    if did.is_empty() {
        return Err(TrustError::Invalid("did must not be empty".to_string()));
    }

    let did_resolver = config.resolver();
    let did_document = did_resolver.resolve(did).await?;
    let client = Client::new();
    let loader = TrustDocumentLoader::new(did_resolver.clone());

    let matching_services: Vec<_> = did_document
        .services_of_type("LinkedVerifiablePresentation")
        .filter(|s| fragment_matches_service_pattern(s.fragment()))
        .collect();

    let results = futures::future::join_all(matching_services.into_iter().map(|service| {
        let client = &client;
        let did_resolver = &did_resolver;
        let loader = &loader;
        async move { process_service(service, config, client, did_resolver, loader).await }
    }))
    .await;

    let mut credentials = Vec::new();
    for result in results {
        credentials.push(result?);
    }

    let service = credentials.iter().find(|c| c.schema_type == SchemaType::Service).cloned();
    let service_provider =
        credentials.iter().find(|c| matches!(c.schema_type, SchemaType::Org | SchemaType::Person)).cloned();
    let outcome = service
        .as_ref()
        .map(|s| s.outcome)
        .or_else(|| service_provider.as_ref().map(|p| p.outcome))
        .unwrap_or(Outcome::Invalid);

    Ok(Resolved { did_document, service, service_provider, outcome })
}

/// Resolves `did`'s service/serviceProvider, following at most one hop of
/// recursion into an external issuer when `did`'s own `service` credential
/// was issued by a different DID. `service` prefers the nested resolution,
/// falling back to the local `service` credential if the external issuer's
/// resolution didn't produce one; `serviceProvider` falls back to the first
/// locally-issued ORG/PERSON credential, not to the external resolution.
/// `did_document` always reflects the originally-requested `did`, never the
/// nested one.
async fn resolve_component(did: &str, config: &ResolverConfig, allow_recursion: bool) -> Result<Resolved> {
    let local = resolve_component_base(did, config).await?;

    match &local.service {
        Some(svc) if allow_recursion && svc.issuer != did => {
            let nested = resolve_component_base(&svc.issuer, config).await?;
            Ok(Resolved {
                did_document: local.did_document,
                service: nested.service.or(local.service),
                service_provider: nested.service_provider.or(local.service_provider),
                outcome: nested.outcome,
            })
        }
        _ => Ok(local),
    }
}

async fn process_service(
    service: &crate::model::Service, config: &ResolverConfig, client: &Client, did_resolver: &SharedDidResolver,
    loader: &TrustDocumentLoader,
) -> Result<ICredential> {
    let endpoint = service
        .first_endpoint()
        .ok_or_else(|| TrustError::Invalid(format!("service {:?} has no serviceEndpoint", service.id)))?;

    let response = client.get(endpoint).send().await.map_err(|e| TrustError::NotFound(format!("fetching VP at {endpoint}: {e}")))?;
    if !response.status().is_success() {
        return Err(TrustError::NotFound(format!("VP at {endpoint} returned {}", response.status())));
    }
    let body: Value = response.json().await.map_err(|e| TrustError::NotFound(format!("parsing VP at {endpoint}: {e}")))?;

    if !config.cached {
        proof::verify_document(&body, did_resolver, loader).await?;
    }

    let vp: VerifiablePresentation =
        serde_json::from_value(body).map_err(|e| TrustError::Invalid(format!("VP at {endpoint} is not a valid VerifiablePresentation: {e}")))?;
    let first = vp
        .verifiable_credential
        .first()
        .ok_or_else(|| TrustError::NotFound(format!("VP at {endpoint} carries no verifiableCredential")))?;
    let vc: VerifiableCredential = match first {
        crate::core::Kind::Object(vc) => vc.clone(),
        crate::core::Kind::String(_) => {
            return Err(TrustError::NotSupported("a bare-string verifiableCredential reference is not supported".to_string()));
        }
    };

    credential::process(client, &vc, &config.verifiable_public_registries, config.skip_digest_sri_check, &Inherited::default()).await
}

/// Runs C9 directly on `vc` and returns its resolution (the public
/// `resolveCredential` entry point).
pub async fn resolve_credential(vc: &VerifiableCredential, config: &ResolverConfig) -> CredentialResolution {
    let client = Client::new();
    match credential::process(&client, vc, &config.verifiable_public_registries, config.skip_digest_sri_check, &Inherited::default()).await
    {
        Ok(credential) => CredentialResolution {
            verified: true,
            outcome: credential.outcome,
            issuer: Some(credential.issuer),
            metadata: None,
        },
        Err(err) => CredentialResolution {
            verified: false,
            outcome: Outcome::Invalid,
            issuer: None,
            metadata: Some(Metadata { error_code: err.code().to_string(), error_message: err.message() }),
        },
    }
}

/// Parameters for [`verify_permissions`].
pub struct VerifyPermissionsRequest<'a> {
    /// The entity whose permission is being checked.
    pub did: &'a str,
    /// The `JsonSchemaCredential` whose `$ref` identifies the schema.
    pub json_schema_credential_id: &'a str,
    /// The instant to check against the permission's effective window.
    pub issuance_date: chrono::DateTime<chrono::Utc>,
    /// The configured registries used to resolve the schema `$ref`.
    pub verifiable_public_registries: &'a [VerifiablePublicRegistry],
    /// The kind of authority to check for.
    pub permission_type: crate::permission::PermissionType,
}

/// Fetches the referenced `JsonSchemaCredential`, derives its schema `$ref`
/// and registry (C7), and checks the requested permission (C8).
pub async fn verify_permissions(request: &VerifyPermissionsRequest<'_>) -> Result<bool> {
    let client = Client::new();
    let response = client
        .get(request.json_schema_credential_id)
        .send()
        .await
        .map_err(|e| TrustError::NotFound(format!("fetching {}: {e}", request.json_schema_credential_id)))?;
    if !response.status().is_success() {
        return Err(TrustError::NotFound(format!(
            "{} returned {}",
            request.json_schema_credential_id,
            response.status()
        )));
    }
    let vc: VerifiableCredential = response
        .json()
        .await
        .map_err(|e| TrustError::Invalid(format!("{} is not a valid VerifiableCredential: {e}", request.json_schema_credential_id)))?;

    let subject = vc.credential_subject.first().ok_or_else(|| TrustError::NotFound("credentialSubject is absent".to_string()))?;
    let json_schema_ref = subject
        .get("jsonSchema")
        .and_then(|v| v.get("$ref"))
        .and_then(Value::as_str)
        .ok_or_else(|| TrustError::NotSupported("credentialSubject.jsonSchema.$ref is absent or not a plain $ref".to_string()))?;

    let resolution = crate::registry::resolve(json_schema_ref, request.verifiable_public_registries)?;
    let trust_registry = resolution
        .trust_registry
        .ok_or_else(|| TrustError::InvalidPermissions("no registry matched the schema $ref".to_string()))?;
    let schema_id = resolution.schema_id.unwrap_or_default();

    crate::permission::verify(&client, &trust_registry, &schema_id, request.issuance_date, request.did, request.permission_type).await?;
    Ok(true)
}

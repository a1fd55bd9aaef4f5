//! # Credential Processor (C9)
//!
//! Validates a Verifiable Credential's `credentialSchema`/`credentialSubject`
//! pair, dispatches on the schema's type (`JsonSchemaCredential` recurses one
//! hop further, `JsonSchema` is terminal), enforces SRI digests on fetched
//! schema bytes, validates against both schemas, checks issuer permission via
//! C8, and classifies the subject via C6 into an [`ICredential`].

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde_json::Value;

use crate::core::OneMany;
use crate::error::{Result, TrustError};
use crate::model::VerifiableCredential;
use crate::permission::{self, PermissionType};
use crate::registry::{self, Outcome, VerifiablePublicRegistry};
use crate::schema::{self, SchemaType};
use crate::sri;

/// A classified credential, tagged by its ECS schema match (C6) and carrying
/// the trust verdict reached while processing it.
#[derive(Clone, Debug)]
pub struct ICredential {
    /// The ECS classification of `subject`.
    pub schema_type: SchemaType,
    /// The credential's subject id.
    pub id: String,
    /// The credential's issuer DID.
    pub issuer: String,
    /// ISO-8601 issuance timestamp.
    pub issuance_date: String,
    /// The raw, unclassified subject claims.
    pub subject: Value,
    /// The registry-resolution outcome reached while authorizing the
    /// issuer.
    pub outcome: Outcome,
}

/// Parameters threaded through a recursive C9 call. The initial call for a
/// top-level VC carries no inherited attributes; a `JsonSchemaCredential`
/// recursion forwards the parent's issuer/issuanceDate/subject so the
/// terminal `JsonSchema` branch can authorize against them.
#[derive(Clone, Debug, Default)]
pub struct Inherited {
    /// The parent call's issuer DID, if this is a recursive call.
    pub issuer: Option<String>,
    /// The parent call's issuance date, if this is a recursive call.
    pub issuance_date: Option<String>,
    /// The parent call's `credentialSubject`, carried as `attrs` into the
    /// terminal branch's permission check and classification.
    pub attrs: Option<Value>,
}

/// Processes `vc` per C9, recursing through `JsonSchemaCredential` hops
/// until it reaches a terminal `JsonSchema` and can classify the subject.
///
/// # Errors
/// [`TrustError::NotFound`] if `credentialSchema`/`credentialSubject` are
/// absent; [`TrustError::Invalid`] for an unrecognized schema type or an
/// unsupported `jsonSchema` reference form; [`TrustError::SchemaMismatch`]
/// on a failed validation; [`TrustError::InvalidPermissions`] if the issuer
/// lacks authority.
pub async fn process(
    client: &Client, vc: &VerifiableCredential, registries: &[VerifiablePublicRegistry],
    skip_digest_sri_check: bool, inherited: &Inherited,
) -> Result<ICredential> {
    let schema =
        vc.credential_schema.as_ref().and_then(OneMany::first).ok_or_else(|| TrustError::NotFound("credentialSchema is absent".to_string()))?;
    let subject =
        vc.credential_subject.first().ok_or_else(|| TrustError::NotFound("credentialSubject is absent".to_string()))?;

    match schema.type_.as_str() {
        "JsonSchemaCredential" => {
            let next_vc = fetch_credential(client, &schema.id).await?;
            let next_inherited = Inherited {
                issuer: Some(vc.issuer_id().to_string()),
                issuance_date: Some(vc.issuance_date.clone()),
                attrs: Some(subject.clone()),
            };
            Box::pin(process(client, &next_vc, registries, skip_digest_sri_check, &next_inherited)).await
        }
        "JsonSchema" => process_terminal(client, vc, subject, registries, skip_digest_sri_check, inherited).await,
        other => Err(TrustError::Invalid(format!("unrecognized credentialSchema.type {other:?}"))),
    }
}

async fn process_terminal(
    client: &Client, vc: &VerifiableCredential, subject: &Value, registries: &[VerifiablePublicRegistry],
    skip_digest_sri_check: bool, inherited: &Inherited,
) -> Result<ICredential> {
    let schema =
        vc.credential_schema.as_ref().and_then(OneMany::first).expect("caller already confirmed credentialSchema is present");

    let json_schema_ref = subject
        .get("jsonSchema")
        .and_then(|v| v.get("$ref"))
        .and_then(Value::as_str)
        .ok_or_else(|| TrustError::NotSupported("credentialSubject.jsonSchema.$ref is absent or not a plain $ref".to_string()))?;

    let resolution = registry::resolve(json_schema_ref, registries)?;
    let Some(schema_url) = &resolution.schema_url else {
        return Err(TrustError::InvalidPermissions("no registry matched the schema $ref; issuer cannot be authorized".to_string()));
    };

    let (outer_text, inner_text) = futures::try_join!(fetch_text(client, &schema.id), fetch_text(client, schema_url))?;

    if !skip_digest_sri_check {
        if let Some(digest) = &schema.digest_sri {
            sri::verify(digest, outer_text.as_bytes())?;
        }
        if let Some(digest) = subject.get("digestSRI").and_then(Value::as_str) {
            sri::verify(digest, inner_text.as_bytes())?;
        }
    }

    let outer_schema: Value = serde_json::from_str(&outer_text)
        .map_err(|e| TrustError::SchemaMismatch(format!("outer schema at {:?} is not valid JSON: {e}", schema.id)))?;
    let inner_schema: Value = serde_json::from_str(&inner_text)
        .map_err(|e| TrustError::SchemaMismatch(format!("inner schema at {schema_url:?} is not valid JSON: {e}")))?;

    let vc_document = serde_json::to_value(vc).map_err(|e| TrustError::Invalid(format!("credential is not representable as JSON: {e}")))?;
    schema::validate_against(&outer_schema, &vc_document)?;

    let attrs = inherited.attrs.clone().unwrap_or_else(|| subject.clone());
    schema::validate_against(&inner_schema, &attrs)?;

    let issuer = inherited.issuer.clone().unwrap_or_else(|| vc.issuer_id().to_string());
    let issuance_date_str = inherited.issuance_date.clone().unwrap_or_else(|| vc.issuance_date.clone());
    let issuance_date: DateTime<Utc> = issuance_date_str
        .parse()
        .map_err(|e| TrustError::InvalidPermissions(format!("issuanceDate {issuance_date_str:?} is not ISO-8601: {e}")))?;

    let trust_registry = resolution.trust_registry.as_deref().expect("schema_url is only set alongside trust_registry");
    let schema_id = resolution.schema_id.as_deref().unwrap_or_default();

    permission::verify(client, trust_registry, schema_id, issuance_date, &issuer, PermissionType::Issuer).await?;

    let schema_type = schema::classify(&attrs);
    let id = attrs.get("id").and_then(Value::as_str).unwrap_or(&issuer).to_string();

    Ok(ICredential { schema_type, id, issuer, issuance_date: issuance_date_str, subject: attrs, outcome: resolution.outcome })
}

async fn fetch_text(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).send().await.map_err(|e| TrustError::NotFound(format!("fetching {url}: {e}")))?;
    if !response.status().is_success() {
        return Err(TrustError::NotFound(format!("{url} returned {}", response.status())));
    }
    response.text().await.map_err(|e| TrustError::NotFound(format!("reading body of {url}: {e}")))
}

async fn fetch_credential(client: &Client, url: &str) -> Result<VerifiableCredential> {
    let text = fetch_text(client, url).await?;
    serde_json::from_str(&text).map_err(|e| TrustError::Invalid(format!("credential at {url} is not a valid VerifiableCredential: {e}")))
}

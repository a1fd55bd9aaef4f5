//! # Schema Catalog & Classifier
//!
//! The compiled-in table of Entity Credential Schemas (ECS) and the
//! classifier (C6) that matches an arbitrary `credentialSubject` object
//! against them. Classification is the *only* way the rest of the crate
//! learns what shape a subject has — no code outside this module inspects
//! subject fields directly (§9 "Tagged variants").

use std::sync::OnceLock;

use jsonschema::{Draft, Validator};
use serde_json::Value;

/// The four Entity Credential Schemas, in the fixed classification order
/// required by C6.
const ECS_ORG_SCHEMA: &str = include_str!("schemas/ecs_org.json");
const ECS_PERSON_SCHEMA: &str = include_str!("schemas/ecs_person.json");
const ECS_SERVICE_SCHEMA: &str = include_str!("schemas/ecs_service.json");
const ECS_USER_AGENT_SCHEMA: &str = include_str!("schemas/ecs_user_agent.json");

/// A classified credential subject, tagged by its ECS match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaType {
    /// `ecs-org`: a legal entity / organization.
    Org,
    /// `ecs-person`/`ecs-persona`: a natural person or pseudonymous persona.
    Person,
    /// `ecs-service`: an automated or human-operated service.
    Service,
    /// `ecs-user-agent`: a client application acting on a person's behalf.
    UserAgent,
    /// Matched none of the compiled ECS schemas.
    Unknown,
}

impl SchemaType {
    /// The stable name used in outward-facing metadata.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Org => "Org",
            Self::Person => "Person",
            Self::Service => "Service",
            Self::UserAgent => "UserAgent",
            Self::Unknown => "Unknown",
        }
    }
}

struct Catalog {
    org: Validator,
    person: Validator,
    service: Validator,
    user_agent: Validator,
}

fn compile(schema_text: &str) -> Validator {
    let schema: Value = serde_json::from_str(schema_text).expect("compiled-in ECS schema is valid JSON");
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .should_validate_formats(true)
        .build(&schema)
        .expect("compiled-in ECS schema is a valid JSON Schema 2020-12 document")
}

fn catalog() -> &'static Catalog {
    static CATALOG: OnceLock<Catalog> = OnceLock::new();
    CATALOG.get_or_init(|| Catalog {
        org: compile(ECS_ORG_SCHEMA),
        person: compile(ECS_PERSON_SCHEMA),
        service: compile(ECS_SERVICE_SCHEMA),
        user_agent: compile(ECS_USER_AGENT_SCHEMA),
    })
}

/// Classifies `subject` against the compiled ECS catalog in the fixed
/// iteration order `org, person, service, user-agent`; returns
/// [`SchemaType::Unknown`] if none validate.
///
/// Total and deterministic: independent of any prior call (§8).
#[must_use]
pub fn classify(subject: &Value) -> SchemaType {
    let catalog = catalog();
    if catalog.org.is_valid(subject) {
        SchemaType::Org
    } else if catalog.person.is_valid(subject) {
        SchemaType::Person
    } else if catalog.service.is_valid(subject) {
        SchemaType::Service
    } else if catalog.user_agent.is_valid(subject) {
        SchemaType::UserAgent
    } else {
        SchemaType::Unknown
    }
}

/// Validates an arbitrary JSON document against an externally supplied
/// JSON Schema (2020-12, with formats, non-strict) — used by C9 to
/// validate a fetched credential/subject schema against its claimed shape,
/// as opposed to the fixed ECS catalog above.
///
/// # Errors
/// [`crate::error::TrustError::SchemaMismatch`] if `document` does not
/// validate, or if `schema` is not itself a valid JSON Schema.
pub fn validate_against(schema: &Value, document: &Value) -> crate::error::Result<()> {
    let compiled = jsonschema::options().with_draft(Draft::Draft202012).should_validate_formats(true).build(schema).map_err(|e| {
        crate::error::TrustError::SchemaMismatch(format!("invalid JSON Schema document: {e}"))
    })?;
    let errors: Vec<String> = compiled.iter_errors(document).map(|e| e.to_string()).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(crate::error::TrustError::SchemaMismatch(errors.join("; ")))
    }
}

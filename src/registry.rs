//! # Registry Resolver
//!
//! Matches a schema `$ref` URL against the configured list of
//! [`VerifiablePublicRegistry`] entries (C7), rewriting it to the
//! registry's physical base and deriving the trust-registry/indexer origin
//! and schema id used by the permission verifier (C8).

use url::Url;

use crate::error::{Result, TrustError};

/// Final trust verdict for a resolution, shared by the engine and the
/// registry/permission resolvers that contribute to it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The matched registry is a production registry.
    Verified,
    /// The matched registry is explicitly non-production.
    VerifiedTest,
    /// No configured registry matched the `$ref`.
    NotTrusted,
    /// Resolution failed outright (validation, I/O, or proof failure).
    Invalid,
}

impl Outcome {
    /// The stable outward-facing name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Verified => "VERIFIED",
            Self::VerifiedTest => "VERIFIED_TEST",
            Self::NotTrusted => "NOT_TRUSTED",
            Self::Invalid => "INVALID",
        }
    }
}

/// A configured Verifiable Public Registry.
#[derive(Clone, Debug)]
pub struct VerifiablePublicRegistry {
    /// Logical namespace; a URI prefix matched against `$ref`.
    pub id: String,
    /// Physical origins; `baseUrls[0]` is used to rewrite `$ref`.
    pub base_urls: Vec<String>,
    /// Whether this registry is production (`true`) or a test registry.
    pub production: bool,
}

/// The result of resolving a schema `$ref` against the configured
/// registries.
#[derive(Clone, Debug)]
pub struct RegistryResolution {
    /// The resolved trust verdict.
    pub outcome: Outcome,
    /// `<origin>/<first-path-segment>` of the rewritten schema URL.
    pub trust_registry: Option<String>,
    /// The last path segment of the rewritten schema URL.
    pub schema_id: Option<String>,
    /// The rewritten schema URL (`$ref` with its registry-id prefix
    /// replaced by `baseUrls[0]`), if a registry matched.
    pub schema_url: Option<String>,
}

/// Resolves `schema_ref` against `registries` (C7).
///
/// # Errors
/// [`TrustError::Invalid`] if a registry matches but the rewritten URL
/// cannot be parsed.
pub fn resolve(schema_ref: &str, registries: &[VerifiablePublicRegistry]) -> Result<RegistryResolution> {
    let Some(registry) = registries.iter().find(|r| schema_ref.starts_with(r.id.as_str())) else {
        return Ok(RegistryResolution { outcome: Outcome::NotTrusted, trust_registry: None, schema_id: None, schema_url: None });
    };

    let Some(base_url) = registry.base_urls.first() else {
        return Err(TrustError::Invalid(format!("registry {:?} has no configured base URL", registry.id)));
    };

    let schema_url = format!("{base_url}{}", &schema_ref[registry.id.len()..]);
    let parsed = Url::parse(&schema_url)
        .map_err(|e| TrustError::Invalid(format!("rewritten schema URL {schema_url:?} is invalid: {e}")))?;

    let origin = parsed.origin().ascii_serialization();
    let first_segment = parsed
        .path_segments()
        .and_then(|mut segs| segs.next())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TrustError::Invalid(format!("schema URL {schema_url:?} has no path segments")))?;
    let last_segment = parsed
        .path_segments()
        .and_then(Iterator::last)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| TrustError::Invalid(format!("schema URL {schema_url:?} has no path segments")))?;

    let outcome = if registry.production { Outcome::Verified } else { Outcome::VerifiedTest };

    Ok(RegistryResolution {
        outcome,
        trust_registry: Some(format!("{origin}/{first_segment}")),
        schema_id: Some(last_segment.to_string()),
        schema_url: Some(schema_url),
    })
}

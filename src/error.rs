//! # Trust Resolution Errors
//!
//! Error taxonomy for the trust resolution engine, matching the classified
//! kinds the protocol raises at each stage of resolution. Every variant
//! carries the snake_case `code` surfaced in a [`crate::engine::TrustResolution`]'s
//! `metadata.errorCode`, alongside a free-text message.

use thiserror::Error;

/// Errors raised while resolving trust for a DID or Verifiable Credential.
#[derive(Error, Debug)]
pub enum TrustError {
    /// The input (DID, VC, or proof) is structurally invalid.
    #[error("invalid: {0}")]
    Invalid(String),

    /// A required resource (DID document, schema, credential) could not be
    /// located.
    #[error("not_found: {0}")]
    NotFound(String),

    /// The encountered construct is recognized but not supported by this
    /// implementation (e.g. a `credentialSubject.jsonSchema` reference that
    /// is not a plain `$ref`).
    #[error("not_supported: {0}")]
    NotSupported(String),

    /// The credential's issuer does not match the expected authority.
    #[error("invalid_issuer: {0}")]
    InvalidIssuer(String),

    /// The caller-supplied request parameters are malformed.
    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    /// A fetched document failed JSON Schema validation.
    #[error("schema_mismatch: {0}")]
    SchemaMismatch(String),

    /// A cryptographic or content-integrity check failed.
    #[error("verification_failed: {0}")]
    VerificationFailed(String),

    /// The issuer does not hold a valid permission for the schema at the
    /// credential's issuance time.
    #[error("invalid_permissions: {0}")]
    InvalidPermissions(String),

    /// An error from a collaborator (HTTP client, JSON-LD processor, DID
    /// resolver) that does not map to one of the above; preserved verbatim
    /// and surfaced as [`TrustError::Invalid`] at the public boundary.
    #[error("unexpected error: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl TrustError {
    /// The stable snake_case error code for this kind, as used in
    /// `TrustResolution::metadata.errorCode`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Invalid(_) | Self::Unexpected(_) => "invalid",
            Self::NotFound(_) => "not_found",
            Self::NotSupported(_) => "not_supported",
            Self::InvalidIssuer(_) => "invalid_issuer",
            Self::InvalidRequest(_) => "invalid_request",
            Self::SchemaMismatch(_) => "schema_mismatch",
            Self::VerificationFailed(_) => "verification_failed",
            Self::InvalidPermissions(_) => "invalid_permissions",
        }
    }

    /// The human-readable message, independent of the `Display` impl's
    /// code prefix.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Invalid(m)
            | Self::NotFound(m)
            | Self::NotSupported(m)
            | Self::InvalidIssuer(m)
            | Self::InvalidRequest(m)
            | Self::SchemaMismatch(m)
            | Self::VerificationFailed(m)
            | Self::InvalidPermissions(m) => m.clone(),
            Self::Unexpected(e) => e.to_string(),
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, TrustError>;

//! # Permission Verifier
//!
//! Queries the trust-registry's permission indexer and validates that the
//! returned permission covers the requested type and issuance-date window
//! (C8).

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::core::within_window;
use crate::error::{Result, TrustError};

/// The kind of authority being asserted over a schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionType {
    /// The credential's issuer is authorized to issue against the schema.
    Issuer,
    /// The credential's holder is authorized to hold the schema.
    Holder,
    /// The entity is authorized to grant permissions to others.
    Grantor,
}

impl PermissionType {
    /// The wire-format name used in the indexer query string and response.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Issuer => "ISSUER",
            Self::Holder => "HOLDER",
            Self::Grantor => "GRANTOR",
        }
    }
}

impl std::fmt::Display for PermissionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single permission record returned by the indexer.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Permission {
    /// The permission's type, expected to match the request's.
    #[serde(rename = "type")]
    pub type_: String,
    /// When the permission was created.
    pub created: DateTime<Utc>,
    /// Start of the permission's effective window, if narrower than
    /// `created`.
    pub effective_from: Option<DateTime<Utc>>,
    /// End of the permission's effective window, if it has expired or is
    /// scheduled to.
    pub effective_until: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct PermissionListResponse {
    permissions: Vec<Permission>,
}

/// Rewrites a trust-registry API origin to its read-optimized indexer
/// sibling: `https://api.` → `https://idx.`. Idempotent — rewriting an
/// already-rewritten URL is a no-op, since it no longer starts with
/// `https://api.` (§8 round-trip property).
#[must_use]
pub fn indexer_root(trust_registry: &str) -> String {
    trust_registry.strip_prefix("https://api.").map_or_else(
        || trust_registry.to_string(),
        |rest| format!("https://idx.{rest}"),
    )
}

/// Queries the permission indexer and validates the result (C8).
///
/// # Errors
/// [`TrustError::InvalidPermissions`] if the indexer returns no matching
/// permission, a permission of the wrong type, or one whose effective
/// window does not cover `issuance_date`. [`TrustError::Unexpected`] for
/// transport failures.
pub async fn verify(
    client: &Client, trust_registry: &str, schema_id: &str, issuance_date: DateTime<Utc>, did: &str,
    permission_type: PermissionType,
) -> Result<()> {
    let root = indexer_root(trust_registry);
    let url = format!(
        "{root}/perm/v1/list?did={}&type={}&response_max_size=1&schema_id={}",
        urlencoding::encode(did),
        permission_type,
        urlencoding::encode(schema_id)
    );

    let response = client.get(&url).send().await.map_err(|e| anyhow::anyhow!("permission indexer request to {url} failed: {e}"))?;
    if !response.status().is_success() {
        return Err(TrustError::InvalidPermissions(format!("indexer at {url} returned {}", response.status())));
    }
    let body: PermissionListResponse = response
        .json()
        .await
        .map_err(|e| anyhow::anyhow!("permission indexer response from {url} was not valid JSON: {e}"))?;

    let Some(permission) = body.permissions.first() else {
        return Err(TrustError::InvalidPermissions(format!("no {permission_type} permission for did={did} schema_id={schema_id}")));
    };

    if permission.type_ != permission_type.as_str() {
        return Err(TrustError::InvalidPermissions(format!(
            "expected permission type {permission_type}, got {}",
            permission.type_
        )));
    }

    let from = permission.effective_from.unwrap_or(permission.created);
    if !within_window(issuance_date, from, permission.effective_until) {
        return Err(TrustError::InvalidPermissions(format!(
            "issuance date {issuance_date} outside permission window [{from}, {:?}]",
            permission.effective_until
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexer_root_rewrites_api_prefix() {
        assert_eq!(indexer_root("https://api.registry.example"), "https://idx.registry.example");
    }

    #[test]
    fn indexer_root_is_idempotent() {
        let once = indexer_root("https://api.registry.example");
        let twice = indexer_root(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn indexer_root_leaves_non_api_hosts_untouched() {
        assert_eq!(indexer_root("https://registry.example"), "https://registry.example");
    }
}

//! # Document Loader
//!
//! Resolves JSON-LD context references during canonicalization and proof
//! verification (C3): default-context table lookups first, `did:` URLs via
//! the configured [`DidResolver`], and everything else over HTTPS.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use iref::{Iri, IriBuf};
use json_ld::{LoadError, Loader as JsonLdLoader, LoadingResult, RemoteDocument};
use reqwest::Client;

use crate::resolver::SharedDidResolver;

/// Raised by [`TrustDocumentLoader`] when a lookup fails; wrapped by
/// `json-ld` into a [`LoadError`] at the call site.
#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("did resolution failed: {0}")]
    Did(String),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("response was not valid JSON-LD: {0}")]
    Parse(#[from] json_syntax::parse::Error),
}

/// Document loader implementing the three-tier resolution order from C3:
/// compiled-in contexts, then `did:` URLs via C4, then plain HTTPS.
pub struct TrustDocumentLoader {
    default_contexts: HashMap<String, json_syntax::Value>,
    did_resolver: SharedDidResolver,
    client: Client,
}

impl TrustDocumentLoader {
    /// Builds a loader over the compiled-in [`default_context_table`] and
    /// the given DID resolver.
    #[must_use]
    pub fn new(did_resolver: SharedDidResolver) -> Self {
        Self { default_contexts: default_context_table(), did_resolver, client: Client::new() }
    }

    /// Looks up `url` in the compiled-in table, matching after stripping a
    /// `#fragment` if the bare URL is not itself a key.
    fn lookup_default(&self, url: &str) -> Option<&json_syntax::Value> {
        self.default_contexts.get(url).or_else(|| {
            let stripped = url.split_once('#').map_or(url, |(base, _)| base);
            self.default_contexts.get(stripped)
        })
    }

    async fn load_did(&self, url: &str) -> Result<json_syntax::Value, Error> {
        let did = url.split_once('#').map_or(url, |(base, _)| base);
        let doc = self.did_resolver.resolve(did).await.map_err(|e| Error::Did(e.to_string()))?;
        let mut value = serde_json::to_value(&doc).map_err(|e| Error::Did(e.to_string()))?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("id".to_string(), serde_json::Value::String(url.to_string()));
        }
        json_syntax::Value::from_str(&serde_json::to_string(&value).map_err(|e| Error::Did(e.to_string()))?)
            .map_err(Error::Parse)
    }

    async fn load_https(&self, url: &str) -> Result<json_syntax::Value, Error> {
        let text = self.client.get(url).header("accept", "application/ld+json, application/json").send().await?.text().await?;
        json_syntax::Value::from_str(&text).map_err(Error::Parse)
    }
}

impl JsonLdLoader for TrustDocumentLoader {
    async fn load(&self, url: &Iri) -> LoadingResult<IriBuf> {
        let url_str = url.as_str();

        if let Some(value) = self.lookup_default(url_str) {
            return Ok(RemoteDocument::new(Some(url.to_owned()), None, value.clone()));
        }

        let result = if url_str.starts_with("did:") {
            self.load_did(url_str).await
        } else {
            self.load_https(url_str).await
        };

        result
            .map(|document| RemoteDocument::new(Some(url.to_owned()), None, document))
            .map_err(|e| LoadError::new(url.to_owned(), e))
    }
}

/// The compiled-in default context table (C3 rule 1): contexts that must
/// resolve without network access so proof verification stays reproducible
/// offline, covering the W3C VC/DID and Ed25519 Data Integrity suites this
/// crate verifies.
fn default_context_table() -> HashMap<String, json_syntax::Value> {
    const ENTRIES: &[(&str, &str)] = &[
        ("https://www.w3.org/2018/credentials/v1", include_str!("contexts/credentials_v1.jsonld")),
        ("https://www.w3.org/ns/credentials/v2", include_str!("contexts/credentials_v2.jsonld")),
        ("https://www.w3.org/ns/did/v1", include_str!("contexts/did_v1.jsonld")),
        (
            "https://w3id.org/security/suites/ed25519-2018/v1",
            include_str!("contexts/ed25519_2018.jsonld"),
        ),
        (
            "https://w3id.org/security/suites/ed25519-2020/v1",
            include_str!("contexts/ed25519_2020.jsonld"),
        ),
        ("https://w3id.org/security/v1", include_str!("contexts/security_v1.jsonld")),
        ("https://w3id.org/security/v2", include_str!("contexts/security_v2.jsonld")),
    ];

    ENTRIES
        .iter()
        .map(|(url, text)| {
            let value = json_syntax::Value::from_str(text)
                .unwrap_or_else(|e| panic!("compiled-in context {url} is not valid JSON: {e}"));
            ((*url).to_string(), value)
        })
        .collect()
}

/// Convenience constructor wiring the [`Arc`]-shared default resolver; kept
/// separate from [`TrustDocumentLoader::new`] so callers with a custom
/// resolver are not forced through an extra `Arc::new`.
#[must_use]
pub fn with_default_resolver() -> TrustDocumentLoader {
    TrustDocumentLoader::new(Arc::new(crate::resolver::DefaultDidResolver::new()))
}

//! # Core Utilities
//!
//! Small shared types used throughout the crate's data model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Allows serde to serialize/deserialize a string or an object.
///
/// Several W3C Verifiable Credential fields (`issuer`, `credentialSchema`,
/// `credentialSubject`) are defined to accept either a bare string/URL or a
/// full object; `Kind` captures that without giving up strong typing for the
/// object case.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum Kind<T> {
    /// Simple string value.
    String(String),

    /// Complex object value.
    Object(T),
}

impl<T> Kind<T> {
    /// Returns the string form, if this is one.
    pub const fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            Self::Object(_) => None,
        }
    }

    /// Returns the object form, if this is one.
    pub const fn as_object(&self) -> Option<&T> {
        match self {
            Self::String(_) => None,
            Self::Object(o) => Some(o),
        }
    }
}

/// Allows serde to serialize/deserialize a single object or a set of objects.
///
/// `credentialSchema` and `credentialSubject` may each appear as a single
/// object or a singleton array; normalization to "the first element" happens
/// at the call site via [`OneMany::first`].
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum OneMany<T> {
    /// Single object.
    One(T),

    /// Set of objects.
    Many(Vec<T>),
}

impl<T> OneMany<T> {
    /// Returns the first element, whichever form this is.
    pub fn first(&self) -> Option<&T> {
        match self {
            Self::One(o) => Some(o),
            Self::Many(m) => m.first(),
        }
    }

    /// Number of elements represented.
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(m) => m.len(),
        }
    }

    /// Returns `true` if this represents zero elements (only possible for
    /// the `Many` form).
    pub fn is_empty(&self) -> bool {
        match self {
            Self::One(_) => false,
            Self::Many(m) => m.is_empty(),
        }
    }
}

/// Checks whether `instant` falls within `[from, until]` inclusive, where
/// `until` defaults to "now" when absent.
///
/// Used by the permission verifier (C8) to enforce the effective window of
/// an issuer permission: `issuanceDate ∈ [effective_from ?? created,
/// effective_until ?? now]`.
#[must_use]
pub fn within_window(
    instant: DateTime<Utc>, from: DateTime<Utc>, until: Option<DateTime<Utc>>,
) -> bool {
    let until = until.unwrap_or_else(Utc::now);
    instant >= from && instant <= until
}

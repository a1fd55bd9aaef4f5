//! # Hash & Multibase Primitives
//!
//! Digest algorithm selection, base58/base64 encodings, and the multibase
//! `z`-prefixed base58-btc encoding used throughout the DID/Data-Integrity
//! stack. This module has no knowledge of SRI or JSON-LD; it is the shared
//! leaf every higher module builds on.

use base64ct::{Base64, Base64UrlUnpadded, Encoding};
use sha2::Digest as _;

use crate::error::{Result, TrustError};

/// Supported digest algorithms, selected by case-insensitive label (as they
/// appear in an SRI digest or a `multihash`-adjacent string).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    /// SHA-1, used only where mandated by a legacy cryptosuite.
    Sha1,
    /// SHA-256.
    Sha256,
    /// SHA-384.
    Sha384,
}

impl Algorithm {
    /// Parses a case-insensitive algorithm label (`sha256`, `SHA-384`, ...).
    ///
    /// # Errors
    /// Returns [`TrustError::NotSupported`] for any label other than
    /// `sha1`/`sha256`/`sha384` (with or without a hyphen).
    pub fn parse(label: &str) -> Result<Self> {
        match label.to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            other => Err(TrustError::NotSupported(format!("unsupported digest algorithm: {other}"))),
        }
    }

    /// Digests `bytes` with this algorithm.
    #[must_use]
    pub fn digest(self, bytes: &[u8]) -> Vec<u8> {
        match self {
            Self::Sha1 => {
                use sha1::Digest as _;
                sha1::Sha1::digest(bytes).to_vec()
            }
            Self::Sha256 => sha2::Sha256::digest(bytes).to_vec(),
            Self::Sha384 => sha2::Sha384::digest(bytes).to_vec(),
        }
    }
}

/// Multicodec prefix for an Ed25519 public key (varint-encoded `0xed01`).
pub const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];

/// Decodes a multibase string, accepting only the `z` (base58-btc) base as
/// used by every Data Integrity cryptosuite this crate supports.
///
/// # Errors
/// [`TrustError::Invalid`] if the string is empty, does not start with `z`,
/// or is not valid base58-btc.
pub fn multibase_decode(value: &str) -> Result<Vec<u8>> {
    let rest = value
        .strip_prefix('z')
        .ok_or_else(|| TrustError::Invalid(format!("unsupported multibase prefix in {value:?}")))?;
    bs58::decode(rest)
        .into_vec()
        .map_err(|e| TrustError::Invalid(format!("invalid base58btc in multibase value: {e}")))
}

/// Encodes `bytes` as a `z`-prefixed multibase base58-btc string.
#[must_use]
pub fn multibase_encode(bytes: &[u8]) -> String {
    format!("z{}", bs58::encode(bytes).into_string())
}

/// Strips the Ed25519 multicodec prefix from a multibase-decoded key,
/// accepting a bare 32-byte raw key as well.
///
/// Per the Ed25519 multikey format: a 34-byte value whose first two bytes
/// are `0xed 0x01` is a multicodec-prefixed key, the remaining 32 bytes
/// being the raw public key. A 32-byte value is accepted as already raw.
///
/// # Errors
/// [`TrustError::Invalid`] if the decoded value is neither 32 nor 34 bytes,
/// or is 34 bytes without the expected multicodec prefix.
pub fn ed25519_raw_key(decoded: &[u8]) -> Result<[u8; 32]> {
    match decoded.len() {
        32 => {
            let mut key = [0u8; 32];
            key.copy_from_slice(decoded);
            Ok(key)
        }
        34 if decoded[..2] == ED25519_MULTICODEC => {
            let mut key = [0u8; 32];
            key.copy_from_slice(&decoded[2..]);
            Ok(key)
        }
        34 => Err(TrustError::Invalid(format!(
            "expected ed25519 multicodec prefix {ED25519_MULTICODEC:02x?}, got {:02x?}",
            &decoded[..2]
        ))),
        n => Err(TrustError::Invalid(format!("expected a 32 or 34 byte ed25519 key, got {n} bytes"))),
    }
}

/// Standard (padded) base64 encoding.
#[must_use]
pub fn base64_encode(bytes: &[u8]) -> String {
    Base64::encode_string(bytes)
}

/// Standard base64 decoding.
///
/// # Errors
/// [`TrustError::Invalid`] if `value` is not valid base64.
pub fn base64_decode(value: &str) -> Result<Vec<u8>> {
    Base64::decode_vec(value).map_err(|e| TrustError::Invalid(format!("invalid base64: {e}")))
}

/// URL-safe, unpadded base64 decoding, as used by detached JWS segments.
///
/// # Errors
/// [`TrustError::Invalid`] if `value` is not valid base64url.
pub fn base64url_decode(value: &str) -> Result<Vec<u8>> {
    Base64UrlUnpadded::decode_vec(value).map_err(|e| TrustError::Invalid(format!("invalid base64url: {e}")))
}

/// URL-safe, unpadded base64 encoding.
#[must_use]
pub fn base64url_encode(bytes: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(bytes)
}

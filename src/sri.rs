//! # Subresource Integrity (SRI)
//!
//! Verifies fetched bytes against a `<algo>-<base64(digest)>` SRI string,
//! exactly as fetched over the wire — never against a re-serialized form of
//! a parsed document, since re-serialization is not guaranteed to reproduce
//! the original byte sequence.

use crate::error::{Result, TrustError};
use crate::hash::{base64_decode, base64_encode, Algorithm};

/// A parsed SRI digest, e.g. `sha256-<base64>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sri {
    algorithm: Algorithm,
    digest: Vec<u8>,
}

impl Sri {
    /// Parses a `digestSRI`-style string (`<algorithm>-<base64 digest>`).
    ///
    /// # Errors
    /// [`TrustError::Invalid`] if the string has no `-` separator or the
    /// digest portion is not valid base64; [`TrustError::NotSupported`] for
    /// an unrecognized algorithm label.
    pub fn parse(value: &str) -> Result<Self> {
        let (algo, digest_b64) = value
            .split_once('-')
            .ok_or_else(|| TrustError::Invalid(format!("malformed SRI string: {value:?}")))?;
        let algorithm = Algorithm::parse(algo)?;
        let digest = base64_decode(digest_b64)?;
        Ok(Self { algorithm, digest })
    }

    /// Verifies that `bytes`, digested with this SRI's algorithm, matches
    /// the embedded digest.
    ///
    /// # Errors
    /// [`TrustError::VerificationFailed`] on mismatch.
    pub fn verify(&self, bytes: &[u8]) -> Result<()> {
        let computed = self.algorithm.digest(bytes);
        if computed == self.digest {
            Ok(())
        } else {
            Err(TrustError::VerificationFailed(format!(
                "SRI mismatch: expected {}, computed {}",
                base64_encode(&self.digest),
                base64_encode(&computed)
            )))
        }
    }
}

/// Convenience: parses `digest_sri` and verifies it against `bytes` in one
/// call.
///
/// # Errors
/// See [`Sri::parse`] and [`Sri::verify`].
pub fn verify(digest_sri: &str, bytes: &[u8]) -> Result<()> {
    Sri::parse(digest_sri)?.verify(bytes)
}

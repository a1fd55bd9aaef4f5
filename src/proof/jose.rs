//! # Detached JWS (Ed25519Signature2018)
//!
//! Splits and decodes the `<protectedHeader>..<signature>` detached JWS form
//! carried in a 2018-suite proof's `jws` field.

use crate::error::{Result, TrustError};
use crate::hash::base64url_decode;

/// A parsed detached JWS: the protected header (still base64url-encoded, as
/// it contributes to `verifyData` in that form) and the decoded signature
/// bytes.
pub struct DetachedJws {
    /// The base64url-encoded protected header segment, unmodified.
    pub protected_header: String,
    /// The decoded signature bytes.
    pub signature: Vec<u8>,
}

/// Parses `jws` of the form `<protectedHeader>..<signature>` (the empty
/// middle segment is the detached payload).
///
/// # Errors
/// [`TrustError::Invalid`] if `jws` is not of this exact three-segment,
/// empty-payload shape, or its signature segment is not valid base64url.
pub fn parse_detached(jws: &str) -> Result<DetachedJws> {
    let mut parts = jws.split('.');
    let (Some(header), Some(payload), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(TrustError::Invalid(format!("{jws:?} is not a three-segment JWS")));
    };
    if !payload.is_empty() {
        return Err(TrustError::Invalid("expected a detached JWS with an empty payload segment".into()));
    }
    if header.is_empty() || signature.is_empty() {
        return Err(TrustError::Invalid("detached JWS header/signature segment must not be empty".into()));
    }

    let signature = base64url_decode(signature)
        .map_err(|e| TrustError::Invalid(format!("detached JWS signature is not valid base64url: {e}")))?;

    Ok(DetachedJws { protected_header: header.to_string(), signature })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_detached_jws() {
        let parsed = parse_detached("eyJhbGciOiJFZERTQSJ9..c2ln").unwrap();
        assert_eq!(parsed.protected_header, "eyJhbGciOiJFZERTQSJ9");
        assert_eq!(parsed.signature, base64url_decode("c2ln").unwrap());
    }

    #[test]
    fn rejects_non_detached_jws() {
        assert!(parse_detached("header.payload.signature").is_err());
    }

    #[test]
    fn rejects_wrong_segment_count() {
        assert!(parse_detached("onlyonesegment").is_err());
    }
}

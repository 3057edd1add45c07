//! Security utilities for WhatsApp webhook verification
//!
//! This module provides signature verification for incoming WhatsApp webhook requests
//! using the X-Hub-Signature-256 header. This ensures that requests actually originate
//! from Meta/Facebook and haven't been tampered with.
//!
//! # Security Background
//!
//! Meta signs all webhook payloads with HMAC-SHA256 using your app's secret key.
//! The signature is included in the `X-Hub-Signature-256` header with the format:
//! `sha256=<hex_signature>`
//!
//! # Important Notes
//!
//! - The signature MUST be computed on the raw request body bytes, not parsed JSON
//! - The comparison must be constant-time to prevent timing attacks
//! - The header format is `sha256=<signature>` (lowercase prefix)

use derive_more::{Display, Error};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::consts;

type HmacSha256 = Hmac<Sha256>;

/// Reasons a webhook signature is rejected
#[derive(Debug, Display, Error, PartialEq)]
pub enum SignatureError {
    #[display("missing X-Hub-Signature-256 header")]
    MissingHeader,
    #[display("signature header must start with 'sha256='")]
    InvalidPrefix,
    #[display("signature is not a hex encoded SHA-256 digest")]
    InvalidDigest,
    #[display("signature does not match payload")]
    Mismatch,
}

/// Verifies the X-Hub-Signature-256 header against the request payload
///
/// # Arguments
///
/// * `signature_header` - The value of the X-Hub-Signature-256 header, if present
/// * `payload` - The raw request body bytes
/// * `app_secret` - The WhatsApp/Facebook app secret
///
/// An empty payload is signed like any other, there is no special case.
pub fn verify_signature(
    signature_header: Option<&str>,
    payload: &[u8],
    app_secret: &str,
) -> Result<(), SignatureError> {
    let signature_hex = signature_header
        .ok_or(SignatureError::MissingHeader)?
        .strip_prefix(consts::SIGNATURE_PREFIX)
        .ok_or(SignatureError::InvalidPrefix)?;

    let expected_signature =
        hex::decode(signature_hex).map_err(|_| SignatureError::InvalidDigest)?;

    // HMAC accepts keys of any length, this never fails
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes())
        .map_err(|_| SignatureError::Mismatch)?;
    mac.update(payload);
    let computed_signature = mac.finalize().into_bytes();

    if expected_signature.len() != computed_signature.len() {
        return Err(SignatureError::InvalidDigest);
    }

    // Constant-time comparison to prevent timing attacks
    let is_valid: bool = computed_signature.ct_eq(&expected_signature[..]).into();
    if !is_valid {
        return Err(SignatureError::Mismatch);
    }

    Ok(())
}

/// Builds the header value Meta would send for `payload`
#[cfg(test)]
pub(crate) fn sign_payload(app_secret: &str, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(app_secret.as_bytes()).unwrap();
    mac.update(payload);

    format!(
        "{}{}",
        consts::SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    )
}

//! Webhook payload signatures.

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::GitError;

type HmacSha1 = Hmac<Sha1>;

const SHA1_PREFIX: &str = "sha1=";

/// Compute the `sha1=<hex>` signature GitHub sends for `body`.
pub fn sign_payload(secret: &str, body: &[u8]) -> Result<String, GitError> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| GitError::Authentication(e.to_string()))?;
    mac.update(body);
    Ok(format!(
        "{}{}",
        SHA1_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Check a delivered signature against HMAC-SHA1(secret, body).
///
/// The `sha1=` prefix is optional. The digest comparison is constant time.
pub fn verify_sha1_signature(secret: &str, body: &[u8], signature: &str) -> Result<(), GitError> {
    let mismatch =
        || GitError::Authentication("X-Hub-Signature does not match secret".to_string());

    let sig_hex = signature.strip_prefix(SHA1_PREFIX).unwrap_or(signature);
    let sig_bytes = hex::decode(sig_hex).map_err(|_| mismatch())?;

    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| GitError::Authentication(e.to_string()))?;
    mac.update(body);
    mac.verify_slice(&sig_bytes).map_err(|_| mismatch())
}

//! SHA-256 digests: export checksums and webhook signatures.
//!
//! A webhook signature is the lowercase hex HMAC-SHA256 of the raw request
//! body, keyed with the shared secret.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Hex SHA-256 of `bytes`, sent alongside CSV exports.
pub fn content_sha256(bytes: &[u8]) -> String { hex::encode(Sha256::digest(bytes)) }

fn keyed(secret: &str, body: &[u8]) -> Option<HmacSha256> {
  let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
  mac.update(body);
  Some(mac)
}

pub fn webhook_signature(secret: &str, body: &[u8]) -> Option<String> {
  keyed(secret, body).map(|mac| hex::encode(mac.finalize().into_bytes()))
}

/// Check `signature` (hex, any case) against the expected signature in
/// constant time.
pub fn verify_webhook_signature(secret: &str, body: &[u8], signature: &str) -> bool {
  let Ok(given) = hex::decode(signature.trim()) else {
    return false;
  };
  keyed(secret, body).is_some_and(|mac| mac.verify_slice(&given).is_ok())
}

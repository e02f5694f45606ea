// service/src/services/signature.rs

//! Vendor webhook signatures: hex HMAC-SHA256 over the exact request bytes.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const PREFIX: &str = "sha256=";

/// Hex signature for `body`, as the vendor would send it.
pub fn sign(secret: &[u8], body: &[u8]) -> String {
  // HMAC accepts keys of any length; this cannot fail.
  let mut mac = match HmacSha256::new_from_slice(secret) {
    Ok(mac) => mac,
    Err(_) => return String::new(),
  };
  mac.update(body);
  hex::encode(mac.finalize().into_bytes())
}

/// Checks `header` against the signature of `body`. Accepts an optional
/// `sha256=` prefix and either hex case; compares in constant time.
pub fn verify(secret: &[u8], body: &[u8], header: &str) -> bool {
  let provided = header.trim();
  let provided = provided.strip_prefix(PREFIX).unwrap_or(provided).to_ascii_lowercase();
  let expected = sign(secret, body);
  if expected.is_empty() {
    return false;
  }
  constant_time_eq::constant_time_eq(expected.as_bytes(), provided.as_bytes())
}

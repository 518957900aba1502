//! Keyed SRS hash: HMAC-SHA1, base64, truncated.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ring::hmac;
use subtle::ConstantTimeEq;

use super::SrsError;

/// Significant characters in a base64-encoded SHA-1 digest. The 28th
/// character is always `=` padding, which would collide with the separator.
pub const MAX_HASH_LEN: usize = 27;

/// Produce the hash token for `data`.
///
/// The input is lowercased before hashing so that relays which case-fold
/// local parts do not invalidate the hash.
pub fn generate(data: &str, key: &[u8], len: usize) -> String {
    let key = hmac::Key::new(hmac::HMAC_SHA1_FOR_LEGACY_USE_ONLY, key);
    let tag = hmac::sign(&key, data.to_ascii_lowercase().as_bytes());
    let mut encoded = BASE64.encode(tag.as_ref());
    encoded.truncate(len.min(MAX_HASH_LEN));
    encoded
}

/// Check `token` against the hash of `data`, ignoring case.
pub fn verify(token: &str, data: &str, key: &[u8], len: usize) -> Result<(), SrsError> {
    let expected = generate(data, key, len).to_ascii_lowercase();
    let given = token.to_ascii_lowercase();

    if given.as_bytes().ct_eq(expected.as_bytes()).into() {
        Ok(())
    } else {
        Err(SrsError::InvalidHash)
    }
}

use std::fmt;

use zeroize::Zeroizing;

use super::hash::MAX_HASH_LEN;
use super::types::Separator;
use super::SrsError;

pub const DEFAULT_HASH_LEN: usize = 4;
pub const DEFAULT_VALIDITY_DAYS: u32 = 7;

/// Immutable scheme parameters shared by every rewrite.
///
/// Construct with [`SrsConfig::new`]; the `with_*` methods return a modified
/// copy and leave the receiver untouched, so a config can be shared across
/// threads while a replacement is derived from it.
#[derive(Clone)]
pub struct SrsConfig {
    key: Zeroizing<Vec<u8>>,
    hash_len: usize,
    separator: Separator,
    validity_days: u32,
}

impl SrsConfig {
    /// Create a config with the given HMAC secret and default parameters:
    /// hash length 4, separator `=`, validity 7 days.
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: Zeroizing::new(key.as_ref().to_vec()),
            hash_len: DEFAULT_HASH_LEN,
            separator: Separator::default(),
            validity_days: DEFAULT_VALIDITY_DAYS,
        }
    }

    /// Derive a config using `separator`, which must be `=`, `+` or `-`.
    pub fn with_separator(&self, separator: char) -> Result<Self, SrsError> {
        let separator = Separator::try_from(separator)?;
        Ok(Self {
            separator,
            ..self.clone()
        })
    }

    /// Derive a config producing hashes of `len` characters (1 to 27).
    pub fn with_hash_len(&self, len: usize) -> Result<Self, SrsError> {
        if len == 0 || len > MAX_HASH_LEN {
            return Err(SrsError::InvalidHashLength);
        }
        Ok(Self {
            hash_len: len,
            ..self.clone()
        })
    }

    /// Derive a config accepting SRS0 timestamps up to `days` old.
    pub fn with_validity_days(&self, days: u32) -> Self {
        Self {
            validity_days: days,
            ..self.clone()
        }
    }

    pub(crate) fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn hash_len(&self) -> usize {
        self.hash_len
    }

    pub fn separator(&self) -> Separator {
        self.separator
    }

    pub fn validity_days(&self) -> u32 {
        self.validity_days
    }
}

impl fmt::Debug for SrsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SrsConfig")
            .field("key", &"<redacted>")
            .field("hash_len", &self.hash_len)
            .field("separator", &self.separator)
            .field("validity_days", &self.validity_days)
            .finish()
    }
}

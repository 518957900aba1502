//! Splitting and classification of SRS local parts.

use tracing::trace;

use crate::common::address::Mailbox;

use super::types::{AddressKind, ParsedAddress, Separator, Srs0Record, Srs1Record};
use super::SrsError;

const TAG_LEN: usize = 4;

/// Validate `address`, split it at `@` and classify the local part.
pub fn validate(address: &str) -> Result<ParsedAddress, SrsError> {
    let mailbox = Mailbox::parse(address).map_err(|e| {
        trace!(error = %e, "address rejected");
        SrsError::InvalidAddress
    })?;

    // A quoted local part may carry its own '@'; SRS cannot represent that.
    let spec = mailbox.addr_spec();
    let mut parts = spec.split('@');
    let (local_part, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return Err(SrsError::InvalidAddress),
    };

    Ok(ParsedAddress {
        kind: classify(local_part),
        local_part: local_part.to_string(),
        domain: domain.to_string(),
    })
}

/// `SRS0`/`SRS1` (any case) followed by a legal separator.
pub fn classify(local_part: &str) -> AddressKind {
    let tag = match local_part.get(..TAG_LEN) {
        Some(tag) => tag,
        None => return AddressKind::Plain,
    };
    if detect_separator(local_part).is_err() {
        return AddressKind::Plain;
    }
    if tag.eq_ignore_ascii_case("SRS0") {
        AddressKind::Srs0
    } else if tag.eq_ignore_ascii_case("SRS1") {
        AddressKind::Srs1
    } else {
        AddressKind::Plain
    }
}

/// Read the separator that follows the 4-character SRS tag.
pub fn detect_separator(local_part: &str) -> Result<Separator, SrsError> {
    local_part
        .as_bytes()
        .get(TAG_LEN)
        .and_then(|&b| Separator::from_char(b as char))
        .ok_or(SrsError::InvalidSeparator)
}

/// Split `SRS0<sep>hash<sep>ts<sep>domain<sep>local`.
///
/// The split stops after five fields, so a local part containing the
/// separator is kept whole.
pub fn split_srs0(local_part: &str) -> Result<Srs0Record, SrsError> {
    let sep = detect_separator(local_part)?.as_char();
    let fields: Vec<&str> = local_part.splitn(5, sep).collect();
    if fields.len() < 5 {
        return Err(SrsError::InvalidAddress);
    }
    srs0_record(fields[1], fields[2], fields[3], fields[4])
}

/// Split an SRS0 local part whose hash is known to be `hash_len` characters.
///
/// A base64 hash may contain `+`, so with the `+` separator the hash is cut
/// by length rather than at the next separator. Falls back to
/// [`split_srs0`] when the local part does not fit that layout.
pub fn split_srs0_hashed(local_part: &str, hash_len: usize) -> Result<Srs0Record, SrsError> {
    if let Some((hash, sep, rest)) = split_fixed_hash(local_part, hash_len) {
        let fields: Vec<&str> = rest.splitn(3, sep).collect();
        if let [timestamp, domain, local] = fields[..] {
            if let Ok(record) = srs0_record(hash, timestamp, domain, local) {
                return Ok(record);
            }
        }
    }
    split_srs0(local_part)
}

fn srs0_record(
    hash: &str,
    timestamp: &str,
    domain: &str,
    local: &str,
) -> Result<Srs0Record, SrsError> {
    if timestamp.chars().count() != super::timestamp::TOKEN_LEN
        || domain.is_empty()
        || local.is_empty()
    {
        return Err(SrsError::InvalidAddress);
    }

    Ok(Srs0Record {
        hash: hash.to_string(),
        timestamp: timestamp.to_string(),
        domain: domain.to_string(),
        local_part: local.to_string(),
    })
}

/// Split `SRS1<sep>hash<sep>domain<sep>opaque`, keeping `opaque` verbatim.
pub fn split_srs1(local_part: &str) -> Result<Srs1Record, SrsError> {
    let sep = detect_separator(local_part)?.as_char();
    let fields: Vec<&str> = local_part.splitn(4, sep).collect();
    if fields.len() < 4 {
        return Err(SrsError::InvalidAddress);
    }
    srs1_record(fields[1], fields[2], fields[3])
}

/// Split an SRS1 local part whose hash is known to be `hash_len` characters.
///
/// Falls back to [`split_srs1`] when the local part does not fit that layout.
pub fn split_srs1_hashed(local_part: &str, hash_len: usize) -> Result<Srs1Record, SrsError> {
    if let Some((hash, sep, rest)) = split_fixed_hash(local_part, hash_len) {
        if let Some((domain, opaque)) = rest.split_once(sep) {
            if let Ok(record) = srs1_record(hash, domain, opaque) {
                return Ok(record);
            }
        }
    }
    split_srs1(local_part)
}

fn srs1_record(hash: &str, domain: &str, opaque: &str) -> Result<Srs1Record, SrsError> {
    if domain.is_empty() || opaque.is_empty() {
        return Err(SrsError::InvalidAddress);
    }

    Ok(Srs1Record {
        hash: hash.to_string(),
        first_hop_domain: domain.to_string(),
        opaque: opaque.to_string(),
    })
}

/// `(hash, separator, rest)` for `SRSx<sep><hash of hash_len><sep>rest`.
fn split_fixed_hash(local_part: &str, hash_len: usize) -> Option<(&str, char, &str)> {
    let sep = detect_separator(local_part).ok()?.as_char();
    let body = local_part.get(TAG_LEN + 1..)?;
    let hash = body.get(..hash_len)?;
    let rest = body.get(hash_len..)?.strip_prefix(sep)?;
    Some((hash, sep, rest))
}

/// The local part with its 4-character SRS tag removed.
pub(crate) fn strip_tag(local_part: &str) -> Result<&str, SrsError> {
    local_part.get(TAG_LEN..).ok_or(SrsError::InvalidAddress)
}

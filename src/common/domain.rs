/// Maximum length of a domain name in octets (RFC 1035).
pub const MAX_DOMAIN_LEN: usize = 255;

/// Maximum length of a single DNS label in octets.
pub const MAX_LABEL_LEN: usize = 63;

/// Strip a single trailing root dot, preserving case.
pub fn trim_root(domain: &str) -> &str {
    domain.strip_suffix('.').unwrap_or(domain)
}

/// Check that `domain` is a dot-separated sequence of LDH labels.
///
/// Labels may also contain `_`, which shows up in real-world relay names even
/// though it is not strictly LDH. Empty labels are rejected, so a trailing root
/// dot must be removed with [`trim_root`] first.
pub fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
        return false;
    }
    domain.split('.').all(is_valid_label)
}

fn is_valid_label(label: &str) -> bool {
    if label.is_empty() || label.len() > MAX_LABEL_LEN {
        return false;
    }
    if label.starts_with('-') || label.ends_with('-') {
        return false;
    }
    label
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// Check an RFC 5321 address literal such as `[192.0.2.1]` or `[IPv6:::1]`.
///
/// Only the bracket framing and dtext characters are checked; the literal is
/// carried through SRS opaquely.
pub fn is_valid_address_literal(literal: &str) -> bool {
    let inner = match literal
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        Some(inner) => inner,
        None => return false,
    };
    !inner.is_empty()
        && inner
            .bytes()
            .all(|b| (33..=126).contains(&b) && b != b'[' && b != b']' && b != b'\\')
}

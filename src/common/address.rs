//! Mailbox address parsing.
//!
//! Accepts the mailbox forms a sender address arrives in:
//!
//! - `local@domain`
//! - `<local@domain>`
//! - `Display Name <local@domain>` / `"Display, Name" <local@domain>`
//!
//! The local part is a dot-atom or a quoted-string. The domain is a sequence
//! of LDH labels or an address literal. Comments, group syntax, obsolete
//! routes and the null reverse-path `<>` are rejected.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use super::domain::{is_valid_address_literal, is_valid_domain, MAX_DOMAIN_LEN};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("empty address")]
    Empty,
    #[error("missing '@' separator")]
    MissingAt,
    #[error("empty local part")]
    EmptyLocalPart,
    #[error("empty domain")]
    EmptyDomain,
    #[error("invalid local part: {0}")]
    InvalidLocalPart(String),
    #[error("invalid domain: {0}")]
    InvalidDomain(String),
    #[error("domain exceeds 255 octets")]
    DomainTooLong,
    #[error("unbalanced angle brackets")]
    InvalidBrackets,
    #[error("invalid display name")]
    InvalidDisplayName,
    #[error("unterminated quoted string")]
    UnterminatedQuote,
}

/// A syntactically valid mailbox, reduced to its addr-spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Local part exactly as written, including quotes if it was quoted.
    pub local: String,
    /// Domain exactly as written.
    pub domain: String,
}

impl Mailbox {
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        let addr_spec = if trimmed.ends_with('>') {
            let open = trimmed.rfind('<').ok_or(AddressError::InvalidBrackets)?;
            let display = trimmed[..open].trim_end();
            if !display.is_empty() {
                check_display_name(display)?;
            }
            &trimmed[open + 1..trimmed.len() - 1]
        } else {
            if trimmed.contains('<') || trimmed.contains('>') {
                return Err(AddressError::InvalidBrackets);
            }
            trimmed
        };

        parse_addr_spec(addr_spec)
    }

    /// Render as a bare `local@domain`.
    pub fn addr_spec(&self) -> String {
        let mut s = String::with_capacity(self.local.len() + 1 + self.domain.len());
        s.push_str(&self.local);
        s.push('@');
        s.push_str(&self.domain);
        s
    }
}

impl FromStr for Mailbox {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mailbox::parse(s)
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.local, self.domain)
    }
}

fn parse_addr_spec(spec: &str) -> Result<Mailbox, AddressError> {
    if spec.is_empty() {
        return Err(AddressError::Empty);
    }

    let (local, domain) = if spec.starts_with('"') {
        let end = quoted_string_end(spec)?;
        let rest = &spec[end..];
        let domain = rest.strip_prefix('@').ok_or(AddressError::MissingAt)?;
        (&spec[..end], domain)
    } else {
        spec.split_once('@').ok_or(AddressError::MissingAt)?
    };

    if local.is_empty() {
        return Err(AddressError::EmptyLocalPart);
    }
    if domain.is_empty() {
        return Err(AddressError::EmptyDomain);
    }

    if !local.starts_with('"') && !is_dot_atom(local) {
        return Err(AddressError::InvalidLocalPart(local.to_string()));
    }
    check_domain(domain)?;

    Ok(Mailbox {
        local: local.to_string(),
        domain: domain.to_string(),
    })
}

fn check_domain(domain: &str) -> Result<(), AddressError> {
    if domain.len() > MAX_DOMAIN_LEN {
        return Err(AddressError::DomainTooLong);
    }
    let ok = if domain.starts_with('[') {
        is_valid_address_literal(domain)
    } else {
        is_valid_domain(domain)
    };
    if ok {
        Ok(())
    } else {
        Err(AddressError::InvalidDomain(domain.to_string()))
    }
}

/// Display name: words of atext separated by whitespace or dots, or quoted strings.
fn check_display_name(display: &str) -> Result<(), AddressError> {
    let mut rest = display;
    while !rest.is_empty() {
        if rest.starts_with('"') {
            let end = quoted_string_end(rest)?;
            rest = &rest[end..];
            continue;
        }
        let c = rest.chars().next().ok_or(AddressError::InvalidDisplayName)?;
        if !(is_atext(c) || c == '.' || c == ' ' || c == '\t') {
            return Err(AddressError::InvalidDisplayName);
        }
        rest = &rest[c.len_utf8()..];
    }
    Ok(())
}

/// Byte offset just past the closing quote of a quoted-string starting at 0.
fn quoted_string_end(s: &str) -> Result<usize, AddressError> {
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                match bytes.get(i + 1) {
                    Some(b) if (32..=126).contains(b) || *b == b'\t' => i += 2,
                    _ => return Err(AddressError::UnterminatedQuote),
                }
            }
            b'"' => return Ok(i + 1),
            b'\r' | b'\n' => return Err(AddressError::UnterminatedQuote),
            _ => i += 1,
        }
    }
    Err(AddressError::UnterminatedQuote)
}

fn is_dot_atom(s: &str) -> bool {
    !s.is_empty() && s.split('.').all(|atom| !atom.is_empty() && atom.chars().all(is_atext))
}

// RFC 6532 extends atext with UTF-8 non-ASCII characters.
fn is_atext(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-/=?^_`{|}~".contains(c) || !c.is_ascii()
}

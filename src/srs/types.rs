use std::fmt;

use super::SrsError;

/// Field delimiter inside a rewritten local part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Separator {
    #[default]
    Equals,
    Plus,
    Minus,
}

impl Separator {
    pub fn as_char(self) -> char {
        match self {
            Separator::Equals => '=',
            Separator::Plus => '+',
            Separator::Minus => '-',
        }
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '=' => Some(Separator::Equals),
            '+' => Some(Separator::Plus),
            '-' => Some(Separator::Minus),
            _ => None,
        }
    }
}

impl TryFrom<char> for Separator {
    type Error = SrsError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        Separator::from_char(c).ok_or(SrsError::InvalidSeparator)
    }
}

impl fmt::Display for Separator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Rewriting state of an incoming address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// Not rewritten.
    Plain,
    /// Rewritten once, by the first hop.
    Srs0,
    /// Rewritten by a second or later hop.
    Srs1,
}

impl AddressKind {
    pub fn is_srs(self) -> bool {
        !matches!(self, AddressKind::Plain)
    }
}

/// A validated address split at `@` and classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAddress {
    pub local_part: String,
    pub domain: String,
    pub kind: AddressKind,
}

impl ParsedAddress {
    pub fn is_srs(&self) -> bool {
        self.kind.is_srs()
    }
}

/// Fields of an SRS0 local part: `SRS0<sep>hash<sep>ts<sep>domain<sep>local`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Srs0Record {
    pub hash: String,
    pub timestamp: String,
    pub domain: String,
    pub local_part: String,
}

/// Fields of an SRS1 local part: `SRS1<sep>hash<sep>domain<sep>opaque`.
///
/// `opaque` is everything after the first-hop domain, verbatim. For an SRS1
/// built from an SRS0 it starts with the SRS0 separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Srs1Record {
    pub hash: String,
    pub first_hop_domain: String,
    pub opaque: String,
}

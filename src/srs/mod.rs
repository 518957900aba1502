//! Sender Rewriting Scheme: SRS0/SRS1 envelope-sender rewriting for forwarders.

mod config;
mod engine;
pub mod hash;
pub mod parser;
pub mod timestamp;
mod types;

pub use config::SrsConfig;
pub use engine::Srs;
pub use types::{AddressKind, ParsedAddress, Separator, Srs0Record, Srs1Record};

use thiserror::Error;

/// SRS failure. Every variant is terminal for the call that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SrsError {
    /// Not a syntactically valid address, or an SRS local part with too few fields.
    #[error("invalid email address")]
    InvalidAddress,
    #[error("invalid SRS separator, must be one of '=', '+', '-'")]
    InvalidSeparator,
    /// Valid address, but not tagged SRS0/SRS1.
    #[error("not an SRS address")]
    InvalidSrsAddress,
    #[error("invalid hash")]
    InvalidHash,
    #[error("invalid timestamp character")]
    InvalidTimestampCharacter,
    #[error("timestamp expired")]
    TimestampExpired,
    #[error("invalid hash length, must be between 1 and {}", hash::MAX_HASH_LEN)]
    InvalidHashLength,
}

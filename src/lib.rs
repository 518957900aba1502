//! Sender Rewriting Scheme (SRS) for forwarding mail relays.
//!
//! A forwarder rewrites the envelope sender of relayed mail into an SRS0 or
//! SRS1 address in its own domain, so SPF checks at the next hop pass, and
//! reverses that rewrite when a bounce comes back.
//!
//! The crate performs no I/O. Mail delivery, SMTP sessions and key storage are
//! the caller's responsibility.
//!
//! ```
//! use email_srs::{Srs, SrsConfig};
//!
//! let srs = Srs::new(SrsConfig::new("secret"));
//! let rewritten = srs.forward("bob@example.com", "relay.example.net").unwrap();
//! assert!(rewritten.starts_with("SRS0="));
//! assert_eq!(srs.reverse(&rewritten).unwrap(), "bob@example.com");
//! ```

pub mod common;
pub mod srs;

pub use srs::{AddressKind, Separator, Srs, SrsConfig, SrsError};

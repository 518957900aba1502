//! Mail address plumbing shared by the rewriting scheme.

pub mod address;
pub mod domain;

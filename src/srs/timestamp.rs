//! Two-character day timestamps for SRS0 addresses.
//!
//! The token is the Unix day number modulo 1024, written as two 5-bit digits
//! over `ABCDEFGHIJKLMNOPQRSTUVWXYZ234567`. This is the SRS alphabet, not
//! RFC 4648 base32 encoding.

use std::time::{SystemTime, UNIX_EPOCH};

use super::SrsError;

pub const PRECISION_SECS: u64 = 60 * 60 * 24;
pub const BASE_BITS: u32 = 5;
pub const TOKEN_LEN: usize = 2;
/// Number of distinct day values before the token wraps.
pub const SLOTS: u64 = 1 << (BASE_BITS * TOKEN_LEN as u32);

const ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";
const DIGIT_MASK: u64 = (1 << BASE_BITS) - 1;

pub fn current_epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Encode the day containing `now_secs`, most significant digit first.
pub fn encode(now_secs: u64) -> String {
    let day = now_secs / PRECISION_SECS;
    let hi = (day >> BASE_BITS) & DIGIT_MASK;
    let lo = day & DIGIT_MASK;
    [ALPHABET[hi as usize] as char, ALPHABET[lo as usize] as char]
        .iter()
        .collect()
}

/// Decode a token back to its day value (case-insensitive).
pub fn decode(token: &str) -> Result<u64, SrsError> {
    token.chars().try_fold(0u64, |acc, c| {
        let digit = ALPHABET
            .iter()
            .position(|&a| a as char == c.to_ascii_uppercase())
            .ok_or(SrsError::InvalidTimestampCharacter)?;
        Ok((acc << BASE_BITS) | digit as u64)
    })
}

/// Accept `day` if it lies within `validity_days` before the current day.
pub fn check_validity(day: u64, validity_days: u32) -> Result<(), SrsError> {
    check_validity_at(day, validity_days, current_epoch_secs())
}

/// Accept `day` if it lies within `validity_days` before the day of `now_secs`.
///
/// The token wraps every 1024 days, so "now" is moved forward by whole
/// periods until it is not behind `day`. A token that appears to be from the
/// future therefore reads as roughly 1024 days old and is rejected.
pub fn check_validity_at(day: u64, validity_days: u32, now_secs: u64) -> Result<(), SrsError> {
    let mut now = (now_secs / PRECISION_SECS) % SLOTS;
    while now < day {
        now += SLOTS;
    }

    if now <= day + u64::from(validity_days) {
        Ok(())
    } else {
        Err(SrsError::TimestampExpired)
    }
}

//! Metric name rules.
//!
//! Names double as snapshot file stems, so the alphabet is restricted to
//! characters that can never form a path separator.

use crate::error::{CounterError, Result};

/// Longest accepted metric name, in bytes.
pub const MAX_NAME_LEN: usize = 128;

/// Returns true for `[a-z0-9.-]{1,128}`.
pub fn is_valid(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'.')
}

pub fn validate(name: &str) -> Result<()> {
    if is_valid(name) {
        Ok(())
    } else {
        Err(CounterError::InvalidName(name.to_string()))
    }
}

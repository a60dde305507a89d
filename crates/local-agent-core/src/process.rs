// local-agent-core/src/process.rs
// ============================================================================
// Module: Process Identifiers
// Description: Strict parsing of caller-supplied process ids.
// Purpose: Ensure only a positive integer literal ever reaches the kill primitive.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! A pid is accepted as a JSON integer or a string of ASCII digits. Signs,
//! whitespace, fractions and zero are rejected, so the value passed to the
//! host kill primitive is always a bare decimal literal.

use std::fmt;
use std::num::NonZeroU32;

use serde_json::Value;
use thiserror::Error;

/// Invalid pid error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid pid")]
pub struct InvalidPid;

/// A validated, positive process id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(NonZeroU32);

impl ProcessId {
    /// Parses a pid from a JSON argument value.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPid`] for anything other than a positive integer literal.
    pub fn parse(value: &Value) -> Result<Self, InvalidPid> {
        match value {
            Value::Number(number) => {
                let raw = number.as_u64().ok_or(InvalidPid)?;
                let raw = u32::try_from(raw).map_err(|_| InvalidPid)?;
                NonZeroU32::new(raw).map(Self).ok_or(InvalidPid)
            }
            Value::String(text) => Self::parse_str(text),
            _ => Err(InvalidPid),
        }
    }

    /// Parses a pid from an all-digit string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidPid`] when the string is not a positive decimal literal.
    pub fn parse_str(text: &str) -> Result<Self, InvalidPid> {
        if text.is_empty() || !text.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(InvalidPid);
        }
        text.parse::<NonZeroU32>().map(Self).map_err(|_| InvalidPid)
    }

    /// Returns the numeric pid.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

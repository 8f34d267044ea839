//! Authentication results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Binary result of an authentication attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum AuthResult {
    /// Credentials were not accepted (or no attempt was made).
    #[default]
    NotValid = 0,
    /// Credentials were accepted.
    Valid = 1,
}

impl AuthResult {
    /// Build a result from a boolean verdict.
    pub fn from_bool(valid: bool) -> Self {
        if valid {
            AuthResult::Valid
        } else {
            AuthResult::NotValid
        }
    }

    /// Integer code of the result (0 or 1).
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Check if the result is valid.
    pub fn is_valid(self) -> bool {
        self == AuthResult::Valid
    }
}

impl From<bool> for AuthResult {
    fn from(valid: bool) -> Self {
        Self::from_bool(valid)
    }
}

impl fmt::Display for AuthResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthResult::NotValid => write!(f, "NOT_VALID"),
            AuthResult::Valid => write!(f, "VALID"),
        }
    }
}

/// Detailed outcome of the most recent attempt.
///
/// Collapses to [`AuthResult`] via [`AuthOutcome::result`], but keeps the
/// difference between a rejected credential and an unreachable backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthOutcome {
    /// No attempt has been made yet.
    #[default]
    Unattempted,
    /// The credential store accepted the credentials.
    Valid,
    /// The credential store rejected the credentials.
    Rejected,
    /// The credential store could not be reached.
    Unreachable(String),
}

impl AuthOutcome {
    /// The binary result for this outcome.
    pub fn result(&self) -> AuthResult {
        match self {
            AuthOutcome::Valid => AuthResult::Valid,
            _ => AuthResult::NotValid,
        }
    }

    /// Outcome for a boolean verdict from the credential store.
    pub fn from_verdict(valid: bool) -> Self {
        if valid {
            AuthOutcome::Valid
        } else {
            AuthOutcome::Rejected
        }
    }

    /// Check if the outcome is a transport failure.
    pub fn is_unreachable(&self) -> bool {
        matches!(self, AuthOutcome::Unreachable(_))
    }
}

impl fmt::Display for AuthOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthOutcome::Unattempted => write!(f, "unattempted"),
            AuthOutcome::Valid => write!(f, "valid"),
            AuthOutcome::Rejected => write!(f, "rejected"),
            AuthOutcome::Unreachable(reason) => write!(f, "unreachable: {}", reason),
        }
    }
}

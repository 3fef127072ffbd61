//! Credential verification.
//!
//! This is a presentation gate, not an authentication boundary: secrets are
//! compared as plain strings after trimming and lowercasing. There is no
//! lockout, attempt counting or constant-time comparison.

use crate::scope::Scope;
use thiserror::Error;

/// Normalize a credential for comparison.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Compare submitted text against the expected secret, ignoring case and
/// surrounding whitespace.
pub fn verify(submitted: &str, expected: &str) -> bool {
    normalize(submitted) == normalize(expected)
}

/// Why an unlock attempt was refused. Always recoverable by trying again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Nothing (or only whitespace) was submitted.
    #[error("Please enter a password.")]
    InputRequired,

    /// The submission did not match the scope's secret.
    #[error("Incorrect password. Please try again.")]
    IncorrectCredential,
}

/// A single unlock attempt. Consumed by [`UnlockRequest::check`] and never
/// persisted.
#[derive(Debug, Clone)]
pub struct UnlockRequest {
    pub scope: Scope,
    pub submitted: String,
}

impl UnlockRequest {
    pub fn new(scope: Scope, submitted: impl Into<String>) -> Self {
        Self {
            scope,
            submitted: submitted.into(),
        }
    }

    /// Check the attempt against the configured secret for its scope.
    ///
    /// Empty submissions are refused before any comparison. A scope with no
    /// configured secret cannot be opened by text.
    pub fn check(&self, expected: Option<&str>) -> Result<(), Rejection> {
        if self.submitted.trim().is_empty() {
            return Err(Rejection::InputRequired);
        }
        match expected {
            Some(secret) if verify(&self.submitted, secret) => Ok(()),
            Some(_) => Err(Rejection::IncorrectCredential),
            None => {
                tracing::warn!(scope = %self.scope, "no secret configured for scope");
                Err(Rejection::IncorrectCredential)
            }
        }
    }
}

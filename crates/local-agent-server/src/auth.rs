// local-agent-server/src/auth.rs
// ============================================================================
// Module: Request Authentication
// Description: Shared-secret check and destructive-action confirmation gate.
// Purpose: Fail closed on every protected request before arguments are read.
// Dependencies: subtle, thiserror
// ============================================================================

//! ## Overview
//! The agent has a single credential: a shared secret carried in
//! `x-agent-token`. There is no caller identity, only possession of the
//! secret. When no secret is configured every protected request is rejected.
//!
//! The confirmation header `x-confirm: YES` is request-scoped: whoever builds
//! the HTTP call can set it. It is a gate against accidental destructive
//! calls, not evidence of upstream user consent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use subtle::ConstantTimeEq;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the shared secret.
pub const AGENT_TOKEN_HEADER: &str = "x-agent-token";
/// Header carrying the destructive-action confirmation.
pub const CONFIRM_HEADER: &str = "x-confirm";
/// Confirmation value (ASCII case-insensitive).
pub const CONFIRM_VALUE: &str = "YES";

const MAX_AUTH_HEADER_BYTES: usize = 8 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Authentication failures. All map to `Unauthorized` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No secret configured; the agent fails closed.
    #[error("agent token not configured")]
    NotConfigured,
    /// Token header absent.
    #[error("missing agent token")]
    Missing,
    /// Token header exceeds the size limit.
    #[error("agent token header too large")]
    HeaderTooLarge,
    /// Token does not match.
    #[error("invalid agent token")]
    Invalid,
}

// ============================================================================
// SECTION: Authenticator
// ============================================================================

/// Shared-secret authenticator, fixed at startup.
#[derive(Clone)]
pub struct AgentAuthenticator {
    /// Configured secret; `None` means every request fails.
    token: Option<Vec<u8>>,
}

impl AgentAuthenticator {
    /// Builds an authenticator. Empty secrets count as not configured.
    #[must_use]
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: token.filter(|value| !value.is_empty()).map(String::into_bytes),
        }
    }

    /// Returns true when a secret is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.token.is_some()
    }

    /// Checks the raw `x-agent-token` header value.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] when no secret is configured or the header is
    /// missing, oversized, or wrong.
    pub fn authenticate(&self, header: Option<&[u8]>) -> Result<(), AuthError> {
        let expected = self.token.as_deref().ok_or(AuthError::NotConfigured)?;
        let presented = header.ok_or(AuthError::Missing)?;
        if presented.len() > MAX_AUTH_HEADER_BYTES {
            return Err(AuthError::HeaderTooLarge);
        }
        if constant_time_eq(presented, expected) { Ok(()) } else { Err(AuthError::Invalid) }
    }
}

impl std::fmt::Debug for AgentAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentAuthenticator").field("configured", &self.is_configured()).finish()
    }
}

/// Returns true when the `x-confirm` header value is `YES`.
#[must_use]
pub fn is_confirmed(header: Option<&[u8]>) -> bool {
    header.is_some_and(|value| value.eq_ignore_ascii_case(CONFIRM_VALUE.as_bytes()))
}

/// Constant-time byte comparison. Length mismatch returns false.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::AgentAuthenticator;
    use super::AuthError;
    use super::is_confirmed;

    #[test]
    fn unconfigured_agent_fails_closed() {
        let auth = AgentAuthenticator::new(None);
        assert_eq!(auth.authenticate(Some(b"anything")), Err(AuthError::NotConfigured));
        let empty = AgentAuthenticator::new(Some(String::new()));
        assert!(!empty.is_configured());
        assert_eq!(empty.authenticate(Some(b"")), Err(AuthError::NotConfigured));
    }

    #[test]
    fn token_must_match_exactly() {
        let auth = AgentAuthenticator::new(Some("s3cret".to_string()));
        assert_eq!(auth.authenticate(Some(b"s3cret")), Ok(()));
        assert_eq!(auth.authenticate(Some(b"S3CRET")), Err(AuthError::Invalid));
        assert_eq!(auth.authenticate(Some(b"s3cret ")), Err(AuthError::Invalid));
        assert_eq!(auth.authenticate(None), Err(AuthError::Missing));
    }

    #[test]
    fn oversized_header_is_rejected() {
        let auth = AgentAuthenticator::new(Some("s3cret".to_string()));
        let huge = vec![b'a'; 9000];
        assert_eq!(auth.authenticate(Some(&huge)), Err(AuthError::HeaderTooLarge));
    }

    #[test]
    fn confirmation_is_case_insensitive_yes_only() {
        assert!(is_confirmed(Some(b"YES")));
        assert!(is_confirmed(Some(b"yes")));
        assert!(!is_confirmed(Some(b"y")));
        assert!(!is_confirmed(Some(b"true")));
        assert!(!is_confirmed(None));
    }
}

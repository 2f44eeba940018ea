//! Identity-token port.
//!
//! The token collaborator is opaque to the domain: it turns an authenticated
//! username into token bytes and back. Token work is CPU-only, so the port
//! is synchronous.

use crate::domain::Username;

/// Failures raised by token adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// The presented token is malformed, expired, or has a bad signature.
    #[error("invalid token: {message}")]
    Invalid { message: String },
    /// The token could not be signed.
    #[error("token signing failed: {message}")]
    Signing { message: String },
}

impl TokenError {
    /// Build a [`TokenError::Invalid`] from any message-like input.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Build a [`TokenError::Signing`] from any message-like input.
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }
}

/// Issue and verify opaque identity tokens.
pub trait IdentityTokens: Send + Sync {
    /// Produce a token asserting the given username's identity.
    fn issue(&self, username: &Username) -> Result<String, TokenError>;

    /// Verify a presented token and recover the asserted username.
    fn verify(&self, token: &str) -> Result<Username, TokenError>;
}

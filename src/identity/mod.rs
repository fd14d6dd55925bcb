//! Identity provider seam.
//!
//! The application never verifies credentials itself. Everything it knows
//! about a session comes from an [`IdentityProvider`]: a stateful client
//! handle that holds at most one access token, mirrors the provider's
//! password grant, sign-up and logout calls, and broadcasts session changes.
//!
//! An [`IdentityBackend`] hands out those handles: one per browser tab on the
//! client side, one per request on the server side (seeded with the token
//! read from the session cookie).

pub mod gotrue;
#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;

/// Capacity of the session-change channel of a provider handle.
pub(crate) const EVENT_CHANNEL_CAPACITY: usize = 16;

/// The authenticated end user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub id: String,
    pub email: String,
}

/// Proof of authentication issued by the provider. Presence means valid.
#[derive(Clone, Debug)]
pub struct Session {
    pub subject: Subject,
    pub access_token: SecretString,
}

/// Session change notifications emitted by a provider handle.
#[derive(Clone, Debug)]
pub enum AuthEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

impl AuthEvent {
    /// Session carried by the event, `None` for sign-out.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::SignedIn(session) | Self::TokenRefreshed(session) => Some(session),
            Self::SignedOut => None,
        }
    }
}

/// Infrastructure failure while talking to the provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("identity provider request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("identity provider returned status {0}")]
    Status(u16),
    #[error("invalid identity provider URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of a credential operation that did not succeed.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The provider understood the request and refused it (bad credentials,
    /// duplicate registration, malformed email).
    #[error("{message}")]
    Rejected { message: String },
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

impl AuthError {
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }
}

/// Client handle to the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve the session held by this handle, `None` when there is none or
    /// the provider no longer accepts it.
    async fn get_session(&self) -> Result<Option<Session>, ProviderError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, AuthError>;

    /// Register a new subject. Does not authenticate it.
    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<(), AuthError>;

    async fn sign_out(&self) -> Result<(), ProviderError>;

    /// Subscribe to session changes of this handle.
    fn subscribe(&self) -> broadcast::Receiver<AuthEvent>;
}

/// Factory for provider handles.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Create a handle, optionally seeded with an access token.
    fn connect(&self, access_token: Option<SecretString>) -> Arc<dyn IdentityProvider>;

    /// Check that the provider answers.
    async fn ping(&self) -> Result<(), ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_out_event_carries_no_session() {
        assert!(AuthEvent::SignedOut.session().is_none());
    }

    #[test]
    fn signed_in_event_exposes_subject() {
        let session = Session {
            subject: Subject {
                id: "u1".to_string(),
                email: "alice@example.com".to_string(),
            },
            access_token: SecretString::from("token".to_string()),
        };
        let event = AuthEvent::SignedIn(session);
        assert_eq!(
            event.session().map(|s| s.subject.email.as_str()),
            Some("alice@example.com")
        );
    }

    #[test]
    fn rejected_error_displays_provider_message() {
        let err = AuthError::rejected("User already registered");
        assert_eq!(err.to_string(), "User already registered");
    }
}

//! In-process identity backend used by the test suites.
//!
//! Mirrors the GoTrue behaviour the gates depend on: password grant,
//! registration without auto sign-in, token revocation and provider outages.

use super::{
    AuthError, AuthEvent, IdentityBackend, IdentityProvider, ProviderError, Session, Subject,
    EVENT_CHANNEL_CAPACITY,
};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tokio::sync::broadcast;
use ulid::Ulid;

#[derive(Default)]
struct Store {
    users: HashMap<String, (String, String)>,
    sessions: HashMap<String, Subject>,
    unavailable: bool,
}

#[derive(Clone, Default)]
pub(crate) struct MemoryBackend {
    store: Arc<Mutex<Store>>,
}

impl MemoryBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn with_user(self, email: &str, password: &str) -> Self {
        self.store().users.insert(
            email.to_string(),
            (Ulid::new().to_string(), password.to_string()),
        );
        self
    }

    /// Issue a session for a registered user and return its token.
    pub(crate) fn issue(&self, email: &str) -> Option<String> {
        let mut store = self.store();
        let (id, _) = store.users.get(email)?.clone();
        let token = Ulid::new().to_string();
        store.sessions.insert(
            token.clone(),
            Subject {
                id,
                email: email.to_string(),
            },
        );
        Some(token)
    }

    pub(crate) fn revoke(&self, token: &str) {
        self.store().sessions.remove(token);
    }

    pub(crate) fn set_unavailable(&self, unavailable: bool) {
        self.store().unavailable = unavailable;
    }

    pub(crate) fn is_registered(&self, email: &str) -> bool {
        self.store().users.contains_key(email)
    }

    fn check_available(&self) -> Result<(), ProviderError> {
        if self.store().unavailable {
            Err(ProviderError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl IdentityBackend for MemoryBackend {
    fn connect(&self, access_token: Option<SecretString>) -> Arc<dyn IdentityProvider> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(MemoryClient {
            backend: self.clone(),
            token: Mutex::new(access_token),
            events,
        })
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        self.check_available()
    }
}

pub(crate) struct MemoryClient {
    backend: MemoryBackend,
    token: Mutex<Option<SecretString>>,
    events: broadcast::Sender<AuthEvent>,
}

impl MemoryClient {
    fn token(&self) -> MutexGuard<'_, Option<SecretString>> {
        self.token.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl IdentityProvider for MemoryClient {
    async fn get_session(&self) -> Result<Option<Session>, ProviderError> {
        self.backend.check_available()?;
        let Some(token) = self.token().clone() else {
            return Ok(None);
        };
        let subject = self
            .backend
            .store()
            .sessions
            .get(token.expose_secret())
            .cloned();
        match subject {
            Some(subject) => Ok(Some(Session {
                subject,
                access_token: token,
            })),
            None => {
                *self.token() = None;
                let _ = self.events.send(AuthEvent::SignedOut);
                Ok(None)
            }
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, AuthError> {
        self.backend.check_available()?;
        let accepted = self
            .backend
            .store()
            .users
            .get(email)
            .is_some_and(|(_, stored)| stored == password.expose_secret());
        if !accepted {
            return Err(AuthError::rejected("Invalid login credentials"));
        }
        let token = self
            .backend
            .issue(email)
            .ok_or_else(|| AuthError::rejected("Invalid login credentials"))?;
        let subject = self
            .backend
            .store()
            .sessions
            .get(&token)
            .cloned()
            .ok_or_else(|| AuthError::rejected("Invalid login credentials"))?;
        let session = Session {
            subject,
            access_token: SecretString::from(token),
        };
        *self.token() = Some(session.access_token.clone());
        let _ = self.events.send(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<(), AuthError> {
        self.backend.check_available()?;
        // Reserved TLDs stand in for addresses the provider refuses to deliver to.
        let domain = email.rsplit_once('@').map(|(_, domain)| domain);
        if domain.map_or(true, |domain| domain.ends_with(".test") || domain.ends_with(".invalid")) {
            return Err(AuthError::rejected(
                "Unable to validate email address: invalid format",
            ));
        }
        if self.backend.is_registered(email) {
            return Err(AuthError::rejected("User already registered"));
        }
        self.backend.store().users.insert(
            email.to_string(),
            (Ulid::new().to_string(), password.expose_secret().to_string()),
        );
        Ok(())
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let token = self.token().take();
        let result = self.backend.check_available();
        if let (Some(token), Ok(())) = (&token, &result) {
            self.backend.revoke(token.expose_secret());
        }
        let _ = self.events.send(AuthEvent::SignedOut);
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

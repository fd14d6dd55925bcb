//! Client-side session context.
//!
//! One [`SessionContext`] exists per client (browser tab, shell instance). It
//! publishes `(user, loading)` through a `watch` channel so component gates
//! can observe it, and it forwards sign-in, sign-up and sign-out to its
//! identity provider handle.
//!
//! Initial load: the context subscribes to the provider's session events
//! *before* asking for an existing session. Every applied change bumps a
//! revision; when the initial fetch resolves it only sets `user` if the
//! revision is unchanged, so an event that arrived in the meantime (e.g. an
//! external sign-out) is never overwritten by the stale fetch result.
//! `loading` becomes false in every case, including a failed fetch.

use crate::identity::{AuthError, AuthEvent, IdentityProvider, Subject};
use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::Arc;
use tokio::{
    sync::{
        broadcast::{self, error::RecvError},
        watch,
    },
    task::JoinHandle,
};
use tracing::{debug, warn};

/// Snapshot published to observers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<Subject>,
    pub loading: bool,
    revision: u64,
}

impl SessionState {
    /// State before the initial load has completed.
    #[must_use]
    pub fn loading() -> Self {
        Self {
            user: None,
            loading: true,
            revision: 0,
        }
    }

    /// State with a known session outcome.
    #[must_use]
    pub fn resolved(user: Option<Subject>) -> Self {
        Self {
            user,
            loading: false,
            revision: 0,
        }
    }

    fn set_user(&mut self, user: Option<Subject>) {
        self.user = user;
        self.revision += 1;
    }
}

/// Operations the sign-in and sign-up forms need.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<(), AuthError>;

    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<(), AuthError>;
}

pub struct SessionContext {
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<SessionState>>,
    listener: JoinHandle<()>,
}

impl SessionContext {
    /// Start the context: `loading` is true until the provider answered.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn activate(provider: Arc<dyn IdentityProvider>) -> Self {
        let (state, _) = watch::channel(SessionState::loading());
        let state = Arc::new(state);

        // Subscribe before fetching so no event can slip between the two.
        let events = provider.subscribe();
        let start_revision = state.borrow().revision;
        let listener = tokio::spawn(listen(
            provider.clone(),
            state.clone(),
            events,
            start_revision,
        ));

        Self {
            provider,
            state,
            listener,
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<Subject> {
        self.state.borrow().user.clone()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Observe state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Wait until the initial load has completed.
    pub async fn loaded(&self) {
        let mut rx = self.subscribe();
        // The sender lives as long as `self`, so this cannot fail while borrowed.
        let _ = rx.wait_for(|state| !state.loading).await;
    }

    /// Authenticate with email and password. State is unchanged on error.
    ///
    /// # Errors
    /// Returns the provider's rejection or failure.
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<(), AuthError> {
        let session = self.provider.sign_in_with_password(email, password).await?;
        self.state
            .send_modify(|state| state.set_user(Some(session.subject)));
        Ok(())
    }

    /// Register a new subject; the local session is untouched.
    ///
    /// # Errors
    /// Returns the provider's rejection or failure.
    pub async fn sign_up(&self, email: &str, password: &SecretString) -> Result<(), AuthError> {
        self.provider.sign_up(email, password).await
    }

    /// Invalidate the session at the provider, then clear local state.
    pub async fn sign_out(&self) {
        if let Err(err) = self.provider.sign_out().await {
            warn!("Sign-out at identity provider failed: {err}");
        }
        self.state.send_modify(|state| state.set_user(None));
    }
}

impl Drop for SessionContext {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[async_trait]
impl Authenticator for SessionContext {
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<(), AuthError> {
        SessionContext::sign_in(self, email, password).await
    }

    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<(), AuthError> {
        SessionContext::sign_up(self, email, password).await
    }
}

fn apply_event(state: &watch::Sender<SessionState>, event: &AuthEvent) {
    let user = event.session().map(|session| session.subject.clone());
    state.send_modify(|state| state.set_user(user));
}

async fn listen(
    provider: Arc<dyn IdentityProvider>,
    state: Arc<watch::Sender<SessionState>>,
    mut events: broadcast::Receiver<AuthEvent>,
    start_revision: u64,
) {
    let fetch = provider.get_session();
    tokio::pin!(fetch);

    // Apply events while the initial fetch is in flight.
    let fetched = loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Ok(event) => apply_event(&state, &event),
                Err(RecvError::Lagged(skipped)) => warn!("Missed {skipped} session events"),
                Err(RecvError::Closed) => break (&mut fetch).await,
            },
            result = &mut fetch => break result,
        }
    };

    let user = match fetched {
        Ok(session) => session.map(|session| session.subject),
        Err(err) => {
            warn!("Initial session fetch failed, treating as signed out: {err}");
            None
        }
    };

    state.send_modify(|state| {
        if state.revision == start_revision {
            state.user = user;
        } else {
            debug!("Discarding initial session fetch, a newer change was applied");
        }
        state.loading = false;
    });

    loop {
        match events.recv().await {
            Ok(event) => apply_event(&state, &event),
            Err(RecvError::Lagged(skipped)) => warn!("Missed {skipped} session events"),
            Err(RecvError::Closed) => break,
        }
    }
}

//! Sign-in, sign-up and sign-out over HTML forms.
//!
//! The forms run the same validation and error localization as on the client.
//! A successful sign-in stores the issued access token in the session cookie,
//! which is what the request gate checks on every later request.

use super::pages::{render_gated, SignInPage, SignUpPage};
use crate::{
    client::{
        messages::UNEXPECTED_ERROR, FormStatus, SignInForm, SignInValues, SignUpForm,
        SignUpValues, SubmitOutcome,
    },
    gate::{with_auth, GateOptions, RequestSession, SIGN_IN_PATH},
    identity::{AuthError, IdentityProvider, Session},
    session::Authenticator,
    web::{clear_session_cookie, session_cookie, session_token, views, AppState},
};
use async_trait::async_trait;
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use secrecy::SecretString;
use serde::Deserialize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{error, info, warn};

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct SignInInput {
    email: String,
    password: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct SignUpInput {
    email: String,
    password: String,
    confirm_password: String,
}

/// Authenticator for one request that keeps the issued session so the
/// handler can turn it into a cookie.
struct RequestAuthenticator {
    provider: Arc<dyn IdentityProvider>,
    session: Mutex<Option<Session>>,
}

impl RequestAuthenticator {
    fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            provider,
            session: Mutex::new(None),
        }
    }

    fn take_session(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

#[async_trait]
impl Authenticator for RequestAuthenticator {
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<(), AuthError> {
        let session = self.provider.sign_in_with_password(email, password).await?;
        *self.session.lock().unwrap_or_else(PoisonError::into_inner) = Some(session);
        Ok(())
    }

    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<(), AuthError> {
        self.provider.sign_up(email, password).await
    }
}

pub async fn sign_in_page(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
) -> Response {
    let gate = with_auth(
        SignInPage {
            theme: state.theme().clone(),
        },
        GateOptions::guest_only(),
    );
    render_gated(&gate, session.as_ref(), &FormStatus::default())
}

pub async fn sign_up_page(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
) -> Response {
    let gate = with_auth(
        SignUpPage {
            theme: state.theme().clone(),
        },
        GateOptions::guest_only(),
    );
    render_gated(&gate, session.as_ref(), &FormStatus::default())
}

pub async fn sign_in(State(state): State<AppState>, Form(input): Form<SignInInput>) -> Response {
    let values = SignInValues {
        email: input.email,
        password: SecretString::from(input.password),
    };
    let auth = RequestAuthenticator::new(state.backend().connect(None));
    let form = SignInForm::new();
    let outcome = form.submit(&auth, &values).await;

    let mut status = form.status();
    if let (SubmitOutcome::Navigate { to, .. }, Some(session)) = (&outcome, auth.take_session()) {
        match session_cookie(state.config(), &session.access_token) {
            Ok(cookie) => {
                info!("Signed in subject {}", session.subject.id);
                return ([(SET_COOKIE, cookie)], Redirect::to(to)).into_response();
            }
            Err(err) => {
                error!("Failed to build session cookie: {}", err);
                status.error = Some(UNEXPECTED_ERROR.to_string());
            }
        }
    }

    Html(views::sign_in(state.theme(), &status)).into_response()
}

pub async fn sign_up(
    State(state): State<AppState>,
    Form(input): Form<SignUpInput>,
) -> Html<String> {
    let values = SignUpValues {
        email: input.email,
        password: SecretString::from(input.password),
        confirm_password: SecretString::from(input.confirm_password),
    };
    let auth = RequestAuthenticator::new(state.backend().connect(None));
    let form = SignUpForm::new();

    let redirect_after = match form.submit(&auth, &values).await {
        SubmitOutcome::NavigateAfter { delay, .. } => Some(delay),
        _ => None,
    };

    Html(views::sign_up(state.theme(), &form.status(), redirect_after))
}

pub async fn sign_out(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if let Err(err) = state.backend().connect(Some(token)).sign_out().await {
            warn!("Sign-out at identity provider failed: {}", err);
        }
    }

    let redirect = Redirect::to(SIGN_IN_PATH);
    match clear_session_cookie(state.config()) {
        Ok(cookie) => ([(SET_COOKIE, cookie)], redirect).into_response(),
        Err(err) => {
            error!("Failed to build session cookie: {}", err);
            redirect.into_response()
        }
    }
}

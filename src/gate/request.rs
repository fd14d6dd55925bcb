//! Request gate: runs once per incoming request, before any handler.
//!
//! The session check is made fresh for every request from the session cookie;
//! nothing is reused from a client-side session context. A redirect issued
//! here replaces the whole response.

use super::{is_gated, Decision, RouteClass, RouteTable, ROOT_PATH, SIGN_IN_PATH};
use crate::{identity::Session, web::AppState};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::LOCATION, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::convert::Infallible;
use tracing::{debug, error};
use url::form_urlencoded;

/// Query parameter carrying the originally requested path.
pub const REDIRECT_PARAM: &str = "redirect";

/// Result of the per-request session presence check.
#[derive(Clone, Debug)]
pub enum SessionCheck {
    Present(Session),
    Absent,
    /// The provider could not be asked.
    Failed,
}

impl SessionCheck {
    #[must_use]
    pub fn into_session(self) -> Option<Session> {
        match self {
            Self::Present(session) => Some(session),
            Self::Absent | Self::Failed => None,
        }
    }
}

/// Session observed by the request gate, attached to the request for handlers.
///
/// Missing when the gate did not run (ungated paths); extraction then yields
/// no session.
#[derive(Clone, Debug, Default)]
pub struct RequestSession(pub Option<Session>);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for RequestSession {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.extensions.get::<Self>().cloned().unwrap_or_default())
    }
}

/// Sign-in location carrying `path` as the return target.
#[must_use]
pub fn sign_in_redirect(path: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(REDIRECT_PARAM, path)
        .finish();
    format!("{SIGN_IN_PATH}?{query}")
}

/// Gate decision for `path` given this request's session check.
///
/// A failed check fails open: the provider being down must not lock out all
/// traffic. Protected pages still render through the component gate, which
/// treats the failure as no session.
#[must_use]
pub fn decide(routes: &RouteTable, path: &str, check: &SessionCheck) -> Decision {
    match (routes.classify(path), check) {
        (_, SessionCheck::Failed) => Decision::Allow,
        (RouteClass::Protected, SessionCheck::Absent) => {
            Decision::RedirectTo(sign_in_redirect(path))
        }
        (RouteClass::AuthOnly, SessionCheck::Present(_)) => {
            Decision::RedirectTo(ROOT_PATH.to_string())
        }
        _ => Decision::Allow,
    }
}

/// `302 Found` to `target`.
pub(crate) fn found(target: &str) -> Response {
    (StatusCode::FOUND, [(LOCATION, target.to_string())]).into_response()
}

/// axum middleware wrapping every route.
pub async fn request_gate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    if !is_gated(&path) {
        return next.run(request).await;
    }

    let check = match crate::web::session_token(request.headers()) {
        None => SessionCheck::Absent,
        Some(token) => match state.backend().connect(Some(token)).get_session().await {
            Ok(Some(session)) => SessionCheck::Present(session),
            Ok(None) => SessionCheck::Absent,
            Err(err) => {
                error!("Session check failed, letting request through: {err}");
                SessionCheck::Failed
            }
        },
    };

    if let Decision::RedirectTo(target) = decide(state.routes(), &path, &check) {
        debug!("Redirecting {path} to {target}");
        return found(&target);
    }

    request
        .extensions_mut()
        .insert(RequestSession(check.into_session()));
    next.run(request).await
}

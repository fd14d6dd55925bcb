//! Pages rendered through the component gate.
//!
//! On the server the session outcome is already known when a handler runs, so
//! the gate sees a resolved state. It still matters after a failed session
//! check: the request gate lets the request through and the component gate
//! turns the missing session into a redirect.

use crate::{
    client::{FormStatus, Theme},
    gate::{
        request::found, with_auth, GateOptions, Page, RequestSession, View, WithAuth,
        SIGN_IN_PATH,
    },
    identity::{Session, Subject},
    session::SessionState,
    web::{views, AppState},
};
use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

pub(crate) struct DashboardPage {
    theme: Theme,
}

impl Page for DashboardPage {
    type Props = Subject;
    type Output = String;

    fn render(&self, user: &Subject) -> String {
        views::dashboard(&self.theme, user)
    }
}

pub(crate) struct SignInPage {
    pub(crate) theme: Theme,
}

impl Page for SignInPage {
    type Props = FormStatus;
    type Output = String;

    fn render(&self, status: &FormStatus) -> String {
        views::sign_in(&self.theme, status)
    }
}

pub(crate) struct SignUpPage {
    pub(crate) theme: Theme,
}

impl Page for SignUpPage {
    type Props = FormStatus;
    type Output = String;

    fn render(&self, status: &FormStatus) -> String {
        views::sign_up(&self.theme, status, None)
    }
}

/// Render `gate` for the request's session; a pending redirect becomes a 302.
pub(crate) fn render_gated<P>(
    gate: &WithAuth<P>,
    session: Option<&Session>,
    props: &P::Props,
) -> Response
where
    P: Page<Output = String>,
{
    let state = SessionState::resolved(session.map(|session| session.subject.clone()));
    match gate.render(&state, props) {
        View::Page(html) => Html(html).into_response(),
        View::Empty | View::Loading => redirect_for(gate, &state),
    }
}

fn redirect_for<P: Page>(gate: &WithAuth<P>, state: &SessionState) -> Response {
    found(gate.decide(state).redirect_target().unwrap_or(SIGN_IN_PATH))
}

pub async fn home(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
) -> Html<String> {
    Html(views::home(
        state.theme(),
        session.as_ref().map(|session| &session.subject),
    ))
}

pub async fn dashboard(
    State(state): State<AppState>,
    RequestSession(session): RequestSession,
) -> Response {
    let gate = with_auth(
        DashboardPage {
            theme: state.theme().clone(),
        },
        GateOptions::default(),
    );
    match &session {
        Some(current) => render_gated(&gate, Some(current), &current.subject),
        None => redirect_for(&gate, &SessionState::resolved(None)),
    }
}

pub async fn not_found(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(views::not_found(state.theme())))
}

//! Component gate: wraps a page and decides, from the session context state,
//! whether to show a loading placeholder, nothing (while navigating away) or
//! the page itself.
//!
//! Navigation is a side effect issued through a [`Navigator`], never a render
//! result: while a redirect is pending `render` returns [`View::Empty`], so
//! protected content is never flashed.

use super::{Decision, ROOT_PATH, SIGN_IN_PATH};
use crate::session::{SessionContext, SessionState};
use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle};
use tracing::debug;

/// Client-side navigation.
pub trait Navigator: Send + Sync {
    fn push(&self, path: &str);

    /// Re-fetch server-rendered data for the current route.
    fn refresh(&self) {}
}

/// A renderable page.
pub trait Page {
    type Props;
    type Output;

    fn render(&self, props: &Self::Props) -> Self::Output;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GateOptions {
    pub redirect_to: String,
    pub require_auth: bool,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            redirect_to: SIGN_IN_PATH.to_string(),
            require_auth: true,
        }
    }
}

impl GateOptions {
    /// Pages for visitors without a session (sign-in, sign-up).
    #[must_use]
    pub fn guest_only() -> Self {
        Self {
            require_auth: false,
            ..Self::default()
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum View<T> {
    /// Session still loading.
    Loading,
    /// Redirect pending.
    Empty,
    Page(T),
}

fn decide(options: &GateOptions, state: &SessionState) -> Decision {
    if state.loading {
        return Decision::Pending;
    }
    match (options.require_auth, state.user.is_some()) {
        (true, false) => Decision::RedirectTo(options.redirect_to.clone()),
        (false, true) => Decision::RedirectTo(ROOT_PATH.to_string()),
        _ => Decision::Allow,
    }
}

/// A page wrapped by the component gate.
pub struct WithAuth<P> {
    page: P,
    options: GateOptions,
}

/// Wrap `page` with the component gate.
pub fn with_auth<P: Page>(page: P, options: GateOptions) -> WithAuth<P> {
    WithAuth { page, options }
}

impl<P: Page> WithAuth<P> {
    #[must_use]
    pub fn decide(&self, state: &SessionState) -> Decision {
        decide(&self.options, state)
    }

    /// Render for `state`; props reach the page unchanged.
    pub fn render(&self, state: &SessionState, props: &P::Props) -> View<P::Output> {
        match self.decide(state) {
            Decision::Pending => View::Loading,
            Decision::RedirectTo(_) => View::Empty,
            Decision::Allow => View::Page(self.page.render(props)),
        }
    }

    /// Mount against a session context: every state change re-runs the
    /// decision and navigates once per transition into a redirect.
    pub fn mount(
        self: Arc<Self>,
        session: &SessionContext,
        navigator: Arc<dyn Navigator>,
    ) -> MountedPage<P> {
        let state = session.subscribe();
        let effect = tokio::spawn(navigate_on_change(
            self.options.clone(),
            state.clone(),
            navigator,
        ));
        MountedPage {
            gate: self,
            state,
            effect,
        }
    }
}

async fn navigate_on_change(
    options: GateOptions,
    mut state: watch::Receiver<SessionState>,
    navigator: Arc<dyn Navigator>,
) {
    let mut last: Option<Decision> = None;
    loop {
        let decision = decide(&options, &state.borrow_and_update());
        if let Decision::RedirectTo(target) = &decision {
            if last.as_ref() != Some(&decision) {
                debug!("Component gate navigating to {target}");
                navigator.push(target);
            }
        }
        last = Some(decision);

        if state.changed().await.is_err() {
            break;
        }
    }
}

/// A gated page attached to a session context. Dropping it unmounts the page.
pub struct MountedPage<P> {
    gate: Arc<WithAuth<P>>,
    state: watch::Receiver<SessionState>,
    effect: JoinHandle<()>,
}

impl<P: Page> MountedPage<P> {
    pub fn render(&self, props: &P::Props) -> View<P::Output> {
        let state = self.state.borrow().clone();
        self.gate.render(&state, props)
    }
}

impl<P> Drop for MountedPage<P> {
    fn drop(&mut self) {
        self.effect.abort();
    }
}

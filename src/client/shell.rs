//! Provider composition for one client.
//!
//! A [`Shell`] owns the theme, exactly one [`SessionContext`] and the
//! navigator. Guarded pages are mounted through it so they observe that
//! context. Dropping the shell tears the context down.

use super::forms::SubmitOutcome;
use crate::{
    gate::{MountedPage, Navigator, Page, WithAuth, SIGN_IN_PATH},
    identity::IdentityProvider,
    session::SessionContext,
};
use std::sync::Arc;
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Theme {
    pub primary_color: &'static str,
    pub font_family: &'static str,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_color: "blue",
            font_family: "var(--font-geist-sans)",
        }
    }
}

pub struct Shell {
    theme: Theme,
    session: SessionContext,
    navigator: Arc<dyn Navigator>,
}

impl Shell {
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn new(provider: Arc<dyn IdentityProvider>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            theme: Theme::default(),
            session: SessionContext::activate(provider),
            navigator,
        }
    }

    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn mount<P: Page>(&self, page: Arc<WithAuth<P>>) -> MountedPage<P> {
        page.mount(&self.session, self.navigator.clone())
    }

    /// Apply a form outcome. Delayed navigation runs in the background.
    pub fn follow(&self, outcome: &SubmitOutcome) {
        match outcome {
            SubmitOutcome::Invalid | SubmitOutcome::Failed => {}
            SubmitOutcome::Navigate { to, refresh } => {
                self.navigator.push(to);
                if *refresh {
                    self.navigator.refresh();
                }
            }
            SubmitOutcome::NavigateAfter { to, delay } => {
                let navigator = self.navigator.clone();
                let to = to.clone();
                let delay = *delay;
                debug!("Navigating to {to} in {delay:?}");
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    navigator.push(&to);
                });
            }
        }
    }

    /// Sign out, then go to the sign-in page.
    pub async fn sign_out(&self) {
        self.session.sign_out().await;
        self.navigator.push(SIGN_IN_PATH);
    }
}

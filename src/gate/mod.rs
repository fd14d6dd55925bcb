//! Session gates.
//!
//! Both gates produce a [`Decision`] from a [`RouteClass`] (or explicit page
//! options) and the session presence they observed. Decisions are never
//! stored; they are recomputed per request or per session change.

pub mod component;
pub mod request;
mod routes;

pub use component::{with_auth, GateOptions, MountedPage, Navigator, Page, View, WithAuth};
pub use request::{RequestSession, SessionCheck};
pub use routes::{is_gated, RouteClass, RouteTable, ROOT_PATH, SIGN_IN_PATH, SIGN_UP_PATH};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectTo(String),
    /// Session state not known yet; only valid before the initial load completes.
    Pending,
}

impl Decision {
    #[must_use]
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::RedirectTo(target) => Some(target),
            Self::Allow | Self::Pending => None,
        }
    }
}

//! # Linkery (session-gated web front)
//!
//! `linkery` serves the sign-in, sign-up and dashboard pages of the Linkery
//! application. Credentials, session issuance and token validation are owned
//! by an external GoTrue-compatible identity provider; this crate only decides
//! who may see what.
//!
//! ## Gating layers
//!
//! Access is decided twice, on purpose:
//!
//! - **Request gate** (`gate::request`): axum middleware that runs once per
//!   request, performs a fresh session check against the provider and either
//!   passes the request through or replaces the response with a redirect.
//! - **Component gate** (`gate::component`): wraps a page and decides between
//!   a loading placeholder, a redirect and the page itself from the state
//!   published by a [`session::SessionContext`]. Mounted gates re-evaluate on
//!   every session change.
//!
//! Both layers classify paths with the same [`gate::RouteTable`].
//!
//! ## Failure policy
//!
//! When the provider cannot be reached the request gate fails open (the page
//! handlers still render through the component gate, which treats the failure
//! as "no session").

pub mod cli;
pub mod client;
pub mod gate;
pub mod identity;
pub mod session;
pub mod web;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}

use crate::cli::{
    actions::{server::Args, Action},
    commands::{self, identity},
    globals::GlobalArgs,
};
use anyhow::{Context, Result};
use secrecy::SecretString;

/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches
        .get_one::<u16>(commands::ARG_PORT)
        .copied()
        .unwrap_or(8080);
    let public_url = matches
        .get_one::<String>(commands::ARG_PUBLIC_URL)
        .cloned()
        .context("missing required argument: --public-url")?;
    let session_ttl_seconds = matches
        .get_one::<u64>(commands::ARG_SESSION_TTL_SECONDS)
        .copied()
        .unwrap_or(604_800);

    let identity_url = matches
        .get_one::<String>(identity::ARG_IDENTITY_URL)
        .cloned()
        .context("missing required argument: --identity-url")?;
    let identity_api_key = matches
        .get_one::<String>(identity::ARG_IDENTITY_API_KEY)
        .cloned()
        .context("missing required argument: --identity-api-key")?;

    let mut globals = GlobalArgs::new(identity_url);
    globals.set_api_key(SecretString::from(identity_api_key));

    Ok(Action::Server(Args {
        port,
        public_url,
        session_ttl_seconds,
        globals,
    }))
}

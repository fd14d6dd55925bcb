use crate::{
    cli::{globals::GlobalArgs, telemetry},
    identity::{gotrue::GoTrueBackend, IdentityBackend},
    web::{self, AppState, WebConfig},
};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub public_url: String,
    pub session_ttl_seconds: u64,
    pub globals: GlobalArgs,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the configuration is invalid or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    info!(
        "Starting server on port {} (public URL: {}, identity provider: {})",
        args.port, args.public_url, args.globals.identity_url
    );

    let backend = GoTrueBackend::new(
        &args.globals.identity_url,
        args.globals.identity_api_key.clone(),
    )
    .context("Invalid identity provider configuration")?;

    // Not fatal: the request gate fails open while the provider is down.
    if let Err(err) = backend.ping().await {
        warn!("Identity provider is not reachable yet: {}", err);
    }

    let config = WebConfig::new(&args.public_url, args.session_ttl_seconds)?;
    let state = AppState::new(Arc::new(backend), config);

    let result = web::new(args.port, state).await;

    telemetry::shutdown_tracer();

    result
}

//! HTTP surface: server-rendered pages behind the request gate.

use crate::{
    client::Theme,
    gate::{request::request_gate, RouteTable},
    identity::IdentityBackend,
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{InvalidHeaderValue, AUTHORIZATION, COOKIE},
        HeaderMap, HeaderName, HeaderValue, Request,
    },
    middleware,
    routing::{get, post},
    Router,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, info_span, Span};
use ulid::Ulid;
use url::Url;

mod handlers;
mod views;


pub const SESSION_COOKIE_NAME: &str = "linkery_session";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone, Debug)]
pub struct WebConfig {
    cookie_secure: bool,
    session_ttl_seconds: u64,
}

impl WebConfig {
    /// # Errors
    /// Returns an error if `public_url` is not an absolute URL.
    pub fn new(public_url: &str, session_ttl_seconds: u64) -> Result<Self> {
        let url = Url::parse(public_url)
            .with_context(|| format!("Invalid public URL: {public_url}"))?;
        Ok(Self {
            // Only mark cookies secure when the site is served over HTTPS.
            cookie_secure: url.scheme() == "https",
            session_ttl_seconds,
        })
    }

    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure
    }

    #[must_use]
    pub fn session_ttl_seconds(&self) -> u64 {
        self.session_ttl_seconds
    }
}

/// Shared by every handler and by the request gate.
#[derive(Clone)]
pub struct AppState {
    backend: Arc<dyn IdentityBackend>,
    routes: Arc<RouteTable>,
    config: WebConfig,
    theme: Theme,
}

impl AppState {
    #[must_use]
    pub fn new(backend: Arc<dyn IdentityBackend>, config: WebConfig) -> Self {
        Self {
            backend,
            routes: Arc::new(RouteTable::default()),
            config,
            theme: Theme::default(),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn IdentityBackend> {
        &self.backend
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[must_use]
    pub fn config(&self) -> &WebConfig {
        &self.config
    }

    #[must_use]
    pub fn theme(&self) -> &Theme {
        &self.theme
    }
}

/// Session token from the session cookie, or a bearer token.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<SecretString> {
    if let Some(token) = bearer_token(headers) {
        return Some(token);
    }
    let value = headers.get(COOKIE)?.to_str().ok()?;
    value.split(';').find_map(|pair| {
        let (key, val) = pair.trim().split_once('=')?;
        (key.trim() == SESSION_COOKIE_NAME && !val.trim().is_empty())
            .then(|| SecretString::from(val.trim().to_string()))
    })
}

fn bearer_token(headers: &HeaderMap) -> Option<SecretString> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(SecretString::from(token.to_string()))
    }
}

pub(crate) fn session_cookie(
    config: &WebConfig,
    token: &SecretString,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        token.expose_secret(),
        config.session_ttl_seconds()
    );
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn clear_session_cookie(config: &WebConfig) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Build the application router. The request gate wraps every route and the
/// fallback.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::pages::home))
        .route("/dashboard", get(handlers::pages::dashboard))
        .route(
            "/auth/signin",
            get(handlers::auth::sign_in_page).post(handlers::auth::sign_in),
        )
        .route(
            "/auth/signup",
            get(handlers::auth::sign_up_page).post(handlers::auth::sign_up),
        )
        .route("/auth/signout", post(handlers::auth::sign_out))
        .route("/health", get(handlers::health::health))
        .fallback(handlers::pages::not_found)
        .layer(middleware::from_fn_with_state(state.clone(), request_gate))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID_HEADER),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID_HEADER,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span)),
        )
        .with_state(state)
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, state: AppState) -> Result<()> {
    let app = router(state);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Gracefully shutdown"),
                Err(err) => {
                    error!("Failed to listen for shutdown signal: {err}");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}

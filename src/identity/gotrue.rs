//! GoTrue-compatible identity provider over HTTP.
//!
//! Only the password grant, sign-up, logout, user lookup and health endpoints
//! are used. Every request carries the project `apikey` header; user-scoped
//! requests add the access token as a bearer token. Tokens are never logged.

use super::{
    AuthError, AuthEvent, IdentityBackend, IdentityProvider, ProviderError, Session, Subject,
    EVENT_CHANNEL_CAPACITY,
};
use crate::APP_USER_AGENT;
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::{sync::Arc, time::Duration};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, instrument, warn};
use url::Url;

const REQUEST_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug)]
struct Endpoint {
    client: Client,
    base_url: Url,
    api_key: SecretString,
}

impl Endpoint {
    fn url(&self, path: &str) -> Result<Url, ProviderError> {
        Ok(self.base_url.join(path)?)
    }

    fn post(&self, url: Url) -> reqwest::RequestBuilder {
        self.client
            .post(url)
            .header("apikey", self.api_key.expose_secret())
    }

    fn get(&self, url: Url) -> reqwest::RequestBuilder {
        self.client
            .get(url)
            .header("apikey", self.api_key.expose_secret())
    }
}

/// Backend pointing at one GoTrue deployment.
#[derive(Clone, Debug)]
pub struct GoTrueBackend {
    endpoint: Arc<Endpoint>,
}

impl GoTrueBackend {
    /// Build a backend for `base_url` (e.g. `https://project.supabase.co`).
    ///
    /// # Errors
    /// Returns an error if the URL is invalid or the HTTP client cannot be built.
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self, ProviderError> {
        let mut base_url = Url::parse(base_url)?;
        // `Url::join` drops the last segment unless the base ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .build()?;

        Ok(Self {
            endpoint: Arc::new(Endpoint {
                client,
                base_url,
                api_key,
            }),
        })
    }
}

#[async_trait]
impl IdentityBackend for GoTrueBackend {
    fn connect(&self, access_token: Option<SecretString>) -> Arc<dyn IdentityProvider> {
        Arc::new(GoTrueClient::new(self.endpoint.clone(), access_token))
    }

    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), ProviderError> {
        let response = self
            .endpoint
            .get(self.endpoint.url("auth/v1/health")?)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::Status(response.status().as_u16()))
        }
    }
}

/// Client handle holding at most one access token.
pub struct GoTrueClient {
    endpoint: Arc<Endpoint>,
    token: RwLock<Option<SecretString>>,
    events: broadcast::Sender<AuthEvent>,
}

impl GoTrueClient {
    fn new(endpoint: Arc<Endpoint>, token: Option<SecretString>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            endpoint,
            token: RwLock::new(token),
            events,
        }
    }

    fn emit(&self, event: AuthEvent) {
        // No subscribers is fine; nobody is listening yet.
        let _ = self.events.send(event);
    }
}

#[derive(Deserialize)]
struct UserBody {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl From<UserBody> for Subject {
    fn from(user: UserBody) -> Self {
        Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct TokenBody {
    access_token: String,
    user: UserBody,
}

/// GoTrue reports errors under different keys depending on the endpoint and
/// version.
#[derive(Deserialize, Default)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> String {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
            .unwrap_or_default()
    }
}

/// Map a non-success response to an [`AuthError`]: client errors are
/// rejections, anything else is an infrastructure failure.
async fn rejection(response: Response) -> AuthError {
    let status = response.status();
    if status.is_client_error() {
        let body = response.json::<ErrorBody>().await.unwrap_or_default();
        AuthError::rejected(body.into_message())
    } else {
        AuthError::Provider(ProviderError::Status(status.as_u16()))
    }
}

#[async_trait]
impl IdentityProvider for GoTrueClient {
    #[instrument(skip(self))]
    async fn get_session(&self) -> Result<Option<Session>, ProviderError> {
        let Some(token) = self.token.read().await.clone() else {
            return Ok(None);
        };

        let response = self
            .endpoint
            .get(self.endpoint.url("auth/v1/user")?)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {
                let user: UserBody = response.json().await?;
                Ok(Some(Session {
                    subject: user.into(),
                    access_token: token,
                }))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                debug!("access token no longer accepted");
                *self.token.write().await = None;
                self.emit(AuthEvent::SignedOut);
                Ok(None)
            }
            status => Err(ProviderError::Status(status.as_u16())),
        }
    }

    #[instrument(skip(self, password))]
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, AuthError> {
        let mut url = self.endpoint.url("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .endpoint
            .post(url)
            .json(&json!({
                "email": email,
                "password": password.expose_secret(),
            }))
            .send()
            .await
            .map_err(ProviderError::from)?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body: TokenBody = response.json().await.map_err(ProviderError::from)?;
        let session = Session {
            subject: body.user.into(),
            access_token: SecretString::from(body.access_token),
        };

        *self.token.write().await = Some(session.access_token.clone());
        self.emit(AuthEvent::SignedIn(session.clone()));

        Ok(session)
    }

    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &SecretString) -> Result<(), AuthError> {
        let response = self
            .endpoint
            .post(self.endpoint.url("auth/v1/signup")?)
            .json(&json!({
                "email": email,
                "password": password.expose_secret(),
            }))
            .send()
            .await
            .map_err(ProviderError::from)?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(rejection(response).await)
        }
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), ProviderError> {
        let token = self.token.write().await.take();

        let result = match token {
            Some(token) => {
                let response = self
                    .endpoint
                    .post(self.endpoint.url("auth/v1/logout")?)
                    .bearer_auth(token.expose_secret())
                    .send()
                    .await;
                match response {
                    Ok(response)
                        if response.status().is_success()
                            || response.status() == StatusCode::UNAUTHORIZED
                            || response.status() == StatusCode::NOT_FOUND =>
                    {
                        Ok(())
                    }
                    Ok(response) => Err(ProviderError::Status(response.status().as_u16())),
                    Err(err) => Err(err.into()),
                }
            }
            None => Ok(()),
        };

        if let Err(err) = &result {
            warn!("Provider logout failed, local session dropped anyway: {err}");
        }

        // Local state is gone either way.
        self.emit(AuthEvent::SignedOut);
        result
    }

    fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

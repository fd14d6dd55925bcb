//! Sign-in and sign-up forms.
//!
//! A form validates its values locally, and only valid values reach the
//! [`Authenticator`]. The observable status (echoed email, loading flag, error
//! and success banners, per-field errors) lives in a `watch` channel so a view
//! can re-render on every change. Passwords are never echoed back.

use super::messages::{
    localize, CONFIRM_MISMATCH, CONFIRM_REQUIRED, EMAIL_INCOMPLETE, EMAIL_INVALID,
    EMAIL_REQUIRED, EMAIL_TOO_SHORT, PASSWORD_NEEDS_DIGIT, PASSWORD_NEEDS_LETTER,
    PASSWORD_REQUIRED, PASSWORD_TOO_SHORT, SIGN_IN_FAILED, SIGN_UP_FAILED, UNEXPECTED_ERROR,
};
use crate::{
    gate::{ROOT_PATH, SIGN_IN_PATH},
    identity::AuthError,
    session::Authenticator,
};
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tokio::sync::watch;
use tracing::error;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Delay between a successful registration and the move to sign-in.
pub const REGISTERED_REDIRECT_DELAY: Duration = Duration::from_millis(3000);

#[derive(Clone, Debug)]
pub struct SignInValues {
    pub email: String,
    pub password: SecretString,
}

#[derive(Clone, Debug)]
pub struct SignUpValues {
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

/// First failing rule per field.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub email: Option<&'static str>,
    pub password: Option<&'static str>,
    pub confirm_password: Option<&'static str>,
}

impl FieldErrors {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.confirm_password.is_none()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormStatus {
    pub email: String,
    pub loading: bool,
    pub error: Option<String>,
    pub success: bool,
    pub field_errors: FieldErrors,
}

/// What the surrounding shell should do after a submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Validation failed; nothing was sent.
    Invalid,
    /// The provider refused or failed; the error banner is set.
    Failed,
    Navigate { to: String, refresh: bool },
    NavigateAfter { to: String, delay: Duration },
}

fn is_email(value: &str) -> bool {
    Regex::new(r"^\S+@\S+\.\S+$").is_ok_and(|re| re.is_match(value))
}

fn check_email(email: &str) -> Option<&'static str> {
    if email.is_empty() {
        Some(EMAIL_REQUIRED)
    } else if !is_email(email) {
        Some(EMAIL_INVALID)
    } else {
        None
    }
}

fn check_password(password: &str) -> Option<&'static str> {
    if password.is_empty() {
        Some(PASSWORD_REQUIRED)
    } else if password.chars().count() < MIN_PASSWORD_LENGTH {
        Some(PASSWORD_TOO_SHORT)
    } else {
        None
    }
}

#[must_use]
pub fn validate_sign_in(values: &SignInValues) -> FieldErrors {
    FieldErrors {
        email: check_email(&values.email),
        password: check_password(values.password.expose_secret()),
        confirm_password: None,
    }
}

#[must_use]
pub fn validate_sign_up(values: &SignUpValues) -> FieldErrors {
    let email = check_email(&values.email).or_else(|| {
        let mut parts = values.email.split('@');
        let local = parts.next().unwrap_or_default();
        let domain = parts.next().unwrap_or_default();
        if local.chars().count() < 2 {
            Some(EMAIL_TOO_SHORT)
        } else if !domain.contains('.') {
            Some(EMAIL_INCOMPLETE)
        } else {
            None
        }
    });

    let password = values.password.expose_secret();
    let password_error = check_password(password).or_else(|| {
        if !password.chars().any(|c| c.is_ascii_alphabetic()) {
            Some(PASSWORD_NEEDS_LETTER)
        } else if !password.chars().any(|c| c.is_ascii_digit()) {
            Some(PASSWORD_NEEDS_DIGIT)
        } else {
            None
        }
    });

    let confirm = values.confirm_password.expose_secret();
    let confirm_password = if confirm.is_empty() {
        Some(CONFIRM_REQUIRED)
    } else if confirm != password {
        Some(CONFIRM_MISMATCH)
    } else {
        None
    };

    FieldErrors {
        email,
        password: password_error,
        confirm_password,
    }
}

/// Banner text for a failed credential operation.
fn failure_message(err: &AuthError, default: &str, operation: &str) -> String {
    match err {
        AuthError::Rejected { message } => localize(message, default),
        AuthError::Provider(err) => {
            error!("{operation} error: {err}");
            UNEXPECTED_ERROR.to_string()
        }
    }
}

fn new_status() -> watch::Sender<FormStatus> {
    watch::channel(FormStatus::default()).0
}

pub struct SignInForm {
    status: watch::Sender<FormStatus>,
}

impl Default for SignInForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SignInForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: new_status(),
        }
    }

    #[must_use]
    pub fn status(&self) -> FormStatus {
        self.status.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FormStatus> {
        self.status.subscribe()
    }

    pub async fn submit(&self, auth: &dyn Authenticator, values: &SignInValues) -> SubmitOutcome {
        let field_errors = validate_sign_in(values);
        let valid = field_errors.is_empty();
        self.status.send_modify(|status| {
            status.email.clone_from(&values.email);
            status.field_errors = field_errors;
            if valid {
                status.loading = true;
                status.error = None;
            }
        });
        if !valid {
            return SubmitOutcome::Invalid;
        }

        let result = auth.sign_in(&values.email, &values.password).await;

        let mut outcome = SubmitOutcome::Failed;
        self.status.send_modify(|status| {
            status.loading = false;
            match &result {
                Ok(()) => {
                    outcome = SubmitOutcome::Navigate {
                        to: ROOT_PATH.to_string(),
                        refresh: true,
                    };
                }
                Err(err) => status.error = Some(failure_message(err, SIGN_IN_FAILED, "Sign in")),
            }
        });
        outcome
    }
}

pub struct SignUpForm {
    status: watch::Sender<FormStatus>,
}

impl Default for SignUpForm {
    fn default() -> Self {
        Self::new()
    }
}

impl SignUpForm {
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: new_status(),
        }
    }

    #[must_use]
    pub fn status(&self) -> FormStatus {
        self.status.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<FormStatus> {
        self.status.subscribe()
    }

    pub async fn submit(&self, auth: &dyn Authenticator, values: &SignUpValues) -> SubmitOutcome {
        let field_errors = validate_sign_up(values);
        let valid = field_errors.is_empty();
        self.status.send_modify(|status| {
            status.email.clone_from(&values.email);
            status.field_errors = field_errors;
            if valid {
                status.loading = true;
                status.error = None;
                status.success = false;
            }
        });
        if !valid {
            return SubmitOutcome::Invalid;
        }

        let result = auth.sign_up(&values.email, &values.password).await;

        let mut outcome = SubmitOutcome::Failed;
        self.status.send_modify(|status| {
            status.loading = false;
            match &result {
                Ok(()) => {
                    status.success = true;
                    status.email.clear();
                    outcome = SubmitOutcome::NavigateAfter {
                        to: SIGN_IN_PATH.to_string(),
                        delay: REGISTERED_REDIRECT_DELAY,
                    };
                }
                Err(err) => status.error = Some(failure_message(err, SIGN_UP_FAILED, "Sign up")),
            }
        });
        outcome
    }
}

//! Customer authentication.
//!
//! # Responsibilities
//! - Check whether an email has an account
//! - Password login, token refresh, logout
//! - Email verification code sign-up (send, verify, complete)
//! - Detect tokens about to expire
//!
//! Successful login and registration store credentials in the shared
//! [`CredentialStore`], which publishes the current user.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tokio::sync::watch;

use crate::config::SessionConfig;
use crate::http::{ApiClient, ApiError, Envelope, RequestBody, RequestOptions};
use crate::lifecycle::{Countdown, Lifetime};
use crate::session::credentials::{CredentialStore, Credentials, User};
use crate::session::otp::{is_valid_email, password_issues, OtpCode, PasswordIssue};

/// Message the backend sends when an email has no account.
const UNREGISTERED_MESSAGE: &str = "Email no registrado.";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("{}", join_issues(.0))]
    Password(Vec<PasswordIssue>),

    #[error("verification code is incomplete")]
    IncompleteCode,

    #[error("verification code rejected: {0}")]
    InvalidCode(String),

    #[error("a new code can be requested in {0} seconds")]
    ResendTooSoon(u64),

    #[error("no refresh token available")]
    NoRefreshToken,

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("could not store credentials: {0}")]
    Storage(#[from] std::io::Error),
}

fn join_issues(issues: &[PasswordIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result of probing an email address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailStatus {
    /// Continue with password login.
    Registered,
    /// Offer sign-up by verification code.
    Unregistered,
}

/// Authentication service.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    credentials: Arc<CredentialStore>,
    prefix: String,
    config: SessionConfig,
    lifetime: Lifetime,
}

impl AuthService {
    pub fn new(api: ApiClient, prefix: &str, config: SessionConfig, lifetime: Lifetime) -> Self {
        Self {
            credentials: api.credentials().clone(),
            api,
            prefix: prefix.trim_end_matches('/').to_string(),
            config,
            lifetime,
        }
    }

    fn endpoint(&self, name: &str) -> String {
        format!("{}/{}", self.prefix, name)
    }

    async fn post(&self, name: &str, body: Value) -> Result<Envelope<Value>, ApiError> {
        self.api
            .envelope(
                Method::POST,
                &self.endpoint(name),
                &RequestBody::Json(body),
                &RequestOptions::default(),
            )
            .await
    }

    /// Find out whether `email` already has an account.
    pub async fn check_email(&self, email: &str) -> Result<EmailStatus, AuthError> {
        let email = checked_email(email)?;
        match self.post("check-email", json!({ "email": email })).await? {
            Envelope::Success { data, message, .. } => {
                let exists = data
                    .as_ref()
                    .and_then(|d| d.get("exists"))
                    .and_then(Value::as_bool);
                if message == UNREGISTERED_MESSAGE || exists == Some(false) {
                    Ok(EmailStatus::Unregistered)
                } else {
                    Ok(EmailStatus::Registered)
                }
            }
            Envelope::Failure { code, message } => Err(self.rejected("check-email", code, message)),
        }
    }

    /// Log in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = checked_email(email)?;
        let credentials: Credentials = self
            .api
            .call(
                Method::POST,
                &self.endpoint("login"),
                &RequestBody::Json(json!({ "email": email, "password": password })),
                &RequestOptions::default(),
            )
            .await?;
        self.store(credentials)
    }

    /// Email a verification code and start the resend cooldown.
    pub async fn send_code(&self, email: &str) -> Result<Countdown, AuthError> {
        let email = checked_email(email)?;
        match self.post("send-code", json!({ "email": email })).await? {
            Envelope::Success { .. } => {
                tracing::info!(email = %email, "Verification code sent");
                Ok(Countdown::start(self.config.otp_resend_secs, &self.lifetime))
            }
            Envelope::Failure { code, message } => Err(self.rejected("send-code", code, message)),
        }
    }

    /// Send another code once the previous cooldown has run out.
    pub async fn resend_code(&self, email: &str, cooldown: &Countdown) -> Result<Countdown, AuthError> {
        if !cooldown.is_finished() {
            return Err(AuthError::ResendTooSoon(cooldown.remaining()));
        }
        self.send_code(email).await
    }

    /// Check a typed verification code.
    pub async fn verify_code(&self, email: &str, code: &OtpCode) -> Result<(), AuthError> {
        let email = checked_email(email)?;
        let code = code.code().ok_or(AuthError::IncompleteCode)?;
        match self.post("verify-code", json!({ "email": email, "code": code })).await? {
            Envelope::Success { outcome, .. }
                if outcome.as_deref().map_or(true, |o| o == "success") =>
            {
                Ok(())
            }
            Envelope::Success { message, .. } | Envelope::Failure { message, .. } => {
                tracing::info!(email = %email, "Verification code rejected");
                Err(AuthError::InvalidCode(message))
            }
        }
    }

    /// Create the account after a verified code and log in.
    pub async fn complete_registration(
        &self,
        email: &str,
        password: &str,
        confirmation: &str,
        name: Option<&str>,
    ) -> Result<User, AuthError> {
        let email = checked_email(email)?;
        let issues = password_issues(password, confirmation);
        if !issues.is_empty() {
            return Err(AuthError::Password(issues));
        }
        let first_name = name
            .map(str::to_string)
            .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

        let credentials: Credentials = self
            .api
            .call(
                Method::POST,
                &self.endpoint("complete-registration"),
                &RequestBody::Json(json!({
                    "email": email,
                    "password": password,
                    "firstName": first_name,
                })),
                &RequestOptions::default(),
            )
            .await?;
        self.store(credentials)
    }

    /// Exchange the refresh token for new credentials.
    pub async fn refresh(&self) -> Result<User, AuthError> {
        let Some(refresh_token) = self.credentials.refresh_token() else {
            self.credentials.clear();
            return Err(AuthError::NoRefreshToken);
        };
        let credentials: Credentials = self
            .api
            .call(
                Method::POST,
                &self.endpoint("refresh"),
                &RequestBody::Json(json!({ "refresh_token": refresh_token })),
                &RequestOptions::default(),
            )
            .await?;
        self.store(credentials)
    }

    /// End the session locally, then tell the backend without waiting on retries.
    pub async fn logout(&self) {
        self.credentials.clear();
        let result: Result<Envelope<Value>, ApiError> = self
            .api
            .envelope(
                Method::POST,
                &self.endpoint("logout"),
                &RequestBody::Json(json!({})),
                &RequestOptions::new().retries(0),
            )
            .await;
        match result {
            Ok(_) => tracing::info!("Logout successful"),
            Err(e) => tracing::warn!(error = %e, "Logout request failed"),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.credentials.current_user()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_authenticated()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.credentials.subscribe()
    }

    /// True when there is no token or it expires within the configured margin.
    pub fn is_token_expiring_soon(&self) -> bool {
        let Some(token) = self.credentials.token() else {
            return true;
        };
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        token_expires_within(&token, Duration::from_secs(self.config.expiry_margin_secs), now)
    }

    fn store(&self, credentials: Credentials) -> Result<User, AuthError> {
        let user = credentials.customer.clone();
        self.credentials.save(credentials)?;
        tracing::info!(email = %user.email, "Login successful");
        Ok(user)
    }

    fn rejected(&self, name: &str, code: i64, message: String) -> AuthError {
        AuthError::Api(ApiError::rejected(
            code,
            "POST",
            &self.api.build_url(&self.endpoint(name)),
            Some(message),
        ))
    }
}

fn checked_email(email: &str) -> Result<&str, AuthError> {
    let trimmed = email.trim();
    if is_valid_email(trimmed) {
        Ok(trimmed)
    } else {
        Err(AuthError::InvalidEmail(email.to_string()))
    }
}

/// Whether a JWT expires within `margin` of `now_secs`.
///
/// The signature is not verified; only the `exp` claim is read. Tokens that
/// cannot be decoded count as expiring.
pub fn token_expires_within(token: &str, margin: Duration, now_secs: u64) -> bool {
    #[derive(Deserialize)]
    struct Claims {
        exp: Option<u64>,
    }

    let claims = token
        .split('.')
        .nth(1)
        .and_then(|payload| URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok())
        .and_then(|bytes| serde_json::from_slice::<Claims>(&bytes).ok());

    match claims.and_then(|c| c.exp) {
        Some(exp) => exp < now_secs.saturating_add(margin.as_secs()),
        None => {
            tracing::debug!("Could not read token expiry");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with_exp(exp: u64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"u1","exp":{exp}}}"#));
        format!("{header}.{payload}.sig")
    }

    #[test]
    fn test_token_expiry() {
        let margin = Duration::from_secs(300);
        let now = 1_700_000_000;
        assert!(!token_expires_within(&jwt_with_exp(now + 3600), margin, now));
        assert!(token_expires_within(&jwt_with_exp(now + 120), margin, now));
        assert!(token_expires_within(&jwt_with_exp(now - 10), margin, now));
        assert!(token_expires_within("not-a-jwt", margin, now));
    }

    #[test]
    fn test_checked_email() {
        assert_eq!(checked_email(" a@b.co ").unwrap(), "a@b.co");
        assert!(matches!(checked_email("nope"), Err(AuthError::InvalidEmail(_))));
    }

    #[test]
    fn test_password_error_message() {
        let err = AuthError::Password(vec![PasswordIssue::NoDigit, PasswordIssue::Mismatch]);
        assert_eq!(
            err.to_string(),
            "password must contain a digit, passwords do not match"
        );
    }
}

//! Backend API client with timeout, retry and error classification.
//!
//! # Responsibilities
//! - Build URLs from the configured base URL
//! - Attach default headers and the stored bearer token
//! - Enforce a deadline per attempt, retry with exponential backoff
//! - Classify every terminal failure and log it with url, method, duration
//! - Clear stored credentials when the backend answers 401

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::config::ApiConfig;
use crate::http::envelope::{error_body_message, Envelope, RawEnvelope};
use crate::http::error::{ApiError, ErrorKind};
use crate::http::request::{RequestAttempt, RequestBody, RequestOptions};
use crate::observability::metrics;
use crate::resilience::{enforce_deadline, RetryPolicy};
use crate::session::CredentialStore;

/// Header carrying the API version.
pub const X_API_VERSION: &str = "X-API-Version";

/// Shared HTTP client for all domain services. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_version: String,
    default_timeout: Duration,
    policy: RetryPolicy,
    credentials: Arc<CredentialStore>,
}

impl ApiClient {
    /// Create a client for the configured backend.
    pub fn new(config: &ApiConfig, credentials: Arc<CredentialStore>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("storefront-client/", env!("CARGO_PKG_VERSION")))
            .build()?;

        tracing::info!(
            base_url = %config.base_url,
            timeout_ms = config.timeout_ms,
            max_retries = config.max_retries,
            "API client initialized"
        );

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_version: config.api_version.clone(),
            default_timeout: Duration::from_millis(config.timeout_ms),
            policy: RetryPolicy::from_config(config),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn credentials(&self) -> &Arc<CredentialStore> {
        &self.credentials
    }

    /// Join an endpoint onto the base URL with exactly one slash.
    pub fn build_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Perform one logical call and decode the body as `T`.
    ///
    /// Retries transient failures; terminal failures come back classified.
    pub async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: &RequestBody,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.build_url(endpoint);
        let deadline = options.timeout.unwrap_or(self.default_timeout);
        let policy = self.policy.with_max_retries(options.retries);
        let mut attempt = RequestAttempt::new();

        tracing::debug!(
            request_id = %attempt.id,
            method = %method,
            url = %url,
            "API request"
        );

        loop {
            let result = enforce_deadline(
                deadline,
                self.send_once::<T>(&method, &url, body, options),
            )
            .await
            .unwrap_or_else(|_| Err(ApiError::new(ErrorKind::Timeout, method.as_str(), &url, None)));

            let err = match result {
                Ok((status, value)) => {
                    tracing::debug!(
                        request_id = %attempt.id,
                        method = %method,
                        url = %url,
                        status,
                        retries = attempt.retries,
                        duration_ms = attempt.elapsed().as_millis() as u64,
                        "API response"
                    );
                    metrics::record_request(method.as_str(), Some(status), "success", attempt.started);
                    return Ok(value);
                }
                Err(err) => err.with_request_id(attempt.id),
            };

            match policy.next_delay(&err, attempt.retries + 1) {
                Some(delay) => {
                    attempt.retries += 1;
                    tracing::debug!(
                        request_id = %attempt.id,
                        attempt = attempt.retries,
                        max_retries = policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        kind = %err.kind,
                        url = %url,
                        "Retrying request"
                    );
                    metrics::record_retry(method.as_str(), err.kind.code());
                    tokio::time::sleep(delay).await;
                }
                None => return Err(self.fail(err, &attempt)),
            }
        }
    }

    /// Perform a call whose body is a `{code, message, data}` envelope.
    pub async fn envelope<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: &RequestBody,
        options: &RequestOptions,
    ) -> Result<Envelope<T>, ApiError> {
        let raw: RawEnvelope<T> = self.execute(method, endpoint, body, options).await?;
        Ok(raw.into())
    }

    /// Perform an envelope call and require a success with data.
    pub async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: &RequestBody,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        let url = self.build_url(endpoint);
        let method_name = method.to_string();
        match self.envelope(method, endpoint, body, options).await? {
            Envelope::Success { data: Some(data), .. } => Ok(data),
            Envelope::Success { data: None, .. } => Err(ApiError::new(
                ErrorKind::Decode,
                &method_name,
                &url,
                Some("response carried no data".to_string()),
            )),
            Envelope::Failure { code, message } => {
                tracing::warn!(
                    method = %method_name,
                    url = %url,
                    code,
                    message = %message,
                    "Backend rejected request"
                );
                Err(ApiError::rejected(code, &method_name, &url, Some(message)))
            }
        }
    }

    async fn send_once<T: DeserializeOwned>(
        &self,
        method: &Method,
        url: &str,
        body: &RequestBody,
        options: &RequestOptions,
    ) -> Result<(u16, T), ApiError> {
        let fail = |kind: ErrorKind, message: Option<String>| {
            ApiError::new(kind, method.as_str(), url, message)
        };

        let mut request = self.http.request(method.clone(), url);
        if !options.has_header(ACCEPT.as_str()) {
            request = request.header(ACCEPT, "application/json");
        }
        if !options.has_header(X_API_VERSION) {
            request = request.header(X_API_VERSION, self.api_version.as_str());
        }
        if !options.has_header(AUTHORIZATION.as_str()) {
            if let Some(token) = self.credentials.token() {
                request = request.bearer_auth(token);
            }
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if !options.params.is_empty() {
            request = request.query(&options.params);
        }

        request = match body {
            RequestBody::Empty => request,
            RequestBody::Json(value) => request.json(value),
            RequestBody::Multipart(form) => request.multipart(
                form.to_form()
                    .map_err(|e| fail(ErrorKind::BadRequest, Some(e.to_string())))?,
            ),
        };

        let response = request.send().await.map_err(|e| classify_transport(e, method, url))?;
        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_transport(e, method, url))?;

        if !(200..300).contains(&status) {
            let text = String::from_utf8_lossy(&bytes);
            return Err(ApiError::from_status(
                status,
                method.as_str(),
                url,
                error_body_message(&text),
            ));
        }

        // Empty bodies decode as JSON null so `()` and `Option<_>` targets work.
        let payload: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(payload)
            .map(|value| (status, value))
            .map_err(|e| fail(ErrorKind::Decode, Some(e.to_string())))
    }

    /// Log a terminal failure and apply its side effects.
    fn fail(&self, err: ApiError, attempt: &RequestAttempt) -> ApiError {
        let duration_ms = attempt.elapsed().as_millis() as u64;
        match err.kind {
            ErrorKind::Unauthorized | ErrorKind::Forbidden | ErrorKind::NotFound
            | ErrorKind::Rejected | ErrorKind::BadRequest | ErrorKind::Validation
            | ErrorKind::Conflict => tracing::warn!(
                request_id = %attempt.id,
                method = %err.method,
                url = %err.url,
                status = ?err.status,
                kind = %err.kind,
                duration_ms,
                retries = attempt.retries,
                message = %err.message,
                "API error"
            ),
            _ => tracing::error!(
                request_id = %attempt.id,
                method = %err.method,
                url = %err.url,
                status = ?err.status,
                kind = %err.kind,
                duration_ms,
                retries = attempt.retries,
                message = %err.message,
                "API error"
            ),
        }

        if err.is_unauthorized() && self.credentials.clear() {
            tracing::warn!(request_id = %attempt.id, "Session expired, credentials cleared");
        }

        metrics::record_request(&err.method, err.status, err.kind.code(), attempt.started);
        err
    }
}

fn classify_transport(e: reqwest::Error, method: &Method, url: &str) -> ApiError {
    let kind = if e.is_timeout() {
        ErrorKind::Timeout
    } else if e.is_decode() {
        ErrorKind::Decode
    } else {
        ErrorKind::Network
    };
    ApiError::new(kind, method.as_str(), url, Some(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ApiClient {
        let config = ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        };
        ApiClient::new(&config, Arc::new(CredentialStore::default())).unwrap()
    }

    #[test]
    fn test_build_url() {
        let api = client("http://localhost:3000/");
        assert_eq!(api.build_url("/api/orders"), "http://localhost:3000/api/orders");
        assert_eq!(api.build_url("api/orders"), "http://localhost:3000/api/orders");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let api = client(&format!("http://127.0.0.1:{port}"));
        let options = RequestOptions::new().retries(0);
        let err = api
            .execute::<serde_json::Value>(Method::GET, "/ping", &RequestBody::Empty, &options)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Network);
        assert!(err.status.is_none());
        assert!(err.request_id.is_some());
    }
}

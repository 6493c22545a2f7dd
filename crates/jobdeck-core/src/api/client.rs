//! API client for communicating with the JobDeck REST API.
//!
//! This module provides the `ApiClient` struct plus the `Operation`
//! descriptor it dispatches. Every call goes through the same path: build
//! the URL from ordered path segments and filtered query parameters, attach
//! the bearer credential when one is held, send, and classify non-success
//! responses into typed errors.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Method, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::auth::TokenStore;
use crate::models::{AuthPayload, User};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Default base URL for the JobDeck API; overridable via config.
pub const DEFAULT_API_BASE_URL: &str = "https://api.jobdeck.app";

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Query values equal to this sentinel mean "no filter selected" in
/// multi-choice filters and are never forwarded upstream.
const ALL_SENTINEL: &str = "all";

// ============================================================================
// Operations
// ============================================================================

/// What to do when the server answers 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnUnauthorized {
    /// Propagate `ApiError::Unauthorized` and drop the stored credential.
    #[default]
    Error,
    /// Resolve with `None`; used for session probes where the absence of a
    /// session is an expected answer, not a failure.
    ReturnNone,
}

/// Query parameter value; `None` models an absent/unset filter.
#[derive(Debug, Clone)]
pub struct ParamValue(Option<String>);

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self(Some(v.to_string()))
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self(Some(v))
    }
}

impl From<Option<String>> for ParamValue {
    fn from(v: Option<String>) -> Self {
        Self(v)
    }
}

impl From<Option<&str>> for ParamValue {
    fn from(v: Option<&str>) -> Self {
        Self(v.map(str::to_owned))
    }
}

/// Descriptor for one API call: method, ordered path segments, query
/// parameters, an optional JSON body, and the 401 policy.
///
/// URL construction is a pure function of the descriptor: the same
/// operation always yields the same URL.
#[derive(Debug, Clone)]
pub struct Operation {
    method: Method,
    segments: Vec<String>,
    params: Vec<(String, Option<String>)>,
    body: Option<Value>,
    on_unauthorized: OnUnauthorized,
}

impl Operation {
    pub fn new<I, S>(method: Method, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            segments: segments.into_iter().map(Into::into).collect(),
            params: Vec::new(),
            body: None,
            on_unauthorized: OnUnauthorized::default(),
        }
    }

    pub fn get<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::GET, segments)
    }

    pub fn post<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Method::POST, segments)
    }

    /// Attach a query parameter. Values that are absent, empty, or equal to
    /// the `"all"` sentinel are omitted from the constructed URL entirely.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.push((key.into(), value.into().0));
        self
    }

    /// Attach a JSON body; the request then carries a matching
    /// content-type header. Bodiless requests carry no content-type.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Switch the 401 policy to resolve with `None` instead of failing.
    pub fn or_none_on_401(mut self) -> Self {
        self.on_unauthorized = OnUnauthorized::ReturnNone;
        self
    }

    fn retained(value: &Option<String>) -> bool {
        matches!(value, Some(v) if !v.is_empty() && v != ALL_SENTINEL)
    }

    /// Build the full request URL against a base. Pure: no I/O, no clock,
    /// deterministic for a given descriptor and base.
    pub fn url(&self, base: &Url) -> Result<Url, ApiError> {
        let mut url = base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidRequest("API base URL cannot be a base".to_string()))?;
            path.pop_if_empty();
            for segment in &self.segments {
                path.push(segment);
            }
        }
        let retained: Vec<_> = self
            .params
            .iter()
            .filter(|(_, value)| Self::retained(value))
            .collect();
        if !retained.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in retained {
                pairs.append_pair(key, value.as_deref().unwrap_or_default());
            }
        }
        Ok(url)
    }
}

// ============================================================================
// Client
// ============================================================================

/// Outcome of a login attempt that did not hard-fail.
#[derive(Debug)]
pub enum LoginOutcome {
    /// Credentials accepted; the payload carries the bearer token.
    SignedIn(AuthPayload),
    /// Credentials accepted but the email is unverified; the caller must
    /// route into the one-time-code flow for this address.
    VerificationRequired { email: String, message: String },
}

/// API client for the JobDeck service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    tokens: Arc<TokenStore>,
}

impl ApiClient {
    /// Create a new API client against the given base URL, reading the
    /// bearer credential from the shared token store on every call.
    pub fn new(base_url: &str, tokens: Arc<TokenStore>) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidRequest(format!("Bad API base URL {}: {}", base_url, e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            // The backend also sets same-origin session cookies; they ride
            // along independently of the bearer credential.
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            base_url,
            tokens,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.tokens.get() {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| {
                    ApiError::InvalidRequest("Bearer token contains invalid characters".to_string())
                })?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Send one operation and decode the JSON response.
    ///
    /// `Ok(None)` is produced only by the `ReturnNone` 401 policy; every
    /// other non-success response is an `ApiError`. Never retries.
    pub async fn dispatch<T: DeserializeOwned>(&self, op: Operation) -> Result<Option<T>, ApiError> {
        let url = op.url(&self.base_url)?;
        debug!(method = %op.method, url = %url, "Dispatching API request");

        let mut request = self
            .client
            .request(op.method.clone(), url.clone())
            .headers(self.auth_headers()?);
        if let Some(ref body) = op.body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return match op.on_unauthorized {
                OnUnauthorized::ReturnNone => {
                    debug!(url = %url, "Session probe answered 401, treating as signed out");
                    Ok(None)
                }
                OnUnauthorized::Error => {
                    // A hard 401 means the credential is dead; drop it so the
                    // next navigation lands on the login surface instead of
                    // looping on a token the server no longer accepts.
                    warn!(url = %url, "Request rejected with 401, clearing stored credential");
                    self.tokens.clear();
                    Err(ApiError::Unauthorized)
                }
            };
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }

        let parsed = response.json::<T>().await.map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to decode response from {}: {}", url, e))
        })?;
        Ok(Some(parsed))
    }

    // ===== Authentication Endpoints =====

    /// Attempt a password login. A 403 carrying the verify-your-email
    /// marker is a recoverable outcome, not an error; it routes the caller
    /// into the verification flow without installing any credential.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, ApiError> {
        let op = Operation::post(["auth", "login"])
            .body(serde_json::json!({ "email": email, "password": password }));

        match self.dispatch::<AuthPayload>(op).await {
            Ok(Some(payload)) => Ok(LoginOutcome::SignedIn(payload)),
            Ok(None) => Err(ApiError::InvalidResponse(
                "Login resolved without a payload".to_string(),
            )),
            Err(ApiError::VerificationRequired(message)) => {
                debug!(email, "Login requires email verification");
                Ok(LoginOutcome::VerificationRequired {
                    email: email.to_string(),
                    message,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Exchange the pending email and entered code for a session.
    pub async fn verify_otp(&self, email: &str, code: &str) -> Result<AuthPayload, ApiError> {
        let op = Operation::post(["auth", "verify-otp"])
            .body(serde_json::json!({ "email": email, "otp": code }));
        self.dispatch::<AuthPayload>(op).await?.ok_or_else(|| {
            ApiError::InvalidResponse("Verification resolved without a payload".to_string())
        })
    }

    /// Ask the server to email a fresh one-time code.
    pub async fn resend_otp(&self, email: &str) -> Result<(), ApiError> {
        let op = Operation::post(["auth", "resend-otp"])
            .body(serde_json::json!({ "email": email }));
        // Acknowledgement only; the body shape does not matter.
        self.dispatch::<Value>(op).await?;
        Ok(())
    }

    /// Probe the current session. `None` means signed out - not an error.
    pub async fn current_user(&self) -> Result<Option<User>, ApiError> {
        let op = Operation::get(["auth", "me"]).or_none_on_401();
        let response = self.dispatch::<CurrentUserResponse>(op).await?;
        Ok(response.map(|r| r.user))
    }

    /// Entry point for the Google-federated login. The browser is sent here
    /// wholesale; no token or code handling happens client-side.
    pub fn google_login_url(&self) -> Result<Url, ApiError> {
        Operation::get(["auth", "google"]).url(&self.base_url)
    }
}

// Internal API response types for parsing

#[derive(Debug, Deserialize)]
struct CurrentUserResponse {
    user: User,
}

//! HTTP adapter for the Recipeez API.
//!
//! Every request reads the token from the [`SessionStore`] at send time and
//! attaches it as a bearer credential. A response that signals an expired
//! session clears the store and surfaces [`ClientError::SessionExpired`]; any
//! other failure status is returned to the caller as-is.

mod error;

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use recipeez_api_types::{ApiErrorBody, SignInRequest, SignInResponse};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url, multipart::Form};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::config::ApiSettings;
use crate::session::SessionStore;

pub use error::ClientError;

/// Why a response was treated as a session expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpirySignal {
    /// HTTP 401 on an authenticated call. This is the canonical signal.
    Unauthorized,
    /// Non-success status whose body is `{"error":"jwt expired"}`.
    ExpiredToken,
}

/// Classify a response. Success responses never signal expiry.
pub fn detect_expiry(status: StatusCode, body: &[u8]) -> Option<ExpirySignal> {
    if status == StatusCode::UNAUTHORIZED {
        return Some(ExpirySignal::Unauthorized);
    }
    if !status.is_success() && ApiErrorBody::parse(body).is_some_and(|env| env.is_jwt_expired()) {
        return Some(ExpirySignal::ExpiredToken);
    }
    None
}

#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base: Url,
    session: Arc<SessionStore>,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings, session: Arc<SessionStore>) -> Result<Self, ClientError> {
        Self::with_base(settings.base_url.clone(), settings.timeout, session)
    }

    pub fn with_base(
        base: Url,
        timeout: Duration,
        session: Arc<SessionStore>,
    ) -> Result<Self, ClientError> {
        if base.cannot_be_a_base() {
            return Err(ClientError::BaseUrl(base.to_string()));
        }
        let http = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base,
            session,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("recipeez/", env!("CARGO_PKG_VERSION"))
    }

    /// Base URL extended with percent-encoded path segments.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::BaseUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// `Bearer <token>` for the current session, or `None` when signed out.
    pub fn auth_header(&self) -> Result<Option<HeaderValue>, ClientError> {
        self.session
            .token()
            .map(|token| {
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|err| ClientError::Header(err.to_string()))
            })
            .transpose()
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ClientError> {
        let url = self.endpoint(segments)?;
        let body = self
            .execute(self.http.request(Method::GET, url).query(query))
            .await?;
        decode(&body)
    }

    pub async fn send_json<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        payload: &B,
    ) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(segments)?;
        let body = self
            .execute(self.http.request(method, url).json(payload))
            .await?;
        decode(&body)
    }

    /// Multipart upload; same credential and error rules as JSON calls.
    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        method: Method,
        segments: &[&str],
        form: Form,
    ) -> Result<T, ClientError> {
        let url = self.endpoint(segments)?;
        let body = self
            .execute(self.http.request(method, url).multipart(form))
            .await?;
        decode(&body)
    }

    /// Request whose success response carries no meaningful body.
    pub async fn send_empty(&self, method: Method, segments: &[&str]) -> Result<(), ClientError> {
        let url = self.endpoint(segments)?;
        self.execute(self.http.request(method, url)).await?;
        Ok(())
    }

    /// `POST /auth/sign-in`. Sent without credentials; a 401 here means bad
    /// credentials and leaves the session store alone.
    pub async fn sign_in(&self, request: &SignInRequest) -> Result<SignInResponse, ClientError> {
        let url = self.endpoint(&["auth", "sign-in"])?;
        let response = self.http.post(url).json(request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(%status, "POST auth/sign-in");

        if status == StatusCode::UNAUTHORIZED {
            return Err(ClientError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        decode(&body)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Vec<u8>, ClientError> {
        let request = match self.auth_header()? {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.bytes().await?.to_vec();
        debug!(%status, url = %url, "API response");

        if let Some(signal) = detect_expiry(status, &body) {
            counter!("recipeez_session_expired_total").increment(1);
            warn!(%status, ?signal, url = %url, "Server rejected the session credential");
            self.session.expire();
            return Err(ClientError::SessionExpired);
        }
        if !status.is_success() {
            return Err(status_error(status, &body));
        }
        Ok(body)
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> ClientError {
    let message = ApiErrorBody::parse(body).and_then(|env| env.text().map(str::to_string));
    ClientError::Status {
        status,
        body: String::from_utf8_lossy(body).into_owned(),
        message,
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(body).map_err(ClientError::Decode)
}

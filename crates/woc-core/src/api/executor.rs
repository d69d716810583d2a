//! Authenticated request execution with one transparent token refresh.
//!
//! Every call walks the same stages:
//!
//! ```text
//! Attempt --401, refreshable--> Refresh --new token--> Retry --> done
//!    |                             |
//!    +--anything else--> done      +--rejected--> session cleared, done
//! ```
//!
//! `Retry` has no path back to `Refresh`, so a logical call refreshes at
//! most once no matter what the server answers.
//!
//! Session credentials only travel to the backend's own origin. Requests to
//! any other host, or marked [`ApiRequest::anonymous`], go out without the
//! session bearer and are never refreshed.

use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::notify::{LogNotifier, Notifier};
use super::request::{bearer_value, ApiRequest, HttpRequest, HttpResponse};
use super::transport::Transport;
use super::{ApiError, Outcome};
use crate::auth::SessionContext;

/// Path of the token refresh endpoint, relative to the backend root
pub const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(rename = "accessKey")]
    access_key: Option<String>,
}

enum Stage {
    Attempt,
    /// `seen` is the session access token when the rejected attempt went out.
    Refresh { seen: Option<String> },
    Retry { token: String },
}

pub struct Executor<T: Transport, N: Notifier = LogNotifier> {
    transport: T,
    notifier: N,
    session: SessionContext,
    backend: Option<Url>,
    refresh_url: String,
}

impl<T: Transport> Executor<T> {
    pub fn new(transport: T, session: SessionContext, backend_url: &str) -> Self {
        Self::with_notifier(transport, session, backend_url, LogNotifier)
    }
}

impl<T: Transport, N: Notifier> Executor<T, N> {
    pub fn with_notifier(
        transport: T,
        session: SessionContext,
        backend_url: &str,
        notifier: N,
    ) -> Self {
        let backend = Url::parse(backend_url).ok();
        if backend.is_none() {
            warn!(backend_url, "Backend URL is invalid; session credentials will not be sent");
        }
        Self {
            transport,
            notifier,
            session,
            backend,
            refresh_url: format!("{}{}", backend_url.trim_end_matches('/'), REFRESH_PATH),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Run one logical call and decode the success payload into `P`.
    ///
    /// Never fails outright: every error becomes [`Outcome::Failure`], and
    /// each failure is reported to the notifier exactly once.
    pub async fn execute<P: DeserializeOwned>(&self, request: &ApiRequest) -> Outcome<P> {
        let result = self.run(request).await.and_then(|payload| {
            serde_json::from_value(payload).map_err(|e| ApiError::InvalidResponse(e.to_string()))
        });

        match result {
            Ok(payload) => Outcome::Success(payload),
            Err(e) => {
                debug!(url = request.url(), error = %e, "API call failed");
                self.fail(e)
            }
        }
    }

    /// Report a failure produced outside the request path the same way
    /// request failures are reported.
    pub fn fail<P>(&self, error: ApiError) -> Outcome<P> {
        self.notifier.notify(&error.to_string());
        Outcome::Failure(error)
    }

    /// Send a notice that is not tied to a failed call
    pub fn notify(&self, message: &str) {
        self.notifier.notify(message);
    }

    async fn run(&self, request: &ApiRequest) -> Result<serde_json::Value, ApiError> {
        let mut stage = Stage::Attempt;
        loop {
            stage = match stage {
                Stage::Attempt => {
                    let trusted = self.carries_session(request)?;
                    let seen = if trusted {
                        self.session.access_token().await
                    } else {
                        None
                    };
                    let http = request.to_http(seen.as_deref())?;
                    let response = self.transport.send(http).await?;

                    if trusted && self.should_refresh(request, &response).await {
                        Stage::Refresh { seen }
                    } else {
                        return Self::classify(request, response);
                    }
                }
                Stage::Refresh { seen } => Stage::Retry {
                    token: self.refresh(seen).await?,
                },
                Stage::Retry { token } => {
                    debug!(url = request.url(), "Retrying with refreshed token");
                    let retry = request.with_bearer(&token);
                    let response = self.transport.send(retry.to_http(None)?).await?;
                    return Self::classify(&retry, response);
                }
            };
        }
    }

    /// Whether the session may be attached to this request: it has to target
    /// the backend origin and not be anonymous.
    fn carries_session(&self, request: &ApiRequest) -> Result<bool, ApiError> {
        if !request.is_authenticated() {
            return Ok(false);
        }
        let url = request.resolved_url()?;
        Ok(self
            .backend
            .as_ref()
            .is_some_and(|backend| backend.origin() == url.origin()))
    }

    async fn should_refresh(&self, request: &ApiRequest, response: &HttpResponse) -> bool {
        response.status == StatusCode::UNAUTHORIZED
            && !request.is_login()
            && request.is_retry_allowed()
            && self.session.refresh_token().await.is_some()
    }

    fn classify(
        request: &ApiRequest,
        response: HttpResponse,
    ) -> Result<serde_json::Value, ApiError> {
        if response.status.is_success() {
            Ok(response.json_or_empty())
        } else {
            Err(ApiError::from_status(
                response.status,
                &response.body,
                request.is_login(),
            ))
        }
    }

    /// Obtain a usable access token, refreshing unless another call already
    /// did so after this one's attempt went out.
    async fn refresh(&self, seen: Option<String>) -> Result<String, ApiError> {
        let _guard = self.session.lock_refresh().await;

        if let Some(current) = self.session.access_token().await {
            if seen.as_deref() != Some(current.as_str()) {
                debug!("Access token already refreshed by another call");
                return Ok(current);
            }
        }

        // Cleared by a concurrent call whose refresh was rejected
        let Some(refresh_token) = self.session.refresh_token().await else {
            return Err(ApiError::SessionExpired);
        };

        let url = Url::parse(&self.refresh_url)
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", self.refresh_url, e)))?;
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, bearer_value(&refresh_token)?);
        let request = HttpRequest {
            method: Method::GET,
            url,
            headers,
            body: None,
        };

        let response = self.transport.send(request).await?;
        if response.status.is_success() {
            let parsed: Option<RefreshResponse> = serde_json::from_slice(&response.body).ok();
            if let Some(token) = parsed.and_then(|r| r.access_key).filter(|t| !t.is_empty()) {
                self.session.update_access_token(token.clone()).await;
                info!("Access token refreshed");
                return Ok(token);
            }
            warn!("Refresh response did not contain an access key");
        } else {
            warn!(status = response.status.as_u16(), "Token refresh rejected");
        }

        self.session.clear().await;
        Err(ApiError::SessionExpired)
    }
}

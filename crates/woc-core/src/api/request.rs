use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::Serialize;

use super::ApiError;

/// Path fragment identifying the login endpoint. A 401 there means bad
/// credentials, never an expired token.
const LOGIN_PATH: &str = "/auth/login";

/// Immutable description of one API call.
///
/// Built with [`ApiRequest::get`] / [`ApiRequest::post`] / [`ApiRequest::new`]
/// and the chained setters; the executor only reads it.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    url: String,
    method: Method,
    headers: Vec<(String, String)>,
    params: Vec<(String, String)>,
    body: Option<Result<serde_json::Value, String>>,
    retry_allowed: bool,
    authenticated: bool,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: Vec::new(),
            params: Vec::new(),
            body: None,
            retry_allowed: true,
            authenticated: true,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Attach a JSON body. Serialization errors surface when the request is
    /// executed, as an `InvalidRequest` failure.
    pub fn json<B: Serialize>(mut self, body: &B) -> Self {
        self.body = Some(serde_json::to_value(body).map_err(|e| e.to_string()));
        self
    }

    pub fn retry_allowed(mut self, allowed: bool) -> Self {
        self.retry_allowed = allowed;
        self
    }

    /// Never attach session credentials and never refresh, even when the
    /// URL points at the backend.
    pub fn anonymous(mut self) -> Self {
        self.authenticated = false;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn is_retry_allowed(&self) -> bool {
        self.retry_allowed
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn is_login(&self) -> bool {
        self.url.contains(LOGIN_PATH)
    }

    fn carries_body(&self) -> bool {
        matches!(self.method, Method::POST | Method::PUT | Method::PATCH)
    }

    fn has_authorization(&self) -> bool {
        self.headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION.as_str()))
    }

    /// Resolve the final URL with the query string appended.
    pub fn resolved_url(&self) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.url)
            .map_err(|e| ApiError::InvalidRequest(format!("{}: {}", self.url, e)))?;
        if !self.params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }

    /// Build the wire request. `bearer` is attached as `Authorization` unless
    /// the caller already set that header.
    pub(crate) fn to_http(&self, bearer: Option<&str>) -> Result<HttpRequest, ApiError> {
        let url = self.resolved_url()?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(token) = bearer.filter(|_| !self.has_authorization()) {
            headers.insert(AUTHORIZATION, bearer_value(token)?);
        }
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::InvalidRequest(format!("header {}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::InvalidRequest(format!("header {}: {}", name, e)))?;
            headers.insert(name, value);
        }

        let body = match (&self.body, self.carries_body()) {
            (Some(Err(e)), _) => return Err(ApiError::InvalidRequest(e.clone())),
            (Some(Ok(body)), true) => Some(
                serde_json::to_vec(body).map_err(|e| ApiError::InvalidRequest(e.to_string()))?,
            ),
            _ => None,
        };

        Ok(HttpRequest {
            method: self.method.clone(),
            url,
            headers,
            body,
        })
    }

    /// Same request re-sent after a refresh: new bearer token replaces
    /// whatever the caller put in `Authorization`.
    pub(crate) fn with_bearer(&self, token: &str) -> Self {
        let mut next = self.clone();
        next.headers
            .retain(|(name, _)| !name.eq_ignore_ascii_case(AUTHORIZATION.as_str()));
        next.headers
            .push((AUTHORIZATION.as_str().to_string(), format!("Bearer {}", token)));
        next.retry_allowed = false;
        next
    }
}

pub(crate) fn bearer_value(token: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&format!("Bearer {}", token))
        .map_err(|e| ApiError::InvalidRequest(format!("authorization header: {}", e)))
}

/// A request as handed to a [`Transport`](super::Transport).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    /// Bearer token carried in `Authorization`, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }
}

/// Status and raw body of a completed exchange.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: reqwest::StatusCode,
    pub body: Vec<u8>,
}

#[cfg(test)]
impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: reqwest::StatusCode::from_u16(status).expect("valid status code"),
            body: body.into(),
        }
    }

    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }
}

impl HttpResponse {
    /// Body parsed as JSON, or an empty object when it is not valid JSON.
    pub fn json_or_empty(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body)
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_params_are_encoded() {
        let request = ApiRequest::get("https://api.example.com/items")
            .param("q", "rust lang")
            .param("page", 2);
        let url = request.resolved_url().unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/items?q=rust+lang&page=2");
    }

    #[test]
    fn test_existing_query_is_kept() {
        let request = ApiRequest::get("https://api.example.com/items?sort=asc").param("page", 1);
        let url = request.resolved_url().unwrap();
        assert_eq!(url.query(), Some("sort=asc&page=1"));
    }

    #[test]
    fn test_invalid_url() {
        let err = ApiRequest::get("not a url").to_http(None).unwrap_err();
        assert!(matches!(err, ApiError::InvalidRequest(_)));
    }

    #[test]
    fn test_default_headers_and_bearer() {
        let http = ApiRequest::get("https://api.example.com/items")
            .header("X-Trace", "abc")
            .to_http(Some("tok"))
            .unwrap();
        assert_eq!(http.headers[CONTENT_TYPE], "application/json");
        assert_eq!(http.headers["x-trace"], "abc");
        assert_eq!(http.bearer(), Some("tok"));
    }

    #[test]
    fn test_caller_headers_override_defaults() {
        let http = ApiRequest::get("https://api.example.com/items")
            .header("Content-Type", "text/plain")
            .header("Authorization", "Bearer mine")
            .to_http(Some("session"))
            .unwrap();
        assert_eq!(http.headers[CONTENT_TYPE], "text/plain");
        assert_eq!(http.bearer(), Some("mine"));
    }

    #[test]
    fn test_body_only_sent_for_write_methods() {
        let body = json!({ "email": "a@b.c" });
        let get = ApiRequest::get("https://api.example.com/x").json(&body).to_http(None).unwrap();
        assert!(get.body.is_none());

        let post = ApiRequest::post("https://api.example.com/x").json(&body).to_http(None).unwrap();
        assert_eq!(post.body.unwrap(), serde_json::to_vec(&body).unwrap());

        let patch = ApiRequest::new(Method::PATCH, "https://api.example.com/x")
            .json(&body)
            .to_http(None)
            .unwrap();
        assert!(patch.body.is_some());
    }

    #[test]
    fn test_login_detection() {
        assert!(ApiRequest::post("https://api.example.com/auth/login").is_login());
        assert!(!ApiRequest::get("https://api.example.com/auth/refresh").is_login());
    }

    #[test]
    fn test_with_bearer_disables_retry() {
        let request = ApiRequest::get("https://api.example.com/items")
            .header("authorization", "Bearer old");
        let retry = request.with_bearer("new");
        assert!(!retry.is_retry_allowed());
        let http = retry.to_http(Some("ignored")).unwrap();
        assert_eq!(http.bearer(), Some("new"));
    }

    #[test]
    fn test_anonymous_request() {
        let request = ApiRequest::get("https://woc.example.com/data/team.json").anonymous();
        assert!(!request.is_authenticated());
        assert!(request.is_retry_allowed());
        assert!(ApiRequest::get("https://api.example.com/x").is_authenticated());
    }

    #[test]
    fn test_json_or_empty() {
        assert_eq!(HttpResponse::new(200, "").json_or_empty(), json!({}));
        assert_eq!(HttpResponse::new(200, "[1]").json_or_empty(), json!([1]));
    }
}

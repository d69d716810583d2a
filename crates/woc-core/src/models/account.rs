// Allow dead code: response structs keep every field the backend sends
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

use crate::auth::SessionData;

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of a successful `POST /auth/login`.
///
/// Only the access token is guaranteed; the rest default when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default)]
    pub github_username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bounty: Option<i64>,
}

impl LoginResponse {
    /// Session for this login; `email` is used when the backend omits it.
    pub fn into_session(self, email: &str) -> SessionData {
        SessionData::new(
            self.access_token,
            self.refresh_token,
            self.github_username.unwrap_or_default(),
            self.email.filter(|e| !e.is_empty()).unwrap_or_else(|| email.to_string()),
            self.bounty.unwrap_or(0),
        )
    }
}

/// Body of `GET /github`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GithubRedirect {
    pub url: Option<String>,
}

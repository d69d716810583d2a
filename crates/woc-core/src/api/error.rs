use reqwest::StatusCode;
use thiserror::Error;

pub const INVALID_CREDENTIALS_MESSAGE: &str = "Invalid email or password";
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";
pub const GITHUB_NOT_LINKED_MESSAGE: &str = "Please link your GitHub account to continue.";
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
pub const NOT_LOGGED_IN_MESSAGE: &str = "You must be logged in first.";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// Failure side of an [`Outcome`](super::Outcome).
///
/// `Display` is the message shown to the user, so every variant renders as a
/// complete sentence rather than a debugging string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 401 on the login endpoint.
    #[error("{0}")]
    InvalidCredentials(String),

    /// The refresh call was rejected and the session has been cleared.
    #[error("Session expired. Please login again.")]
    SessionExpired,

    /// 401 that was not eligible for a refresh.
    #[error("{0}")]
    Unauthorized(String),

    #[error("Please link your GitHub account to continue.")]
    GithubNotLinked,

    #[error("Server error. Please try again later.")]
    ServerError,

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("You must be logged in first.")]
    NotLoggedIn,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Transport(String),
}

/// Maximum length for server-provided messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a server message to avoid showing or logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Pull the `message` field out of a JSON error body, if there is one.
    pub(crate) fn server_message(body: &[u8]) -> Option<String> {
        let value: serde_json::Value = serde_json::from_slice(body).ok()?;
        value
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.is_empty())
            .map(Self::truncate_body)
    }

    /// Classify a non-success status that is not handled by the refresh path.
    pub fn from_status(status: StatusCode, body: &[u8], login_path: bool) -> Self {
        let message = Self::server_message(body);
        match status.as_u16() {
            401 if login_path => ApiError::InvalidCredentials(
                message.unwrap_or_else(|| INVALID_CREDENTIALS_MESSAGE.to_string()),
            ),
            401 => ApiError::Unauthorized(message.unwrap_or_else(|| Self::generic_message(401))),
            422 => ApiError::GithubNotLinked,
            500 => ApiError::ServerError,
            code => ApiError::Http {
                status: code,
                message: message.unwrap_or_else(|| Self::generic_message(code)),
            },
        }
    }

    fn generic_message(status: u16) -> String {
        format!("HTTP error! Status: {}", status)
    }

    /// True when the user has to authenticate again before retrying.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ApiError::SessionExpired | ApiError::Unauthorized(_) | ApiError::NotLoggedIn
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        let message = e.to_string();
        if message.is_empty() {
            ApiError::Transport(UNEXPECTED_ERROR_MESSAGE.to_string())
        } else {
            ApiError::Transport(message)
        }
    }
}

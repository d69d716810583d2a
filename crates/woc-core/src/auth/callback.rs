use std::collections::HashMap;

use reqwest::Url;

use super::SessionData;

pub const LINK_FAILED_MESSAGE: &str = "GitHub linking failed or account already linked.";

/// What the GitHub linking redirect carried back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Credentials for the linked account
    Linked(SessionData),
    /// The backend reported an `error` parameter
    Failed,
    /// Neither an error nor a complete set of credentials
    Ignored,
}

/// Parse the OAuth callback parameters.
///
/// Accepts a full redirect URL, a `?query`, or a bare query string. The
/// `error` parameter wins over everything else; otherwise `access_token`,
/// `refresh_token`, `github_username` and `email` must all be present.
pub fn parse_callback(input: &str) -> CallbackOutcome {
    let params = query_params(input);
    let get = |key: &str| params.get(key).filter(|v| !v.is_empty()).cloned();

    if params.contains_key("error") {
        return CallbackOutcome::Failed;
    }

    match (
        get("access_token"),
        get("refresh_token"),
        get("github_username"),
        get("email"),
    ) {
        (Some(access), Some(refresh), Some(github), Some(email)) => {
            let bounty = get("bounty")
                .and_then(|b| leading_integer(&b))
                .unwrap_or(0);
            CallbackOutcome::Linked(SessionData::new(access, refresh, github, email, bounty))
        }
        _ => CallbackOutcome::Ignored,
    }
}

fn query_params(input: &str) -> HashMap<String, String> {
    let input = input.trim();
    // Bare query strings go through a placeholder base so one decoder handles both forms
    let url = Url::parse(input).or_else(|_| {
        Url::parse(&format!("http://localhost/?{}", input.trim_start_matches('?')))
    });
    match url {
        Ok(url) => url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect(),
        Err(_) => HashMap::new(),
    }
}

/// Integer prefix of `s` ("42abc" -> 42); `None` when there is no digit.
fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

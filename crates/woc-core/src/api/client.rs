//! API client for the Winter of Code backend.
//!
//! `WocClient` names the endpoints; every call goes through the
//! [`Executor`], so all of them share the refresh-once behaviour and report
//! failures through the same notifier.

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use super::executor::Executor;
use super::notify::{LogNotifier, Notifier};
use super::request::ApiRequest;
use super::transport::{ReqwestTransport, Transport};
use super::{ApiError, Outcome};
use crate::auth::callback::LINK_FAILED_MESSAGE;
use crate::auth::{parse_callback, CallbackOutcome, SessionContext, SessionData};
use crate::models::{GithubRedirect, HallOfFame, LoginRequest, LoginResponse, TeamRoster};

const LOGIN_PATH: &str = "/auth/login";
const HOF_PATH: &str = "/hof";
const GITHUB_PATH: &str = "/github";

pub struct WocClient<T: Transport = ReqwestTransport, N: Notifier = LogNotifier> {
    executor: Executor<T, N>,
    base_url: String,
}

impl WocClient {
    /// Client over HTTP with the given request timeout
    pub fn new(backend_url: &str, session: SessionContext, timeout: Duration) -> Result<Self> {
        let transport = ReqwestTransport::with_timeout(timeout)?;
        Ok(Self::from_executor(
            Executor::new(transport, session, backend_url),
            backend_url,
        ))
    }
}

impl<T: Transport, N: Notifier> WocClient<T, N> {
    pub fn from_executor(executor: Executor<T, N>, backend_url: &str) -> Self {
        Self {
            executor,
            base_url: backend_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn session(&self) -> &SessionContext {
        self.executor.session()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Log in with email and password; on success the session is replaced.
    pub async fn login(&self, email: &str, password: &str) -> Outcome<SessionData> {
        let request = ApiRequest::post(self.endpoint(LOGIN_PATH)).json(&LoginRequest { email, password });

        match self.executor.execute::<LoginResponse>(&request).await {
            Outcome::Success(response) => {
                let session = response.into_session(email);
                self.session().set(session.clone()).await;
                info!(email, "Logged in");
                Outcome::Success(session)
            }
            Outcome::Failure(e) => Outcome::Failure(e),
        }
    }

    /// Sign out locally. Returns whether a session was present.
    pub async fn logout(&self) -> bool {
        self.session().clear().await
    }

    pub async fn hall_of_fame(&self) -> Outcome<HallOfFame> {
        self.executor
            .execute(&ApiRequest::get(self.endpoint(HOF_PATH)))
            .await
    }

    /// URL to send the user to for linking their GitHub account
    pub async fn github_authorize_url(&self) -> Outcome<String> {
        if !self.session().is_authenticated().await {
            return self.executor.fail(ApiError::NotLoggedIn);
        }

        match self
            .executor
            .execute::<GithubRedirect>(&ApiRequest::get(self.endpoint(GITHUB_PATH)))
            .await
        {
            Outcome::Success(GithubRedirect { url: Some(url) }) if !url.is_empty() => {
                Outcome::Success(url)
            }
            Outcome::Success(_) => self
                .executor
                .fail(ApiError::InvalidResponse("No URL returned from backend".into())),
            Outcome::Failure(e) => Outcome::Failure(e),
        }
    }

    /// Handle the redirect from GitHub linking. A complete callback replaces
    /// the session; an error callback is reported to the notifier.
    pub async fn accept_callback(&self, redirect: &str) -> CallbackOutcome {
        let outcome = parse_callback(redirect);
        match &outcome {
            CallbackOutcome::Linked(session) => {
                self.session().set(session.clone()).await;
                info!(github = %session.github_username, "GitHub account linked");
            }
            CallbackOutcome::Failed => self.executor.notify(LINK_FAILED_MESSAGE),
            CallbackOutcome::Ignored => debug!("Callback carried no credentials"),
        }
        outcome
    }

    /// Load the team roster from a URL or a local file. The roster is public,
    /// so it is fetched without session credentials.
    pub async fn team(&self, source: &str) -> Outcome<TeamRoster> {
        if source.starts_with("http://") || source.starts_with("https://") {
            return self.executor.execute(&ApiRequest::get(source).anonymous()).await;
        }

        let contents = match std::fs::read_to_string(source) {
            Ok(contents) => contents,
            Err(e) => {
                return self
                    .executor
                    .fail(ApiError::InvalidRequest(format!("{}: {}", source, e)))
            }
        };
        match serde_json::from_str(&contents) {
            Ok(roster) => Outcome::Success(roster),
            Err(e) => self
                .executor
                .fail(ApiError::InvalidResponse(format!("{}: {}", source, e))),
        }
    }

    /// GET of a backend path, returning raw JSON. Absolute URLs on another
    /// origin are fetched without the session.
    pub async fn get_json(&self, path: &str, params: &[(String, String)]) -> Outcome<serde_json::Value> {
        let request = params
            .iter()
            .fold(ApiRequest::get(self.endpoint(path)), |req, (k, v)| req.param(k, v));
        self.executor.execute(&request).await
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::api::notify::RecordingNotifier;
    use crate::api::request::HttpResponse;
    use crate::api::testing::MockTransport;

    const BACKEND: &str = "https://api.example.com/";

    fn client(
        transport: &Arc<MockTransport>,
        session: SessionContext,
    ) -> (WocClient<Arc<MockTransport>, Arc<RecordingNotifier>>, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::new());
        let executor = Executor::with_notifier(transport.clone(), session, BACKEND, notifier.clone());
        (WocClient::from_executor(executor, BACKEND), notifier)
    }

    fn signed_in() -> SessionContext {
        SessionContext::with_data(SessionData::new("access", "refresh", "", "dev@example.com", 0))
    }

    #[tokio::test]
    async fn test_login_sets_session() {
        let transport = MockTransport::sequence(vec![HttpResponse::json(
            200,
            &json!({ "access_token": "a", "refresh_token": "r", "bounty": 5 }),
        )]);
        let (client, _) = client(&transport, SessionContext::new());

        let outcome = client.login("dev@example.com", "hunter2").await;

        let session = outcome.into_result().unwrap();
        assert_eq!(session.email, "dev@example.com");
        assert_eq!(client.session().access_token().await.as_deref(), Some("a"));

        let request = &transport.requests()[0];
        assert_eq!(request.url.as_str(), "https://api.example.com/auth/login");
        let body: serde_json::Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(body, json!({ "email": "dev@example.com", "password": "hunter2" }));
    }

    #[tokio::test]
    async fn test_failed_login_leaves_session_alone() {
        let transport = MockTransport::sequence(vec![HttpResponse::json(
            401,
            &json!({ "message": "Invalid email or password" }),
        )]);
        let session = signed_in();
        let before = session.snapshot().await;
        let (client, notifier) = client(&transport, session);

        let outcome = client.login("dev@example.com", "wrong").await;

        assert_eq!(
            outcome,
            Outcome::Failure(ApiError::InvalidCredentials("Invalid email or password".into()))
        );
        assert_eq!(client.session().snapshot().await, before);
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(notifier.messages(), vec!["Invalid email or password"]);
    }

    #[tokio::test]
    async fn test_hall_of_fame() {
        let transport = MockTransport::sequence(vec![HttpResponse::json(
            200,
            &json!({ "leaderboards": { "go": {
                "first_place": { "github_username": "gopher", "pull_request_merged": "4" },
                "second_place": { "github_username": "rob", "pull_request_merged": "2" }
            }}}),
        )]);
        let (client, _) = client(&transport, SessionContext::new());

        let hof = client.hall_of_fame().await.into_result().unwrap();
        assert_eq!(hof.ordered_languages(), vec!["go"]);
        assert_eq!(transport.paths(), vec!["/hof"]);
    }

    #[tokio::test]
    async fn test_github_url_requires_login() {
        let transport = MockTransport::sequence(vec![]);
        let (client, notifier) = client(&transport, SessionContext::new());

        let outcome = client.github_authorize_url().await;
        assert_eq!(outcome, Outcome::Failure(ApiError::NotLoggedIn));
        assert!(transport.requests().is_empty());
        assert_eq!(notifier.messages(), vec!["You must be logged in first."]);
    }

    #[tokio::test]
    async fn test_github_url() {
        let transport = MockTransport::sequence(vec![
            HttpResponse::json(200, &json!({ "url": "https://github.com/login/oauth/authorize?x=1" })),
            HttpResponse::json(200, &json!({})),
        ]);
        let (client, _) = client(&transport, signed_in());

        let url = client.github_authorize_url().await.into_result().unwrap();
        assert_eq!(url, "https://github.com/login/oauth/authorize?x=1");
        assert_eq!(transport.requests()[0].bearer(), Some("access"));

        let missing = client.github_authorize_url().await;
        assert!(matches!(missing, Outcome::Failure(ApiError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_accept_callback() {
        let transport = MockTransport::sequence(vec![]);
        let (client, notifier) = client(&transport, SessionContext::new());

        let outcome = client
            .accept_callback("access_token=a&refresh_token=r&github_username=octocat&email=o@example.com&bounty=3")
            .await;
        assert!(matches!(outcome, CallbackOutcome::Linked(_)));
        let session = client.session().snapshot().await.unwrap();
        assert_eq!(session.github_username, "octocat");
        assert_eq!(session.bounty, 3);

        assert_eq!(client.accept_callback("error=1").await, CallbackOutcome::Failed);
        assert_eq!(notifier.messages(), vec![LINK_FAILED_MESSAGE]);
        assert!(client.session().snapshot().await.is_some());

        assert!(client.logout().await);
        assert!(!client.logout().await);
    }

    #[tokio::test]
    async fn test_team_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"team":[{{"name":"Asha","username":"asha","tags":["web"]}}]}}"#).unwrap();

        let transport = MockTransport::sequence(vec![]);
        let (client, _) = client(&transport, SessionContext::new());

        let roster = client
            .team(file.path().to_str().unwrap())
            .await
            .into_result()
            .unwrap();
        assert_eq!(roster.team[0].username, "asha");

        let missing = client.team("/nonexistent/team.json").await;
        assert!(matches!(missing, Outcome::Failure(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_team_from_url() {
        let transport = MockTransport::sequence(vec![HttpResponse::json(200, &json!({ "team": [] }))]);
        let (client, _) = client(&transport, signed_in());

        let roster = client
            .team("https://woc.example.com/data/team.json")
            .await
            .into_result()
            .unwrap();
        assert!(roster.team.is_empty());
        assert_eq!(transport.paths(), vec!["/data/team.json"]);
        assert!(transport.requests()[0].bearer().is_none());
    }

    #[tokio::test]
    async fn test_team_on_backend_is_anonymous() {
        let transport = MockTransport::sequence(vec![HttpResponse::new(401, "")]);
        let (client, _) = client(&transport, signed_in());

        let outcome = client.team("https://api.example.com/data/team.json").await;
        assert!(matches!(outcome, Outcome::Failure(ApiError::Unauthorized(_))));
        assert_eq!(transport.paths(), vec!["/data/team.json"]);
        assert!(transport.requests()[0].bearer().is_none());
        assert_eq!(client.session().access_token().await.as_deref(), Some("access"));
    }

    #[tokio::test]
    async fn test_session_stays_on_backend() {
        let transport = MockTransport::new(|_| Ok(HttpResponse::json(200, &json!({ "team": [] }))));
        let (client, _) = client(&transport, signed_in());

        let _ = client.team("https://evil.example.net/team.json").await;
        let _ = client.get_json("https://evil.example.net/x", &[]).await;
        let _ = client.get_json("/hof", &[]).await;

        let requests = transport.requests();
        assert_eq!(requests[0].url.host_str(), Some("evil.example.net"));
        assert!(requests[0].bearer().is_none());
        assert_eq!(requests[1].url.host_str(), Some("evil.example.net"));
        assert!(requests[1].bearer().is_none());
        assert_eq!(requests[2].bearer(), Some("access"));
    }

    #[tokio::test]
    async fn test_get_json_with_params() {
        let transport = MockTransport::sequence(vec![HttpResponse::json(200, &json!([1, 2]))]);
        let (client, _) = client(&transport, signed_in());

        let params = vec![("page".to_string(), "2".to_string())];
        let value = client.get_json("repos", &params).await.into_result().unwrap();
        assert_eq!(value, json!([1, 2]));
        assert_eq!(transport.requests()[0].url.as_str(), "https://api.example.com/repos?page=2");
    }
}

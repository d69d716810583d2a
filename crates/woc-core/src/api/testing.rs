//! In-memory transport for executor and client tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use super::request::{HttpRequest, HttpResponse};
use super::{ApiError, Transport};

type Handler = dyn Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync;

/// Answers every request with a handler closure and records what was sent.
pub struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new(
        handler: impl Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Replays `responses` in order; extra requests fail at the transport.
    pub fn sequence(responses: Vec<HttpResponse>) -> Arc<Self> {
        let next = AtomicUsize::new(0);
        Self::new(move |_| {
            let i = next.fetch_add(1, Ordering::SeqCst);
            responses
                .get(i)
                .cloned()
                .ok_or_else(|| ApiError::Transport("connection refused".into()))
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests().iter().map(|r| r.url.path().to_string()).collect()
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = (self.handler)(&request);
        self.requests.lock().unwrap().push(request);
        tokio::task::yield_now().await;
        response
    }
}

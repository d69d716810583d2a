//! REST API module for the Winter of Code backend.
//!
//! This module provides the `Executor`, which performs authenticated
//! requests and recovers once from an expired access token, and the
//! `WocClient` endpoint wrapper built on it.
//!
//! The API uses bearer token authentication. Access tokens are short-lived
//! and renewed through `/auth/refresh` with the refresh token.

pub mod client;
pub mod error;
pub mod executor;
pub mod notify;
pub mod outcome;
pub mod request;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::WocClient;
pub use error::ApiError;
pub use executor::Executor;
pub use notify::{LogNotifier, Notifier, RecordingNotifier};
pub use outcome::Outcome;
pub use request::{ApiRequest, HttpRequest, HttpResponse};
pub use transport::{ReqwestTransport, Transport};

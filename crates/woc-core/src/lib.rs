//! Core library for the Winter of Code client.
//!
//! Everything network-facing goes through [`api::Executor`], which takes an
//! explicit [`auth::SessionContext`] rather than reading global state.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;

pub use api::{ApiError, ApiRequest, Executor, Outcome, WocClient};
pub use auth::{SessionContext, SessionData};
pub use config::Config;

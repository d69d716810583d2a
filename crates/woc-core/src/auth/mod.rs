//! Authentication module for managing the signed-in user's session.
//!
//! This module provides:
//! - `SessionContext`: shared, explicitly passed handle to the credentials
//! - `SessionStore`: encrypted on-disk copy of the session between runs
//! - `CredentialStore`: OS keychain access for the session key
//! - `parse_callback`: GitHub account-linking redirect handling

pub mod callback;
pub mod credentials;
pub mod session;
pub mod vault;

pub use callback::{parse_callback, CallbackOutcome};
pub use credentials::CredentialStore;
pub use session::{SessionContext, SessionData, SessionStore};
pub use vault::SessionCipher;

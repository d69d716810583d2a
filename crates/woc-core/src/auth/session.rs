use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, warn};

use super::vault::SessionCipher;

/// Session file name in the data directory
const SESSION_FILE: &str = "session.bin";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: String,
    /// Empty until a GitHub account is linked
    #[serde(default)]
    pub github_username: String,
    pub email: String,
    #[serde(default)]
    pub bounty: i64,
    #[serde(default = "Utc::now")]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl SessionData {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        github_username: impl Into<String>,
        email: impl Into<String>,
        bounty: i64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            github_username: github_username.into(),
            email: email.into(),
            bounty,
            created_at: Utc::now(),
        }
    }

    pub fn has_linked_github(&self) -> bool {
        !self.github_username.is_empty()
    }

    /// GitHub handle when linked, email otherwise
    pub fn display_name(&self) -> &str {
        if self.has_linked_github() {
            &self.github_username
        } else {
            &self.email
        }
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.has_linked_github()
            .then(|| format!("https://github.com/{}.png", self.github_username))
    }
}

/// Handle to the signed-in user's credentials.
///
/// Created once at startup and handed to every executor. Clones share the
/// same state, so a token refreshed by one call is seen by all others.
#[derive(Clone, Default)]
pub struct SessionContext {
    data: Arc<RwLock<Option<SessionData>>>,
    refresh_lock: Arc<Mutex<()>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(data: SessionData) -> Self {
        Self {
            data: Arc::new(RwLock::new(Some(data))),
            refresh_lock: Arc::default(),
        }
    }

    pub async fn set(&self, data: SessionData) {
        debug!(email = %data.email, "Session set");
        *self.data.write().await = Some(data);
    }

    /// Drop the credentials. Returns whether a session was present.
    pub async fn clear(&self) -> bool {
        let previous = self.data.write().await.take();
        if previous.is_some() {
            debug!("Session cleared");
        }
        previous.is_some()
    }

    pub async fn snapshot(&self) -> Option<SessionData> {
        self.data.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.access_token().await.is_some()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.data
            .read()
            .await
            .as_ref()
            .map(|d| d.access_token.clone())
            .filter(|t| !t.is_empty())
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.data
            .read()
            .await
            .as_ref()
            .map(|d| d.refresh_token.clone())
            .filter(|t| !t.is_empty())
    }

    /// Replace the access token in place. No-op when signed out.
    pub async fn update_access_token(&self, token: String) -> bool {
        match self.data.write().await.as_mut() {
            Some(data) => {
                data.access_token = token;
                true
            }
            None => false,
        }
    }

    /// Serialises token refreshes across every clone of this context.
    pub(crate) async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.refresh_lock.lock().await
    }
}

/// Encrypted on-disk copy of the session, kept between runs.
pub struct SessionStore {
    data_dir: PathBuf,
    cipher: SessionCipher,
}

impl SessionStore {
    pub fn new(data_dir: PathBuf, cipher: SessionCipher) -> Self {
        Self { data_dir, cipher }
    }

    /// Load session from disk
    pub fn load(&self) -> Result<Option<SessionData>> {
        let path = self.session_path();
        if !path.exists() {
            return Ok(None);
        }

        let sealed = std::fs::read(&path).context("Failed to read session file")?;
        let contents = self.cipher.open(&sealed)?;
        let data: SessionData =
            serde_json::from_slice(&contents).context("Failed to parse session file")?;
        Ok(Some(data))
    }

    /// Save session to disk
    pub fn save(&self, data: &SessionData) -> Result<()> {
        let path = self.session_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_vec(data)?;
        let sealed = self.cipher.seal(&contents)?;
        std::fs::write(path, sealed).context("Failed to write session file")?;
        Ok(())
    }

    /// Remove the session file
    pub fn clear(&self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Mirror the context to disk: save when signed in, delete when not.
    pub async fn persist(&self, context: &SessionContext) -> Result<()> {
        match context.snapshot().await {
            Some(data) => self.save(&data),
            None => self.clear(),
        }
    }

    /// Build a context seeded from disk. An unreadable file is discarded.
    pub fn restore(&self) -> SessionContext {
        match self.load() {
            Ok(Some(data)) => SessionContext::with_data(data),
            Ok(None) => SessionContext::new(),
            Err(e) => {
                debug!(error = %e, "Discarding unreadable session file");
                if let Err(e) = self.clear() {
                    warn!(error = %e, "Failed to remove unreadable session file");
                }
                SessionContext::new()
            }
        }
    }

    fn session_path(&self) -> PathBuf {
        self.data_dir.join(SESSION_FILE)
    }
}

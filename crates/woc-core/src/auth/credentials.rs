use anyhow::{anyhow, Context, Result};
use keyring::Entry;
use tracing::info;

use super::vault::{SessionCipher, KEY_LEN};

const SERVICE_NAME: &str = "woc";

/// Keychain account holding the session encryption key
const SESSION_KEY_ACCOUNT: &str = "session-key";

pub struct CredentialStore;

impl CredentialStore {
    /// Fetch the session key from the OS keychain, creating one on first use
    pub fn session_key() -> Result<[u8; KEY_LEN]> {
        let entry = Entry::new(SERVICE_NAME, SESSION_KEY_ACCOUNT)
            .context("Failed to create keyring entry")?;

        match entry.get_secret() {
            Ok(secret) => secret
                .try_into()
                .map_err(|_| anyhow!("Stored session key has the wrong length")),
            Err(keyring::Error::NoEntry) => {
                let key = SessionCipher::generate_key();
                entry
                    .set_secret(&key)
                    .context("Failed to store session key in keychain")?;
                info!("Created new session key in keychain");
                Ok(key)
            }
            Err(e) => Err(e).context("Failed to retrieve session key from keychain"),
        }
    }

    /// Cipher for the session file, keyed from the keychain
    pub fn session_cipher() -> Result<SessionCipher> {
        Ok(SessionCipher::new(&Self::session_key()?))
    }
}

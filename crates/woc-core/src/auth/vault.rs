use anyhow::{anyhow, Result};
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;

/// Key length for ChaCha20-Poly1305
pub const KEY_LEN: usize = 32;

const NONCE_LEN: usize = 12;

/// Seals the session file. Layout on disk is `nonce || ciphertext`.
#[derive(Clone)]
pub struct SessionCipher {
    cipher: ChaCha20Poly1305,
}

impl SessionCipher {
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(key)),
        }
    }

    pub fn generate_key() -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext)
            .map_err(|_| anyhow!("Failed to encrypt session"))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_LEN {
            return Err(anyhow!("Session file is truncated"));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| anyhow!("Failed to decrypt session (wrong key or corrupted file)"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_and_open() {
        let cipher = SessionCipher::new(&[7u8; KEY_LEN]);
        let sealed = cipher.seal(b"refresh-token").unwrap();
        assert_ne!(&sealed[NONCE_LEN..], b"refresh-token");
        assert_eq!(cipher.open(&sealed).unwrap(), b"refresh-token");
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let sealed = SessionCipher::new(&[1u8; KEY_LEN]).seal(b"secret").unwrap();
        assert!(SessionCipher::new(&[2u8; KEY_LEN]).open(&sealed).is_err());
    }

    #[test]
    fn test_tampering_is_detected() {
        let cipher = SessionCipher::new(&SessionCipher::generate_key());
        let mut sealed = cipher.seal(b"secret").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xff;
        assert!(cipher.open(&sealed).is_err());
        assert!(cipher.open(&sealed[..4]).is_err());
    }
}

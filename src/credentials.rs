//! Encrypted credential cache.
//!
//! Tokens are kept in the `credentials` table, one row per service, as
//! base64 text of `nonce || AES-256-GCM ciphertext`. The key comes from the
//! caller (usually `SPOTIFY_CACHE_KEY`); it is never generated or rotated
//! here.

use std::path::Path;

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, AeadCore, KeyInit, OsRng},
};
use base64::{
    Engine,
    engine::general_purpose::{STANDARD, URL_SAFE},
};
use rusqlite::{Connection, OptionalExtension};
use serde::{Serialize, de::DeserializeOwned};

use crate::{error::CacheError, store};

const NONCE_LEN: usize = 12;

pub struct CredentialCache {
    conn: Connection,
    cipher: Aes256Gcm,
}

impl CredentialCache {
    /// Opens the cache inside the database at `path`.
    pub fn open(path: &Path, key: &str) -> Result<Self, CacheError> {
        let cipher = cipher_from_key(key)?;
        let conn = store::open(path)?;
        Ok(Self { conn, cipher })
    }

    /// Wraps an existing connection, creating the table if needed.
    pub fn new(conn: Connection, key: &str) -> Result<Self, CacheError> {
        let cipher = cipher_from_key(key)?;
        store::init_schema(&conn)?;
        Ok(Self { conn, cipher })
    }

    /// Decrypts the cached value for `service`, if any.
    ///
    /// # Errors
    ///
    /// [`CacheError::Decrypt`] when the stored blob was written with another
    /// key or is corrupt.
    pub fn get<T: DeserializeOwned>(&self, service: &str) -> Result<Option<T>, CacheError> {
        let stored: Option<String> = self
            .conn
            .query_row(
                "SELECT creds FROM credentials WHERE service = ?1 LIMIT 1",
                [service],
                |row| row.get(0),
            )
            .optional()?;

        let Some(stored) = stored else {
            return Ok(None);
        };

        let plaintext = self.decrypt(service, &stored)?;
        Ok(Some(serde_json::from_slice(&plaintext)?))
    }

    /// Stores `value` for `service`, dropping whatever was there before.
    pub fn set<T: Serialize>(&mut self, service: &str, value: &T) -> Result<(), CacheError> {
        let plaintext = serde_json::to_vec(value)?;
        let encrypted = self.encrypt(service, &plaintext)?;

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM credentials WHERE service = ?1", [service])?;
        tx.execute(
            "INSERT INTO credentials (service, creds) VALUES (?1, ?2)",
            [service, encrypted.as_str()],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn encrypt(&self, service: &str, plaintext: &[u8]) -> Result<String, CacheError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| CacheError::Encrypt(service.to_string()))?;

        let mut blob = nonce.to_vec();
        blob.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(blob))
    }

    fn decrypt(&self, service: &str, stored: &str) -> Result<Vec<u8>, CacheError> {
        let blob = STANDARD
            .decode(stored.trim())
            .map_err(|_| CacheError::Decrypt(service.to_string()))?;
        if blob.len() <= NONCE_LEN {
            return Err(CacheError::Decrypt(service.to_string()));
        }

        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CacheError::Decrypt(service.to_string()))
    }
}

/// Builds the cipher from a base64 key (standard or URL-safe alphabet) that
/// decodes to exactly 32 bytes.
fn cipher_from_key(key: &str) -> Result<Aes256Gcm, CacheError> {
    let key = key.trim();
    if key.is_empty() {
        return Err(CacheError::MissingKey);
    }

    let bytes = URL_SAFE
        .decode(key)
        .or_else(|_| STANDARD.decode(key))
        .map_err(|_| CacheError::InvalidKey)?;

    Aes256Gcm::new_from_slice(&bytes).map_err(|_| CacheError::InvalidKey)
}

/// Generates a fresh random key in the format [`CredentialCache`] expects.
pub fn generate_key() -> String {
    let key = Aes256Gcm::generate_key(&mut OsRng);
    URL_SAFE.encode(key)
}

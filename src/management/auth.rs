use chrono::Utc;

use crate::{
    config::Settings,
    credentials::CredentialCache,
    error::{CacheError, SpotifyError},
    spotify,
    types::Token,
    warning,
};

/// Key of the Spotify token inside the credential cache.
pub const CREDENTIAL_SERVICE: &str = "spotify";

/// Tokens are refreshed this many seconds before they actually expire.
const EXPIRY_MARGIN_SECS: u64 = 240;

/// Holds the current token and refreshes it through the credential cache.
pub struct TokenManager {
    token: Token,
    cache: CredentialCache,
    settings: Settings,
}

impl TokenManager {
    pub fn new(token: Token, cache: CredentialCache, settings: &Settings) -> Self {
        TokenManager {
            token,
            cache,
            settings: settings.clone(),
        }
    }

    /// Loads the token cached by a previous `auth` run.
    pub fn load(cache: CredentialCache, settings: &Settings) -> Result<Self, SpotifyError> {
        let token: Token = cache.get(CREDENTIAL_SERVICE)?.ok_or_else(|| {
            SpotifyError::Auth("no cached token, run `smartlists auth` first".to_string())
        })?;
        Ok(Self::new(token, cache, settings))
    }

    pub fn persist(&mut self) -> Result<(), CacheError> {
        self.cache.set(CREDENTIAL_SERVICE, &self.token)
    }

    /// Access token that is valid for at least a few more minutes.
    pub async fn get_valid_token(&mut self) -> Result<String, SpotifyError> {
        if self.is_expired_at(Utc::now().timestamp() as u64) {
            let refreshed =
                spotify::auth::refresh_token(&self.settings, &self.token.refresh_token).await?;
            self.token = refreshed;
            if let Err(e) = self.persist() {
                warning!("Failed to save refreshed token: {}", e);
            }
        }

        Ok(self.token.access_token.clone())
    }

    pub fn is_expired_at(&self, now: u64) -> bool {
        now + EXPIRY_MARGIN_SECS >= self.token.obtained_at + self.token.expires_in
    }

    pub fn current_token(&self) -> &Token {
        &self.token
    }
}

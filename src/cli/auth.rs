use crate::{
    config::Settings, credentials, error, management::TokenManager, spotify, success,
};

use super::{open_cache, require_spotify_app};

pub async fn auth(settings: &Settings) {
    require_spotify_app(settings);
    let cache = open_cache(settings);

    let token = match spotify::auth::authorize(settings).await {
        Ok(token) => token,
        Err(e) => error!("Authentication failed: {}", e),
    };

    let mut token_manager = TokenManager::new(token, cache, settings);
    if let Err(e) = token_manager.persist() {
        error!("Failed to save token to cache: {}", e);
    }

    success!("Authentication successful!");
}

/// Prints a freshly generated credential cache key.
pub fn print_new_key() {
    println!("{}", credentials::generate_key());
}

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use reqwest::{Client, Url};
use tokio::sync::Mutex;

use crate::{
    config::Settings,
    error::SpotifyError,
    server::start_api_server,
    types::{PkceToken, Token, TokenResponse},
    utils, warning,
};

/// How long the callback server waits for the user to finish in the browser.
pub const AUTH_TIMEOUT_SECS: u64 = 120;

/// Runs the OAuth 2.0 PKCE authorization flow and returns the new token.
///
/// 1. Generates a code verifier and its S256 challenge
/// 2. Starts the local callback server on `settings.server_address`
/// 3. Opens the authorization URL in the default browser
/// 4. Waits until the callback handler has exchanged the code for a token
///
/// Persisting the token is left to the caller.
///
/// # Errors
///
/// [`SpotifyError::Config`] without a client id or redirect URI,
/// [`SpotifyError::Auth`] when the authorization URL cannot be built or no
/// token arrives within [`AUTH_TIMEOUT_SECS`].
pub async fn authorize(settings: &Settings) -> Result<Token, SpotifyError> {
    let code_verifier = utils::generate_code_verifier();
    let code_challenge = utils::generate_code_challenge(&code_verifier);
    let auth_url = authorize_url(settings, &code_challenge)?;

    let shared_state: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(Some(PkceToken {
        code_verifier,
        token: None,
    })));

    let server_state = Arc::clone(&shared_state);
    let server_settings = Arc::new(settings.clone());
    let server = tokio::spawn(async move {
        if let Err(e) = start_api_server(server_state, server_settings).await {
            warning!("Callback server stopped: {}", e);
        }
    });

    if webbrowser::open(auth_url.as_str()).is_err() {
        warning!(
            "Failed to open browser. Please navigate to the following URL manually:\n{}",
            auth_url
        )
    }

    let token = wait_for_token(shared_state).await;
    server.abort();

    token.ok_or_else(|| SpotifyError::Auth("authentication failed or timed out".to_string()))
}

/// Builds the authorize URL with properly encoded query parameters.
pub fn authorize_url(settings: &Settings, code_challenge: &str) -> Result<Url, SpotifyError> {
    Url::parse_with_params(
        &settings.auth_url,
        &[
            ("client_id", settings.require_client_id()?),
            ("response_type", "code"),
            ("redirect_uri", settings.require_redirect_uri()?),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
            ("scope", settings.scope.as_str()),
        ],
    )
    .map_err(|e| SpotifyError::Auth(format!("invalid authorize url: {}", e)))
}

async fn wait_for_token(shared_state: Arc<Mutex<Option<PkceToken>>>) -> Option<Token> {
    use std::time::Instant;

    let max_wait = Duration::from_secs(AUTH_TIMEOUT_SECS);
    let start = Instant::now();

    while start.elapsed() < max_wait {
        let lock = shared_state.lock().await;
        if let Some(token) = lock.as_ref().and_then(|p| p.token.as_ref()) {
            return Some(token.clone());
        }
        drop(lock);
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    None
}

/// Exchanges a refresh token for a fresh access token.
///
/// Spotify usually omits `refresh_token` in the response; the previous one is
/// kept in that case.
pub async fn refresh_token(settings: &Settings, refresh_token: &str) -> Result<Token, SpotifyError> {
    let client_id = settings.require_client_id()?;
    let mut request = Client::new().post(&settings.token_url).form(&[
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", client_id),
    ]);
    if let Some(secret) = &settings.client_secret {
        request = request.basic_auth(client_id, Some(secret));
    }

    let response = request.send().await?.error_for_status()?;
    let json: TokenResponse = response.json().await?;

    Ok(token_from_response(json, Some(refresh_token)))
}

/// Exchanges the authorization code from the callback for a token.
pub async fn exchange_code_pkce(
    settings: &Settings,
    code: &str,
    verifier: &str,
) -> Result<Token, SpotifyError> {
    let response = Client::new()
        .post(&settings.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("client_id", settings.require_client_id()?),
            ("code", code),
            ("code_verifier", verifier),
            ("redirect_uri", settings.require_redirect_uri()?),
        ])
        .send()
        .await?
        .error_for_status()?;

    let json: TokenResponse = response.json().await?;
    if json.refresh_token.is_none() {
        return Err(SpotifyError::Auth(
            "token response did not contain a refresh token".to_string(),
        ));
    }

    Ok(token_from_response(json, None))
}

/// Turns a token endpoint response into a [`Token`] stamped with the current
/// time, falling back to `previous_refresh` when no new refresh token was
/// issued.
pub fn token_from_response(response: TokenResponse, previous_refresh: Option<&str>) -> Token {
    let refresh_token = response
        .refresh_token
        .or_else(|| previous_refresh.map(str::to_string))
        .unwrap_or_default();

    Token {
        access_token: response.access_token,
        refresh_token,
        scope: response.scope,
        expires_in: response.expires_in,
        obtained_at: Utc::now().timestamp() as u64,
    }
}

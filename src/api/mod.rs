//! # API Module
//!
//! HTTP endpoints served by the short-lived local server that `smartlists auth`
//! starts while the user authorizes the app in the browser.
//!
//! - [`callback`] - receives the authorization code from Spotify's redirect and
//!   exchanges it for a token using the PKCE verifier held in shared state
//! - [`health`] - status, version and whether the callback is still awaited
//!
//! ```rust,ignore
//! use axum::{Router, routing::get};
//! use smartlists::api::{callback, health};
//!
//! let app = Router::new()
//!     .route("/callback", get(callback))
//!     .route("/health", get(health));
//! ```

mod callback;
mod health;

pub use callback::callback;
pub use health::health;

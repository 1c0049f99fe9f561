mod auth;

pub use auth::CREDENTIAL_SERVICE;
pub use auth::TokenManager;

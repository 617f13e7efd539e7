pub mod auth;
pub mod cleanup;
pub mod login_history;
pub mod refresh_token;
pub mod session;

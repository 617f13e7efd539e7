pub mod auth;
pub mod login_history;
pub mod sessions;

pub mod login_history;
pub mod refresh_token;
pub mod session;
pub mod user;

pub mod device;
pub mod jwt;
pub mod password;

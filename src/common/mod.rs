pub mod middleware_auth;
pub mod upload;

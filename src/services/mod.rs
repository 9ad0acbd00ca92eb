pub mod access_service;
pub mod auth_service;
pub mod context;
pub mod mail_service;
pub mod password_reset_service;
pub mod role_service;
pub mod user_service;

pub use context::ServiceContext;

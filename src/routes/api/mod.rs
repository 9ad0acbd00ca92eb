pub mod auth;
pub mod oauth;
pub mod profile;
mod query;
pub mod roles;
mod router;
pub mod users;

pub use router::router;

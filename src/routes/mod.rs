pub mod api;
mod entry;
pub mod middleware;

pub use entry::{API_PREFIX, app, router};
pub use middleware::{
    AuthGuard, Authorized, CurrentUser, catch_panic_layer, envelope_middleware, json_error_middleware,
};

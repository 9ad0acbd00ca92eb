mod envelope;
mod guards;
mod json_error;
mod panic;

pub use envelope::envelope_middleware;
pub use guards::{AuthGuard, Authorized, CurrentUser};
pub use json_error::json_error_middleware;
pub use panic::catch_panic_layer;

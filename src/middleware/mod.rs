pub mod auth;

pub use auth::{ErrorResponse, require_user_from_headers};

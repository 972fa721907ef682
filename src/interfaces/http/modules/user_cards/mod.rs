//! Self-service card operations (role USER)

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;

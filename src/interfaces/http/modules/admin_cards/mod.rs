//! Card and user administration (role ADMIN)

pub mod dto;
pub mod handlers;

pub use dto::*;
pub use handlers::*;

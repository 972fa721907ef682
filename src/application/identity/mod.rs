//! Identity module: accounts and authentication
//!
//! `IdentityService` handles signup, signin and the bootstrap admin;
//! `UserDirectoryService` is the admin-facing read side.

pub mod directory;
pub mod service;

pub use directory::{UserDirectoryService, UserView};
pub use service::{AuthResult, IdentityService};

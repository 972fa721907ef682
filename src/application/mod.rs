//! Application layer: use-case orchestration over the domain repositories

pub mod cards;
pub mod identity;

pub use cards::{BalanceView, CardAccountService, CardView, CreateCard};
pub use identity::{AuthResult, IdentityService, UserDirectoryService, UserView};

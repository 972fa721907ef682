//! Database entities module

pub mod card;
pub mod user;

pub use card::Entity as Card;
pub use user::Entity as User;

//! Database repository implementations
//!
//! Per-aggregate SeaORM repositories.

pub mod card_repository;
pub mod user_repository;

pub use card_repository::SeaOrmCardRepository;
pub use user_repository::SeaOrmUserRepository;

pub mod card;
pub mod user;

pub use card::{
    from_minor_units, mask, to_minor_units, Card, CardFilter, CardOwner, CardRepository,
    CardStatus, NewCard, TransferUnit, MONEY_SCALE,
};
pub use user::{NewUser, User, UserRepository, UserRole};

pub use crate::shared::{DomainError, DomainResult};

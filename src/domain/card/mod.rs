//! Card aggregate
//!
//! Contains the Card entity, masking, and repository interfaces.

pub mod model;
pub mod repository;

pub use model::{
    from_minor_units, mask, to_minor_units, Card, CardOwner, CardStatus, MONEY_SCALE,
};
pub use repository::{CardFilter, CardRepository, NewCard, TransferUnit};

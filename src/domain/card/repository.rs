//! Card repository interface

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::model::{Card, CardStatus};
use crate::domain::DomainResult;
use crate::shared::{PageRequest, PaginatedResult};

/// Conjunctive list filter; `None` fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CardFilter {
    pub owner_id: Option<i64>,
    pub status: Option<CardStatus>,
}

#[derive(Debug, Clone)]
pub struct NewCard {
    pub card_number_ciphertext: String,
    pub owner_id: i64,
    pub expiration_date: NaiveDate,
    pub status: CardStatus,
    pub balance: Decimal,
}

#[async_trait]
pub trait CardRepository: Send + Sync {
    async fn insert(&self, card: NewCard) -> DomainResult<Card>;
    async fn find_by_id(&self, id: i64) -> DomainResult<Option<Card>>;

    /// Cards matching `filter`, ordered by id ascending.
    async fn list(&self, filter: CardFilter, page: PageRequest)
        -> DomainResult<PaginatedResult<Card>>;

    /// Writes the status column only. Returns false if the card is gone.
    async fn update_status(&self, id: i64, status: CardStatus) -> DomainResult<bool>;

    /// Returns false if the card did not exist.
    async fn delete(&self, id: i64) -> DomainResult<bool>;

    /// Lock both cards (in ascending id order) for a balance transfer.
    ///
    /// Missing cards surface as `NotFound { entity: "source card" }` or
    /// `NotFound { entity: "target card" }`.
    async fn begin_transfer(
        &self,
        source_id: i64,
        target_id: i64,
    ) -> DomainResult<Box<dyn TransferUnit>>;
}

/// Both cards of a transfer, locked until commit or drop.
///
/// Dropping the unit without calling `commit` discards it and changes nothing.
#[async_trait]
pub trait TransferUnit: Send {
    fn source(&self) -> &Card;
    fn target(&self) -> &Card;

    async fn commit(
        self: Box<Self>,
        source_balance: Decimal,
        target_balance: Decimal,
    ) -> DomainResult<()>;
}

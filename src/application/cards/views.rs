//! Read models returned by the card service

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{mask, Card, CardStatus};
use crate::infrastructure::crypto::CardNumberCodec;
use crate::shared::DomainResult;

/// Card as it leaves the service: the number is always masked
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub id: i64,
    #[schema(example = "**** **** **** 5678")]
    pub card_number: String,
    pub owner_email: String,
    pub expiration_date: NaiveDate,
    pub status: CardStatus,
    #[schema(value_type = String, example = "150.00")]
    pub balance: Decimal,
}

impl CardView {
    /// Decrypt, mask, drop the plaintext. A decode failure is an error,
    /// never a fully-masked placeholder.
    pub fn project(card: Card, codec: &CardNumberCodec) -> DomainResult<Self> {
        let plaintext = codec.decode(&card.card_number_ciphertext)?;
        Ok(Self {
            id: card.id,
            card_number: mask(Some(&plaintext)),
            owner_email: card.owner.email,
            expiration_date: card.expiration_date,
            status: card.status,
            balance: card.balance,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceView {
    pub id: i64,
    #[schema(value_type = String, example = "150.00")]
    pub balance: Decimal,
}

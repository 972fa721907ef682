//! Card domain entity

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

const FULLY_MASKED: &str = "**** **** **** ****";
const MASK_PREFIX: &str = "**** **** **** ";
const MIN_MASKABLE_LEN: usize = 16;

/// Balances and amounts carry at most this many fractional digits.
pub const MONEY_SCALE: u32 = 2;

/// Card lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardStatus {
    Active,
    Blocked,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Blocked => "BLOCKED",
        }
    }
}

impl std::fmt::Display for CardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Owner reference, loaded together with the card
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardOwner {
    pub id: i64,
    pub email: String,
}

/// A funding account record
#[derive(Debug, Clone)]
pub struct Card {
    pub id: i64,
    /// Stored form produced by `CardNumberCodec::encode`, never plaintext
    pub card_number_ciphertext: String,
    pub owner: CardOwner,
    pub expiration_date: NaiveDate,
    pub status: CardStatus,
    pub balance: Decimal,
}

impl Card {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner.id == user_id
    }

    pub fn is_active(&self) -> bool {
        self.status == CardStatus::Active
    }
}

/// Hide everything but the last four characters of a card number.
pub fn mask(card_number: Option<&str>) -> String {
    let Some(number) = card_number else {
        return FULLY_MASKED.to_string();
    };

    let len = number.chars().count();
    if len < MIN_MASKABLE_LEN {
        return FULLY_MASKED.to_string();
    }

    let last4: String = number.chars().skip(len - 4).collect();
    format!("{}{}", MASK_PREFIX, last4)
}

/// Exact amount in minor units (hundredths), as balances are persisted.
///
/// `None` when `amount` has more than [`MONEY_SCALE`] fractional digits or
/// its minor units do not fit in an `i64`.
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    let mut value = amount.normalize();
    if value.scale() > MONEY_SCALE {
        return None;
    }
    value.rescale(MONEY_SCALE);
    if value.scale() != MONEY_SCALE {
        return None;
    }
    i64::try_from(value.mantissa()).ok()
}

pub fn from_minor_units(minor: i64) -> Decimal {
    Decimal::new(minor, MONEY_SCALE)
}

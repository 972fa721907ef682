//! Admin card DTOs

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::application::CreateCard;
use crate::domain::CardStatus;
use crate::shared::is_valid_card_number;

fn validate_card_number(number: &str) -> Result<(), ValidationError> {
    if is_valid_card_number(number) {
        Ok(())
    } else {
        Err(ValidationError::new("card_number")
            .with_message("card number must be 16 to 19 digits".into()))
    }
}

fn validate_non_negative(balance: &Decimal) -> Result<(), ValidationError> {
    if *balance < Decimal::ZERO {
        return Err(ValidationError::new("balance").with_message("balance must not be negative".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    #[validate(custom(function = "validate_card_number"))]
    #[schema(example = "1234567812345678")]
    pub card_number: String,
    #[validate(email(message = "invalid email format"))]
    pub owner_email: String,
    #[schema(value_type = String, format = Date, example = "2030-12-31")]
    pub expiration_date: NaiveDate,
    pub status: CardStatus,
    #[validate(custom(function = "validate_non_negative"))]
    #[schema(value_type = String, example = "150.00")]
    pub balance: Decimal,
}

impl From<CreateCardRequest> for CreateCard {
    fn from(req: CreateCardRequest) -> Self {
        Self {
            owner_email: req.owner_email,
            card_number: req.card_number,
            expiration_date: req.expiration_date,
            status: req.status,
            balance: req.balance,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListCardsQuery {
    /// Only cards of this owner (exact email)
    pub owner_email: Option<String>,
    #[param(value_type = Option<String>, example = "ACTIVE")]
    pub status: Option<CardStatus>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Exact email match
    pub email: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

//! Account holder DTOs

use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

fn validate_positive(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        return Err(ValidationError::new("amount").with_message("amount must be positive".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub source_card_id: i64,
    pub target_card_id: i64,
    #[validate(custom(function = "validate_positive"))]
    #[schema(value_type = String, example = "100.00")]
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_must_be_positive() {
        let parse = |amount: &str| -> TransferRequest {
            serde_json::from_value(serde_json::json!({
                "sourceCardId": 1,
                "targetCardId": 2,
                "amount": amount
            }))
            .unwrap()
        };

        assert!(parse("0.01").validate().is_ok());
        assert!(parse("0").validate().is_err());
        assert!(parse("-10").validate().is_err());
    }
}

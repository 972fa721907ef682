use crate::shared::PageRequest;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Clamp user-supplied paging input to a sane `PageRequest`.
pub fn validate_pagination(page: Option<u32>, limit: Option<u32>) -> PageRequest {
    validate_pagination_with(page, limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
}

pub fn validate_pagination_with(
    page: Option<u32>,
    limit: Option<u32>,
    default_limit: u32,
    max_limit: u32,
) -> PageRequest {
    let max_limit = max_limit.max(1);
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_limit).clamp(1, max_limit);
    PageRequest::new(page, limit)
}

/// Card numbers are 16 to 19 ASCII digits.
pub fn is_valid_card_number(number: &str) -> bool {
    (16..=19).contains(&number.len()) && number.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamps() {
        assert_eq!(validate_pagination(None, None), PageRequest::new(1, 20));
        assert_eq!(validate_pagination(Some(0), Some(0)), PageRequest::new(1, 1));
        assert_eq!(validate_pagination(Some(4), Some(500)), PageRequest::new(4, 100));
    }

    #[test]
    fn card_number_shape() {
        assert!(is_valid_card_number("1234567812345678"));
        assert!(is_valid_card_number("1234567812345678901"));
        assert!(!is_valid_card_number("123456781234567"));
        assert!(!is_valid_card_number("1234-5678-1234-5678"));
        assert!(!is_valid_card_number("12345678123456789012"));
    }
}

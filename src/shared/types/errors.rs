use thiserror::Error;

/// Card-number encryption failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("encryption key unavailable: {0}")]
    KeyUnavailable(String),

    #[error("malformed ciphertext: {0}")]
    Malformed(&'static str),

    #[error("ciphertext failed authentication")]
    Decrypt,

    #[error("encryption failed")]
    Encrypt,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity}")]
    NotFound { entity: &'static str },

    #[error("Card does not belong to the user")]
    Unauthorized,

    #[error("Insufficient funds for transfer")]
    InsufficientFunds,

    #[error("Invalid state: {0}")]
    InvalidState(&'static str),

    #[error("Card number codec failure: {0}")]
    Codec(#[from] CodecError),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn user_not_found() -> Self {
        Self::NotFound { entity: "user" }
    }

    pub fn card_not_found() -> Self {
        Self::NotFound { entity: "card" }
    }
}

impl From<sea_orm::DbErr> for DomainError {
    fn from(e: sea_orm::DbErr) -> Self {
        DomainError::Storage(e.to_string())
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

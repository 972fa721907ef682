//! Cryptographic helpers: card-number codec, JWT, password hashing

pub mod card_number;
pub mod jwt;
pub mod password;

pub use card_number::CardNumberCodec;

//! Card accounts: creation, listing, status lifecycle, balances, transfers

pub mod service;
pub mod views;

pub use service::{CardAccountService, CreateCard};
pub use views::{BalanceView, CardView};

//! # Card Bank Service
//!
//! Bank-card management backend: administrators issue, block, activate and
//! delete cards; account holders list their own cards, request blocks, check
//! balances and move money between their cards.
//!
//! ## Architecture
//!
//! - **domain**: Card and User entities, masking, repository traits
//! - **application**: Card account, identity and user directory services
//! - **infrastructure**: Card-number encryption, JWT/bcrypt, SeaORM and in-memory repositories
//! - **interfaces**: REST API (axum) with Swagger documentation
//! - **shared**: Errors, pagination, validation helpers, retry, shutdown

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{init_database, DatabaseConfig};

// Re-export API router
pub use interfaces::http::{create_api_router, ApiContext};

//! Client library for an IDRX crowdfunding marketplace. Campaign records
//! live on a REST backend; each funded campaign has an on-chain vault
//! contract deployed through a factory, and investments move IDRX through an
//! approve-then-invest token flow. Signing is delegated to a wallet-enabled
//! RPC endpoint.

pub mod api;
pub mod auth;
pub mod chain;
pub mod config;
pub mod error;
pub mod flows;
pub mod types;
pub mod units;

pub use api::ApiClient;
pub use auth::Session;
pub use config::AppConfig;
pub use error::AppError;

//! The module contains the errors the engine can throw.
//!
//! Client faults (`UnknownAsset`, `InvalidAmount`, `InsufficientBalance`,
//! `NoWalletsFound`, `TransactionNotFound`) are caused by the request and are
//! never retried by the engine. `TreasuryMissing` is a provisioning defect: a
//! correctly deployed system always has one treasury account per asset type.
//! `Database` covers transient storage failures; the unit of work is rolled
//! back in full, so retrying with the same idempotency key is safe.

use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("unknown asset: {0}")]
    UnknownAsset(String),
    #[error("insufficient balance: {0}")]
    InsufficientBalance(String),
    #[error("treasury account missing for asset: {0}")]
    TreasuryMissing(String),
    #[error("transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("no wallets found for owner: {0}")]
    NoWalletsFound(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::UnknownAsset(a), Self::UnknownAsset(b)) => a == b,
            (Self::InsufficientBalance(a), Self::InsufficientBalance(b)) => a == b,
            (Self::TreasuryMissing(a), Self::TreasuryMissing(b)) => a == b,
            (Self::TransactionNotFound(a), Self::TransactionNotFound(b)) => a == b,
            (Self::NoWalletsFound(a), Self::NoWalletsFound(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

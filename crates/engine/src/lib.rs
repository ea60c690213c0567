//! Ledger engine for virtual asset balances.
//!
//! The engine moves value between a per-asset treasury account and user
//! accounts through a double-entry ledger: every operation writes one
//! transaction row plus a balanced debit/credit pair of ledger entries, and
//! updates the denormalized account balances under row locks. Exactly-once
//! execution is keyed by a caller-supplied idempotency key.

pub use accounts::{Account, AccountKind, TREASURY_OWNER};
pub use asset_types::AssetType;
pub use error::EngineError;
pub use ledger_entries::{EntryType, LedgerEntry};
pub use ops::{
    AssetBalance, Engine, EngineBuilder, HistoryDirection, HistoryEntry, ProcessCmd,
    ProcessOutcome, TransactionResult,
};
pub use transactions::{OperationKind, Transaction, TransactionStatus};

pub mod accounts;
pub mod asset_types;
mod error;
pub mod ledger_entries;
mod ops;
pub mod transactions;

pub(crate) type ResultEngine<T> = Result<T, EngineError>;

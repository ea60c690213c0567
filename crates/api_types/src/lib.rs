//! Shared request/response types for the tesora HTTP API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod transaction {
    use super::*;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum OperationKind {
        Topup,
        Bonus,
        Spend,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum TransactionStatus {
        Completed,
        Failed,
    }

    /// Request body for `POST /topup`, `POST /bonus` and `POST /spend`.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct OperationNew {
        pub owner_id: String,
        /// Asset symbol, case-insensitive.
        pub asset: String,
        /// Amount in the asset's minor units, > 0.
        pub amount_minor: i64,
        /// At most one financial effect per key, regardless of retries.
        pub idempotency_key: String,
        pub reference_id: Option<String>,
        pub metadata: Option<serde_json::Value>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct TransactionResponse {
        pub id: Uuid,
        pub kind: OperationKind,
        pub status: TransactionStatus,
        pub amount_minor: i64,
        pub asset: String,
        /// Balance of the caller's own account after the operation.
        pub balance_after_minor: i64,
        pub created_at: DateTime<Utc>,
    }
}

pub mod wallet {
    use super::*;

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct AssetBalanceView {
        pub asset: String,
        pub asset_name: String,
        pub balance_minor: i64,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct BalancesResponse {
        pub balances: Vec<AssetBalanceView>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum Direction {
        In,
        Out,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct HistoryEntryView {
        pub transaction_id: Uuid,
        pub kind: super::transaction::OperationKind,
        pub direction: Direction,
        pub amount_minor: i64,
        pub asset: String,
        pub balance_after_minor: i64,
        pub reference_id: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct HistoryResponse {
        pub transactions: Vec<HistoryEntryView>,
    }
}

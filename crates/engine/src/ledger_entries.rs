//! Ledger entries.
//!
//! A [`LedgerEntry`] is one half of a balanced double-entry record: a debit
//! on the source account or a credit on the destination account, both
//! carrying the transaction's amount. Entries are append-only; account
//! balances are, in principle, re-derivable from them. `balance_after_minor`
//! snapshots the account's cached balance as of the entry, for point-in-time
//! reporting.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Debit,
    Credit,
}

impl EntryType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

impl TryFrom<&str> for EntryType {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "debit" => Ok(Self::Debit),
            "credit" => Ok(Self::Credit),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid entry type: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub transaction_id: Uuid,
    pub account_id: Uuid,
    pub entry_type: EntryType,
    pub amount_minor: i64,
    pub balance_after_minor: i64,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        transaction_id: Uuid,
        account_id: Uuid,
        entry_type: EntryType,
        amount_minor: i64,
        balance_after_minor: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transaction_id,
            account_id,
            entry_type,
            amount_minor,
            balance_after_minor,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transaction_id: String,
    pub account_id: String,
    pub entry_type: String,
    pub amount_minor: i64,
    pub balance_after_minor: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transactions::Entity",
        from = "Column::TransactionId",
        to = "super::transactions::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Transactions,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Accounts,
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&LedgerEntry> for ActiveModel {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: ActiveValue::Set(entry.id.to_string()),
            transaction_id: ActiveValue::Set(entry.transaction_id.to_string()),
            account_id: ActiveValue::Set(entry.account_id.to_string()),
            entry_type: ActiveValue::Set(entry.entry_type.as_str().to_string()),
            amount_minor: ActiveValue::Set(entry.amount_minor),
            balance_after_minor: ActiveValue::Set(entry.balance_after_minor),
            created_at: ActiveValue::Set(entry.created_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let invalid = || EngineError::KeyNotFound("ledger entry not exists".to_string());
        Ok(Self {
            id: Uuid::parse_str(&model.id).map_err(|_| invalid())?,
            transaction_id: Uuid::parse_str(&model.transaction_id).map_err(|_| invalid())?,
            account_id: Uuid::parse_str(&model.account_id).map_err(|_| invalid())?,
            entry_type: EntryType::try_from(model.entry_type.as_str())?,
            amount_minor: model.amount_minor,
            balance_after_minor: model.balance_after_minor,
            created_at: model.created_at,
        })
    }
}

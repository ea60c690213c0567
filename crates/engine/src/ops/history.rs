//! Transaction history and lookup projections.

use std::collections::HashMap;

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Account, AccountKind, EngineError, EntryType, LedgerEntry, OperationKind, ResultEngine,
    accounts, asset_types, ledger_entries, transactions,
};

use super::{Engine, TransactionResult, with_tx};

/// Whether value moved into or out of the owner's account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryDirection {
    In,
    Out,
}

/// One owner-side ledger entry, annotated for reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub transaction_id: Uuid,
    pub kind: OperationKind,
    pub direction: HistoryDirection,
    pub amount_minor: i64,
    pub asset: String,
    /// The owner's cached balance as of this entry.
    pub balance_after_minor: i64,
    pub reference_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Engine {
    /// Looks up a completed transaction by id.
    pub async fn transaction_by_id(&self, id: Uuid) -> ResultEngine<TransactionResult> {
        with_tx!(self, |db_tx| {
            let model = transactions::Entity::find_by_id(id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::TransactionNotFound(id.to_string()))?;
            self.result_from_model(&db_tx, model).await
        })
    }

    /// The owner's ledger entries across all assets, newest first.
    ///
    /// Direction is `in` when the owner's account was credited and `out`
    /// when it was debited. An owner without accounts gets an empty list.
    pub async fn history(&self, owner_id: &str) -> ResultEngine<Vec<HistoryEntry>> {
        with_tx!(self, |db_tx| {
            let owned: Vec<(accounts::Model, Option<asset_types::Model>)> =
                accounts::Entity::find()
                    .filter(accounts::Column::OwnerId.eq(owner_id.to_string()))
                    .filter(accounts::Column::Kind.eq(AccountKind::User.as_str()))
                    .find_also_related(asset_types::Entity)
                    .all(&db_tx)
                    .await?;
            if owned.is_empty() {
                return Ok(Vec::new());
            }

            let mut symbol_by_account: HashMap<Uuid, String> =
                HashMap::with_capacity(owned.len());
            for (account_model, asset) in owned {
                let asset = asset
                    .ok_or_else(|| EngineError::KeyNotFound("asset type not exists".to_string()))?;
                let account = Account::try_from(account_model)?;
                symbol_by_account.insert(account.id, asset.symbol);
            }

            let account_ids: Vec<String> =
                symbol_by_account.keys().map(Uuid::to_string).collect();
            let rows: Vec<(ledger_entries::Model, Option<transactions::Model>)> =
                ledger_entries::Entity::find()
                    .filter(ledger_entries::Column::AccountId.is_in(account_ids))
                    .find_also_related(transactions::Entity)
                    .order_by_desc(ledger_entries::Column::CreatedAt)
                    .all(&db_tx)
                    .await?;

            let mut out = Vec::with_capacity(rows.len());
            for (entry_model, tx_model) in rows {
                let Some(tx_model) = tx_model else { continue };
                let entry = LedgerEntry::try_from(entry_model)?;
                let asset = symbol_by_account
                    .get(&entry.account_id)
                    .cloned()
                    .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
                let direction = match entry.entry_type {
                    EntryType::Credit => HistoryDirection::In,
                    EntryType::Debit => HistoryDirection::Out,
                };
                out.push(HistoryEntry {
                    transaction_id: entry.transaction_id,
                    kind: OperationKind::try_from(tx_model.kind.as_str())?,
                    direction,
                    amount_minor: entry.amount_minor,
                    asset,
                    balance_after_minor: entry.balance_after_minor,
                    reference_id: tx_model.reference_id,
                    created_at: entry.created_at,
                });
            }
            Ok(out)
        })
    }
}

//! The ledger transaction engine.
//!
//! [`Engine::process`] executes one `topup`/`bonus`/`spend` operation as a
//! single unit of work: idempotency lookup, asset and account resolution,
//! ordered lock acquisition, balance validation, and the atomic write of the
//! transaction row, its balanced debit/credit entry pair, and both cached
//! account balances. Replays of an already-used idempotency key are read-only
//! and return the original result unchanged.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, EntryType, LedgerEntry, OperationKind, ResultEngine, Transaction,
    TransactionStatus, accounts, asset_types, ledger_entries, transactions,
    transactions::FlowDirection,
};

use super::{Engine, with_tx};

/// One operation request.
#[derive(Clone, Debug)]
pub struct ProcessCmd {
    pub kind: OperationKind,
    pub owner_id: String,
    /// Asset symbol, case-insensitive.
    pub asset: String,
    pub amount_minor: i64,
    /// Caller-supplied token, globally scoped: at most one financial effect
    /// per key, regardless of retries.
    pub idempotency_key: String,
    pub reference_id: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Normalized operation response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionResult {
    pub id: Uuid,
    pub kind: OperationKind,
    pub status: TransactionStatus,
    pub amount_minor: i64,
    pub asset: String,
    /// Balance of the user's own account after the operation: the source
    /// for `spend`, the destination for `topup`/`bonus`.
    pub balance_after_minor: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub result: TransactionResult,
    /// True when the idempotency key had already been executed and this
    /// outcome is the stored result, not a new financial effect.
    pub replayed: bool,
}

impl Engine {
    /// Executes one ledger operation with exactly-once semantics.
    ///
    /// Everything between the idempotency lookup and the commit happens in
    /// one storage transaction; on any failure no row survives. Lock order
    /// over the two account rows is ascending id, so two operations sharing
    /// an account serialize on the lower-ordered lock and no waiting cycle
    /// can form.
    pub async fn process(&self, cmd: ProcessCmd) -> ResultEngine<ProcessOutcome> {
        if cmd.amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        let idempotency_key = cmd.idempotency_key.trim().to_string();
        if idempotency_key.is_empty() {
            return Err(EngineError::InvalidAmount(
                "idempotency_key must not be empty".to_string(),
            ));
        }
        let metadata = cmd
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|_| EngineError::InvalidAmount("invalid metadata".to_string()))?;

        with_tx!(self, |db_tx| {
            self.process_in_tx(&db_tx, &cmd, &idempotency_key, metadata)
                .await
        })
    }

    async fn process_in_tx(
        &self,
        db_tx: &DatabaseTransaction,
        cmd: &ProcessCmd,
        idempotency_key: &str,
        metadata: Option<String>,
    ) -> ResultEngine<ProcessOutcome> {
        // Replays never re-execute the financial effect.
        if let Some(existing) = self.find_by_idempotency_key(db_tx, idempotency_key).await? {
            let result = self.result_from_model(db_tx, existing).await?;
            return Ok(ProcessOutcome {
                result,
                replayed: true,
            });
        }

        let asset = self.asset_by_symbol(db_tx, &cmd.asset).await?;
        let user_account = self
            .resolve_user_account(db_tx, &cmd.owner_id, &asset.id)
            .await?;
        let treasury = self
            .treasury_account(db_tx, &asset.id, &asset.symbol)
            .await?;

        let (source_id, destination_id) = match cmd.kind.flow() {
            FlowDirection::TreasuryToUser => (treasury.id, user_account.id),
            FlowDirection::UserToTreasury => (user_account.id, treasury.id),
        };

        // Both row locks are taken in ascending id order, whichever role the
        // accounts play; they release on commit or rollback.
        let (first, second) = if source_id <= destination_id {
            (source_id, destination_id)
        } else {
            (destination_id, source_id)
        };
        let first_locked = self.lock_account(db_tx, &first).await?;
        let second_locked = self.lock_account(db_tx, &second).await?;
        let (source, destination) = if first_locked.id == source_id {
            (first_locked, second_locked)
        } else {
            (second_locked, first_locked)
        };

        // Validate against the post-lock balance, never a stale read. The
        // same check covers the treasury: issuance draws down its seeded
        // float and stops when it is exhausted.
        if source.balance_minor < cmd.amount_minor {
            return Err(EngineError::InsufficientBalance(asset.symbol.clone()));
        }

        let new_source = source
            .balance_minor
            .checked_sub(cmd.amount_minor)
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;
        let new_destination = destination
            .balance_minor
            .checked_add(cmd.amount_minor)
            .ok_or_else(|| EngineError::InvalidAmount("balance overflow".to_string()))?;

        let created_at = Utc::now();
        let tx = Transaction::new(
            idempotency_key.to_string(),
            cmd.kind,
            cmd.amount_minor,
            asset.id,
            source.id,
            destination.id,
            cmd.reference_id.clone(),
            metadata,
            created_at,
        )?;

        if let Err(err) = transactions::ActiveModel::from(&tx).insert(db_tx).await {
            // Lost the unique-key race to a concurrent duplicate: serve the
            // winner's result instead of failing.
            if let Some(existing) = self.find_by_idempotency_key(db_tx, idempotency_key).await? {
                let result = self.result_from_model(db_tx, existing).await?;
                return Ok(ProcessOutcome {
                    result,
                    replayed: true,
                });
            }
            return Err(err.into());
        }

        let debit = LedgerEntry::new(
            tx.id,
            tx.source_account_id,
            EntryType::Debit,
            cmd.amount_minor,
            new_source,
            created_at,
        );
        let credit = LedgerEntry::new(
            tx.id,
            tx.destination_account_id,
            EntryType::Credit,
            cmd.amount_minor,
            new_destination,
            created_at,
        );
        ledger_entries::ActiveModel::from(&debit).insert(db_tx).await?;
        ledger_entries::ActiveModel::from(&credit)
            .insert(db_tx)
            .await?;

        for (account_id, balance) in [(source.id, new_source), (destination.id, new_destination)] {
            let model = accounts::ActiveModel {
                id: ActiveValue::Set(account_id.to_string()),
                balance_minor: ActiveValue::Set(balance),
                ..Default::default()
            };
            model.update(db_tx).await?;
        }

        let balance_after_minor = match cmd.kind.flow() {
            FlowDirection::TreasuryToUser => new_destination,
            FlowDirection::UserToTreasury => new_source,
        };

        Ok(ProcessOutcome {
            result: TransactionResult {
                id: tx.id,
                kind: tx.kind,
                status: tx.status,
                amount_minor: tx.amount_minor,
                asset: asset.symbol,
                balance_after_minor,
                created_at,
            },
            replayed: false,
        })
    }

    pub(super) async fn find_by_idempotency_key(
        &self,
        db_tx: &DatabaseTransaction,
        key: &str,
    ) -> ResultEngine<Option<transactions::Model>> {
        transactions::Entity::find()
            .filter(transactions::Column::IdempotencyKey.eq(key.to_string()))
            .one(db_tx)
            .await
            .map_err(Into::into)
    }

    /// Rebuilds a [`TransactionResult`] from a stored transaction row.
    ///
    /// The user-side balance comes from the stored ledger entry, so a replay
    /// is indistinguishable from the original response even after later
    /// operations moved the account.
    pub(super) async fn result_from_model(
        &self,
        db_tx: &DatabaseTransaction,
        model: transactions::Model,
    ) -> ResultEngine<TransactionResult> {
        let tx = Transaction::try_from(model)?;
        let asset = asset_types::Entity::find_by_id(tx.asset_type_id.to_string())
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::UnknownAsset(tx.asset_type_id.to_string()))?;

        let user_side_account = match tx.kind.flow() {
            FlowDirection::TreasuryToUser => tx.destination_account_id,
            FlowDirection::UserToTreasury => tx.source_account_id,
        };
        let entry = ledger_entries::Entity::find()
            .filter(ledger_entries::Column::TransactionId.eq(tx.id.to_string()))
            .filter(ledger_entries::Column::AccountId.eq(user_side_account.to_string()))
            .one(db_tx)
            .await?
            .ok_or_else(|| EngineError::TransactionNotFound(tx.id.to_string()))?;

        Ok(TransactionResult {
            id: tx.id,
            kind: tx.kind,
            status: tx.status,
            amount_minor: tx.amount_minor,
            asset: asset.symbol,
            balance_after_minor: entry.balance_after_minor,
            created_at: tx.created_at,
        })
    }
}

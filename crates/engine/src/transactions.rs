//! Transaction primitives.
//!
//! A `Transaction` records one completed value movement between a source and
//! a destination account. Rows are written exactly once per idempotency key
//! and are immutable afterwards; failed operations never persist a row, so
//! `status` is always `completed` in storage.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Topup,
    Bonus,
    Spend,
}

/// Who moves value to whom for a given operation kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FlowDirection {
    TreasuryToUser,
    UserToTreasury,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Topup => "topup",
            Self::Bonus => "bonus",
            Self::Spend => "spend",
        }
    }

    /// Single source of truth for operation directionality. Adding a new
    /// operation kind is a one-line edit here.
    pub(crate) fn flow(self) -> FlowDirection {
        match self {
            Self::Topup | Self::Bonus => FlowDirection::TreasuryToUser,
            Self::Spend => FlowDirection::UserToTreasury,
        }
    }
}

impl TryFrom<&str> for OperationKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "topup" => Ok(Self::Topup),
            "bonus" => Ok(Self::Bonus),
            "spend" => Ok(Self::Spend),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid operation kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub idempotency_key: String,
    pub kind: OperationKind,
    pub status: TransactionStatus,
    pub amount_minor: i64,
    pub asset_type_id: Uuid,
    pub source_account_id: Uuid,
    pub destination_account_id: Uuid,
    pub reference_id: Option<String>,
    /// Opaque caller metadata, serialized as JSON text in storage.
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        idempotency_key: String,
        kind: OperationKind,
        amount_minor: i64,
        asset_type_id: Uuid,
        source_account_id: Uuid,
        destination_account_id: Uuid,
        reference_id: Option<String>,
        metadata: Option<String>,
        created_at: DateTime<Utc>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            idempotency_key,
            kind,
            status: TransactionStatus::Completed,
            amount_minor,
            asset_type_id,
            source_account_id,
            destination_account_id,
            reference_id,
            metadata,
            created_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub idempotency_key: String,
    pub kind: String,
    pub status: String,
    pub amount_minor: i64,
    pub asset_type_id: String,
    pub source_account_id: String,
    pub destination_account_id: String,
    pub reference_id: Option<String>,
    pub metadata: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ledger_entries::Entity")]
    LedgerEntries,
}

impl Related<super::ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            idempotency_key: ActiveValue::Set(tx.idempotency_key.clone()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            status: ActiveValue::Set(tx.status.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            asset_type_id: ActiveValue::Set(tx.asset_type_id.to_string()),
            source_account_id: ActiveValue::Set(tx.source_account_id.to_string()),
            destination_account_id: ActiveValue::Set(tx.destination_account_id.to_string()),
            reference_id: ActiveValue::Set(tx.reference_id.clone()),
            metadata: ActiveValue::Set(tx.metadata.clone()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let not_exists = || EngineError::TransactionNotFound(model.id.clone());
        Ok(Self {
            id: Uuid::parse_str(&model.id).map_err(|_| not_exists())?,
            idempotency_key: model.idempotency_key.clone(),
            kind: OperationKind::try_from(model.kind.as_str())?,
            status: TransactionStatus::try_from(model.status.as_str())?,
            amount_minor: model.amount_minor,
            asset_type_id: Uuid::parse_str(&model.asset_type_id).map_err(|_| not_exists())?,
            source_account_id: Uuid::parse_str(&model.source_account_id)
                .map_err(|_| not_exists())?,
            destination_account_id: Uuid::parse_str(&model.destination_account_id)
                .map_err(|_| not_exists())?,
            reference_id: model.reference_id.clone(),
            metadata: model.metadata.clone(),
            created_at: model.created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directionality_table() {
        assert_eq!(OperationKind::Topup.flow(), FlowDirection::TreasuryToUser);
        assert_eq!(OperationKind::Bonus.flow(), FlowDirection::TreasuryToUser);
        assert_eq!(OperationKind::Spend.flow(), FlowDirection::UserToTreasury);
    }

    #[test]
    fn rejects_non_positive_amount() {
        let err = Transaction::new(
            "k1".to_string(),
            OperationKind::Topup,
            0,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            None,
            None,
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAmount("amount_minor must be > 0".to_string())
        );
    }

    #[test]
    fn kind_round_trips() {
        for kind in [
            OperationKind::Topup,
            OperationKind::Bonus,
            OperationKind::Spend,
        ] {
            assert_eq!(OperationKind::try_from(kind.as_str()).unwrap(), kind);
        }
    }
}

//! Accounts: per-(owner, asset) balance holders.
//!
//! An account is either a `user` account (lazily created at balance 0 on the
//! owner's first operation for that asset) or the per-asset `system` treasury
//! account, provisioned out-of-band. `balance_minor` is a denormalized cache
//! of credits minus debits over the account's ledger entries; it is mutated
//! only by the engine while the row is lock-held inside a unit of work.

use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

/// Owner id of every treasury account.
pub const TREASURY_OWNER: &str = "treasury";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    User,
    System,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::System => "system",
        }
    }
}

impl TryFrom<&str> for AccountKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Self::User),
            "system" => Ok(Self::System),
            other => Err(EngineError::KeyNotFound(format!(
                "invalid account kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub owner_id: String,
    pub asset_type_id: Uuid,
    pub kind: AccountKind,
    pub balance_minor: i64,
}

impl Account {
    /// A fresh user account at balance 0.
    pub fn new_user(owner_id: &str, asset_type_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            asset_type_id,
            kind: AccountKind::User,
            balance_minor: 0,
        }
    }

    pub fn is_treasury(&self) -> bool {
        self.kind == AccountKind::System
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub owner_id: String,
    pub asset_type_id: String,
    pub kind: String,
    pub balance_minor: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::asset_types::Entity",
        from = "Column::AssetTypeId",
        to = "super::asset_types::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    AssetTypes,
    #[sea_orm(has_many = "super::ledger_entries::Entity")]
    LedgerEntries,
}

impl Related<super::asset_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AssetTypes.def()
    }
}

impl Related<super::ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Account> for ActiveModel {
    fn from(value: &Account) -> Self {
        Self {
            id: ActiveValue::Set(value.id.to_string()),
            owner_id: ActiveValue::Set(value.owner_id.clone()),
            asset_type_id: ActiveValue::Set(value.asset_type_id.to_string()),
            kind: ActiveValue::Set(value.kind.as_str().to_string()),
            balance_minor: ActiveValue::Set(value.balance_minor),
        }
    }
}

impl TryFrom<Model> for Account {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::KeyNotFound("account not exists".to_string()))?,
            owner_id: model.owner_id,
            asset_type_id: Uuid::parse_str(&model.asset_type_id)
                .map_err(|_| EngineError::KeyNotFound("account not exists".to_string()))?,
            kind: AccountKind::try_from(model.kind.as_str())?,
            balance_minor: model.balance_minor,
        })
    }
}

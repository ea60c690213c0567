//! Balance summary projection.

use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{AccountKind, EngineError, ResultEngine, accounts, asset_types};

use super::{Engine, with_tx};

/// One row of an owner's balance summary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub asset: String,
    pub asset_name: String,
    pub balance_minor: i64,
}

impl Engine {
    /// All user accounts of an owner, one row per asset, sorted by symbol.
    ///
    /// An owner with no accounts at all has never been onboarded and gets
    /// `NoWalletsFound`; a zero balance on an existing account is a valid,
    /// non-error state.
    pub async fn balances(&self, owner_id: &str) -> ResultEngine<Vec<AssetBalance>> {
        with_tx!(self, |db_tx| {
            let rows: Vec<(accounts::Model, Option<asset_types::Model>)> = accounts::Entity::find()
                .filter(accounts::Column::OwnerId.eq(owner_id.to_string()))
                .filter(accounts::Column::Kind.eq(AccountKind::User.as_str()))
                .find_also_related(asset_types::Entity)
                .order_by_asc(asset_types::Column::Symbol)
                .all(&db_tx)
                .await?;

            if rows.is_empty() {
                return Err(EngineError::NoWalletsFound(owner_id.to_string()));
            }

            let mut out = Vec::with_capacity(rows.len());
            for (account, asset) in rows {
                let asset = asset
                    .ok_or_else(|| EngineError::KeyNotFound("asset type not exists".to_string()))?;
                out.push(AssetBalance {
                    asset: asset.symbol,
                    asset_name: asset.name,
                    balance_minor: account.balance_minor,
                });
            }
            Ok(out)
        })
    }
}

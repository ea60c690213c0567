//! Asset directory and account resolution.

use sea_orm::{DatabaseTransaction, QueryFilter, QuerySelect, prelude::*};
use uuid::Uuid;

use crate::{Account, AssetType, EngineError, ResultEngine, TREASURY_OWNER, accounts, asset_types};

use super::Engine;

impl Engine {
    /// Resolves an asset symbol (case-insensitive) to its reference data.
    pub(super) async fn asset_by_symbol(
        &self,
        db: &DatabaseTransaction,
        symbol: &str,
    ) -> ResultEngine<AssetType> {
        let normalized = symbol.trim().to_ascii_uppercase();
        let model = asset_types::Entity::find()
            .filter(asset_types::Column::Symbol.eq(normalized.clone()))
            .one(db)
            .await?
            .ok_or(EngineError::UnknownAsset(normalized))?;
        AssetType::try_from(model)
    }

    async fn find_account(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        asset_type_id: &Uuid,
    ) -> ResultEngine<Option<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(owner_id.to_string()))
            .filter(accounts::Column::AssetTypeId.eq(asset_type_id.to_string()))
            .one(db)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    /// Finds the owner's account for an asset, creating it at balance 0 on
    /// first use.
    ///
    /// The find-then-insert sequence is advisory only: the unique
    /// `(owner_id, asset_type_id)` index is the real guard. When the insert
    /// loses a race against a concurrent creation it fails on that index, and
    /// the account is re-read instead of surfacing the conflict.
    pub(super) async fn resolve_user_account(
        &self,
        db: &DatabaseTransaction,
        owner_id: &str,
        asset_type_id: &Uuid,
    ) -> ResultEngine<Account> {
        if let Some(account) = self.find_account(db, owner_id, asset_type_id).await? {
            return Ok(account);
        }

        let account = Account::new_user(owner_id, *asset_type_id);
        if let Err(err) = accounts::ActiveModel::from(&account).insert(db).await {
            // Concurrent duplicate creation: the row exists now, use it.
            if let Some(account) = self.find_account(db, owner_id, asset_type_id).await? {
                return Ok(account);
            }
            return Err(err.into());
        }

        self.find_account(db, owner_id, asset_type_id)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))
    }

    /// Finds the pre-provisioned treasury account for an asset.
    ///
    /// Absence is a deployment defect, not a user error. A row under the
    /// treasury owner that is not `system` kind is just as much a
    /// provisioning defect as a missing one.
    pub(super) async fn treasury_account(
        &self,
        db: &DatabaseTransaction,
        asset_type_id: &Uuid,
        symbol: &str,
    ) -> ResultEngine<Account> {
        let model = accounts::Entity::find()
            .filter(accounts::Column::OwnerId.eq(TREASURY_OWNER.to_string()))
            .filter(accounts::Column::AssetTypeId.eq(asset_type_id.to_string()))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::TreasuryMissing(symbol.to_string()))?;

        let account = Account::try_from(model)?;
        if !account.is_treasury() {
            return Err(EngineError::TreasuryMissing(symbol.to_string()));
        }
        Ok(account)
    }

    /// Re-reads an account under an exclusive row lock scoped to the current
    /// unit of work. The balance observed here, not any earlier read, is the
    /// one validation and arithmetic must use.
    pub(super) async fn lock_account(
        &self,
        db: &DatabaseTransaction,
        account_id: &Uuid,
    ) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(account_id.to_string())
            .lock_exclusive()
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("account not exists".to_string()))?;
        Account::try_from(model)
    }
}

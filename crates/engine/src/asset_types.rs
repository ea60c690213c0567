//! Asset type reference data.
//!
//! An asset type is a distinct kind of virtual credit (e.g. a points
//! category), identified by a short upper-case symbol. Rows are created at
//! provisioning time and never mutated or deleted by the engine.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::EngineError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetType {
    pub id: Uuid,
    /// Unique short code, always stored upper-case.
    pub symbol: String,
    pub name: String,
    /// Fixed-point precision: amounts are `i64` minor units with this many
    /// fraction digits.
    pub decimals: u8,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "asset_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub decimals: i16,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::accounts::Entity")]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for AssetType {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let decimals = u8::try_from(model.decimals).map_err(|_| {
            EngineError::InvalidAmount(format!("invalid decimals: {}", model.decimals))
        })?;
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::UnknownAsset(model.symbol.clone()))?,
            symbol: model.symbol,
            name: model.name,
            decimals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(decimals: i16) -> Model {
        Model {
            id: Uuid::new_v4().to_string(),
            symbol: "GOLD".to_string(),
            name: "Gold credits".to_string(),
            decimals,
        }
    }

    #[test]
    fn model_converts_to_domain() {
        let asset = AssetType::try_from(model(2)).unwrap();
        assert_eq!(asset.symbol, "GOLD");
        assert_eq!(asset.decimals, 2);
    }

    #[test]
    fn rejects_out_of_range_decimals() {
        let err = AssetType::try_from(model(-1)).unwrap_err();
        assert_eq!(err, EngineError::InvalidAmount("invalid decimals: -1".to_string()));

        assert!(AssetType::try_from(model(300)).is_err());
    }
}

//! Seeds asset reference data and the per-asset treasury accounts.
//!
//! The engine never creates treasury accounts; every provisioned asset type
//! must carry exactly one `system` account owned by `treasury` before any
//! operation runs.

use sea_orm::{ConnectionTrait, DbErr, Statement};
use sea_orm_migration::prelude::*;
use uuid::Uuid;

#[derive(DeriveMigrationName)]
pub struct Migration;

const TREASURY_OWNER: &str = "treasury";

/// Starting float of every treasury account. Issuance draws it down, spends
/// replenish it; account balances must never go negative, treasury included.
const TREASURY_FLOAT_MINOR: i64 = 1_000_000_000_000;

const ASSETS: &[(&str, &str, i16)] = &[("GOLD", "Gold credits", 2), ("GEM", "Gems", 0)];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        for (symbol, name, decimals) in ASSETS {
            let existing = db
                .query_one(Statement::from_sql_and_values(
                    backend,
                    "SELECT id FROM asset_types WHERE symbol = ?;",
                    vec![(*symbol).into()],
                ))
                .await?;

            let asset_id = match existing {
                Some(row) => row.try_get::<String>("", "id")?,
                None => {
                    let id = Uuid::new_v4().to_string();
                    db.execute(Statement::from_sql_and_values(
                        backend,
                        "INSERT INTO asset_types (id, symbol, name, decimals) VALUES (?, ?, ?, ?);",
                        vec![id.clone().into(), (*symbol).into(), (*name).into(), (*decimals).into()],
                    ))
                    .await?;
                    id
                }
            };

            let treasury_exists = db
                .query_one(Statement::from_sql_and_values(
                    backend,
                    "SELECT id FROM accounts WHERE owner_id = ? AND asset_type_id = ?;",
                    vec![TREASURY_OWNER.into(), asset_id.clone().into()],
                ))
                .await?
                .is_some();
            if !treasury_exists {
                db.execute(Statement::from_sql_and_values(
                    backend,
                    "INSERT INTO accounts (id, owner_id, asset_type_id, kind, balance_minor) \
                     VALUES (?, ?, ?, 'system', ?);",
                    vec![
                        Uuid::new_v4().to_string().into(),
                        TREASURY_OWNER.into(),
                        asset_id.into(),
                        TREASURY_FLOAT_MINOR.into(),
                    ],
                ))
                .await?;
            }
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        let backend = db.get_database_backend();

        db.execute(Statement::from_sql_and_values(
            backend,
            "DELETE FROM accounts WHERE owner_id = ?;",
            vec![TREASURY_OWNER.into()],
        ))
        .await?;

        for (symbol, _, _) in ASSETS {
            db.execute(Statement::from_sql_and_values(
                backend,
                "DELETE FROM asset_types WHERE symbol = ?;",
                vec![(*symbol).into()],
            ))
            .await?;
        }

        Ok(())
    }
}

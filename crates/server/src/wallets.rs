//! Wallet API endpoints

use api_types::wallet::{
    AssetBalanceView, BalancesResponse, Direction, HistoryEntryView, HistoryResponse,
};
use axum::{
    Json,
    extract::{Path, State},
};

use crate::{ServerError, server::ServerState};

pub async fn balances(
    State(state): State<ServerState>,
    Path(owner_id): Path<String>,
) -> Result<Json<BalancesResponse>, ServerError> {
    let balances = state.engine.balances(&owner_id).await?;

    let balances = balances
        .into_iter()
        .map(|b| AssetBalanceView {
            asset: b.asset,
            asset_name: b.asset_name,
            balance_minor: b.balance_minor,
        })
        .collect();

    Ok(Json(BalancesResponse { balances }))
}

pub async fn history(
    State(state): State<ServerState>,
    Path(owner_id): Path<String>,
) -> Result<Json<HistoryResponse>, ServerError> {
    let entries = state.engine.history(&owner_id).await?;

    let transactions = entries
        .into_iter()
        .map(|entry| HistoryEntryView {
            transaction_id: entry.transaction_id,
            kind: match entry.kind {
                engine::OperationKind::Topup => api_types::transaction::OperationKind::Topup,
                engine::OperationKind::Bonus => api_types::transaction::OperationKind::Bonus,
                engine::OperationKind::Spend => api_types::transaction::OperationKind::Spend,
            },
            direction: match entry.direction {
                engine::HistoryDirection::In => Direction::In,
                engine::HistoryDirection::Out => Direction::Out,
            },
            amount_minor: entry.amount_minor,
            asset: entry.asset,
            balance_after_minor: entry.balance_after_minor,
            reference_id: entry.reference_id,
            created_at: entry.created_at,
        })
        .collect();

    Ok(Json(HistoryResponse { transactions }))
}

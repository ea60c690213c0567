//! Operation API endpoints

use api_types::transaction::{
    OperationKind as ApiKind, OperationNew, TransactionResponse, TransactionStatus as ApiStatus,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};

fn map_kind(kind: engine::OperationKind) -> ApiKind {
    match kind {
        engine::OperationKind::Topup => ApiKind::Topup,
        engine::OperationKind::Bonus => ApiKind::Bonus,
        engine::OperationKind::Spend => ApiKind::Spend,
    }
}

fn map_status(status: engine::TransactionStatus) -> ApiStatus {
    match status {
        engine::TransactionStatus::Completed => ApiStatus::Completed,
        engine::TransactionStatus::Failed => ApiStatus::Failed,
    }
}

pub(crate) fn map_result(result: engine::TransactionResult) -> TransactionResponse {
    TransactionResponse {
        id: result.id,
        kind: map_kind(result.kind),
        status: map_status(result.status),
        amount_minor: result.amount_minor,
        asset: result.asset,
        balance_after_minor: result.balance_after_minor,
        created_at: result.created_at,
    }
}

async fn operation_new(
    state: ServerState,
    kind: engine::OperationKind,
    payload: OperationNew,
) -> Result<(StatusCode, Json<TransactionResponse>), ServerError> {
    if payload.owner_id.trim().is_empty() {
        return Err(ServerError::Generic("owner_id is required".to_string()));
    }
    if payload.asset.trim().is_empty() {
        return Err(ServerError::Generic("asset is required".to_string()));
    }
    if payload.idempotency_key.trim().is_empty() {
        return Err(ServerError::Generic(
            "idempotency_key is required".to_string(),
        ));
    }
    if payload.amount_minor <= 0 {
        return Err(ServerError::Generic(
            "amount_minor must be > 0".to_string(),
        ));
    }

    let outcome = state
        .engine
        .process(engine::ProcessCmd {
            kind,
            owner_id: payload.owner_id,
            asset: payload.asset,
            amount_minor: payload.amount_minor,
            idempotency_key: payload.idempotency_key,
            reference_id: payload.reference_id,
            metadata: payload.metadata,
        })
        .await?;

    // Replays are successful but not a new resource.
    let status = if outcome.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(map_result(outcome.result))))
}

pub async fn topup_new(
    State(state): State<ServerState>,
    Json(payload): Json<OperationNew>,
) -> Result<(StatusCode, Json<TransactionResponse>), ServerError> {
    operation_new(state, engine::OperationKind::Topup, payload).await
}

pub async fn bonus_new(
    State(state): State<ServerState>,
    Json(payload): Json<OperationNew>,
) -> Result<(StatusCode, Json<TransactionResponse>), ServerError> {
    operation_new(state, engine::OperationKind::Bonus, payload).await
}

pub async fn spend_new(
    State(state): State<ServerState>,
    Json(payload): Json<OperationNew>,
) -> Result<(StatusCode, Json<TransactionResponse>), ServerError> {
    operation_new(state, engine::OperationKind::Spend, payload).await
}

pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransactionResponse>, ServerError> {
    let result = state.engine.transaction_by_id(id).await?;
    Ok(Json(map_result(result)))
}

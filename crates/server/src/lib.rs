use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::EngineError;

use serde::Serialize;
pub use server::run_with_listener;

mod server;
mod transactions;
mod wallets;

pub mod types {
    pub mod transaction {
        pub use api_types::transaction::{OperationNew, TransactionResponse};
    }

    pub mod wallet {
        pub use api_types::wallet::{
            AssetBalanceView, BalancesResponse, HistoryEntryView, HistoryResponse,
        };
    }
}

pub enum ServerError {
    Engine(EngineError),
    Generic(String),
}

#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::TransactionNotFound(_)
        | EngineError::NoWalletsFound(_)
        | EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::TreasuryMissing(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        EngineError::UnknownAsset(_)
        | EngineError::InsufficientBalance(_)
        | EngineError::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn message_for_engine_error(err: EngineError) -> String {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        EngineError::TreasuryMissing(asset) => {
            tracing::error!("treasury account missing for asset {asset}");
            "internal server error".to_string()
        }
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Engine(err) => {
                (status_for_engine_error(&err), message_for_engine_error(err))
            }
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

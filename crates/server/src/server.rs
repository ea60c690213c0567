use axum::{
    Router,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{transactions, wallets};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

pub(crate) fn router(state: ServerState) -> Router {
    Router::new()
        .route("/topup", post(transactions::topup_new))
        .route("/bonus", post(transactions::bonus_new))
        .route("/spend", post(transactions::spend_new))
        .route("/transactions/{id}", get(transactions::get_by_id))
        .route("/wallets/{owner_id}/balances", get(wallets::balances))
        .route("/wallets/{owner_id}/transactions", get(wallets::history))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state)).await
}

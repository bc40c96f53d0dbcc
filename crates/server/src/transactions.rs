//! Transactions API endpoints

use api_types::transaction::{
    TransactionListQuery, TransactionListResponse, TransactionNew, TransactionUpdate,
    TransactionView,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{NewTransactionCmd, TransactionListFilter, UpdateTransactionCmd};
use uuid::Uuid;

use crate::{
    ServerError,
    convert::{kind_from_api, transaction_view},
    server::ServerState,
};

const DEFAULT_PAGE: u64 = 50;
const MAX_PAGE: u64 = 200;

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE).clamp(1, MAX_PAGE);
    let filter = TransactionListFilter {
        wallet_id: query.wallet_id,
        loan_id: query.loan_id,
        kinds: query.kind.map(|kind| vec![kind_from_api(kind)]),
        from: query.from.map(|dt| dt.with_timezone(&Utc)),
        to: query.to.map(|dt| dt.with_timezone(&Utc)),
    };

    let (txs, next_cursor) = state
        .engine
        .list_transactions_page(&filter, limit, query.cursor.as_deref())
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: txs.into_iter().map(transaction_view).collect(),
        next_cursor,
    }))
}

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let mut cmd = NewTransactionCmd::new(
        kind_from_api(payload.kind),
        payload.amount_minor,
        payload.wallet_id,
        payload.occurred_at.with_timezone(&Utc),
    );
    cmd.to_wallet_id = payload.to_wallet_id;
    cmd.loan_id = payload.loan_id;
    cmd.description = payload.description;

    let tx = state.engine.create_transaction(cmd).await?;
    Ok((StatusCode::CREATED, Json(transaction_view(tx))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<Json<TransactionView>, ServerError> {
    let tx = state.engine.transaction(transaction_id).await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
    Json(payload): Json<TransactionUpdate>,
) -> Result<Json<TransactionView>, ServerError> {
    let cmd = UpdateTransactionCmd {
        transaction_id,
        amount_minor: payload.amount_minor,
        wallet_id: payload.wallet_id,
        to_wallet_id: payload.to_wallet_id,
        loan_id: payload.loan_id,
        occurred_at: payload.occurred_at.map(|dt| dt.with_timezone(&Utc)),
        description: payload.description,
    };
    let tx = state.engine.update_transaction(cmd).await?;
    Ok(Json(transaction_view(tx)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(transaction_id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.engine.delete_transaction(transaction_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

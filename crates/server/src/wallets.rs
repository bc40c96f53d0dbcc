//! Wallets API endpoints.

use api_types::wallet::{WalletListQuery, WalletNew, WalletUpdate, WalletView};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    ServerError,
    convert::{currency_from_api, wallet_view},
    server::ServerState,
};

pub async fn wallet_new(
    State(state): State<ServerState>,
    Json(payload): Json<WalletNew>,
) -> Result<(StatusCode, Json<WalletView>), ServerError> {
    let currency = payload.currency.map(currency_from_api).unwrap_or_default();
    let wallet = state.engine.new_wallet(&payload.name, currency).await?;
    Ok((StatusCode::CREATED, Json(wallet_view(wallet))))
}

pub async fn wallet_list(
    State(state): State<ServerState>,
    Query(query): Query<WalletListQuery>,
) -> Result<Json<Vec<WalletView>>, ServerError> {
    let wallets = state
        .engine
        .list_wallets(query.include_archived.unwrap_or(false))
        .await?;
    Ok(Json(wallets.into_iter().map(wallet_view).collect()))
}

pub async fn wallet_get(
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
) -> Result<Json<WalletView>, ServerError> {
    let wallet = state.engine.wallet(wallet_id).await?;
    Ok(Json(wallet_view(wallet)))
}

pub async fn wallet_update(
    State(state): State<ServerState>,
    Path(wallet_id): Path<Uuid>,
    Json(payload): Json<WalletUpdate>,
) -> Result<Json<WalletView>, ServerError> {
    if let Some(name) = payload.name.as_deref() {
        state.engine.rename_wallet(wallet_id, name).await?;
    }
    if let Some(archived) = payload.archived {
        state.engine.set_wallet_archived(wallet_id, archived).await?;
    }
    let wallet = state.engine.wallet(wallet_id).await?;
    Ok(Json(wallet_view(wallet)))
}

//! Loans API endpoints.

use api_types::{
    loan::{LoanDeleted, LoanListQuery, LoanNew, LoanUpdate, LoanView},
    positions::{LoanPositionsView, PositionsQuery},
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::{LoanListFilter, NewLoanCmd, UpdateLoanCmd};
use uuid::Uuid;

use crate::{
    ServerError,
    convert::{currency_from_api, loan_kind_from_api, loan_status_from_api, loan_view},
    server::ServerState,
};

pub async fn create(
    State(state): State<ServerState>,
    Json(payload): Json<LoanNew>,
) -> Result<(StatusCode, Json<LoanView>), ServerError> {
    let mut cmd = NewLoanCmd::new(
        loan_kind_from_api(payload.kind),
        payload.person,
        payload.total_amount_minor,
        payload.currency.map(currency_from_api).unwrap_or_default(),
        payload.start_date,
    );
    cmd.due_date = payload.due_date;
    cmd.description = payload.description;
    cmd.origination_wallet_id = payload.wallet_id;

    let loan = state.engine.create_loan(cmd).await?;
    Ok((StatusCode::CREATED, Json(loan_view(loan))))
}

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<LoanListQuery>,
) -> Result<Json<Vec<LoanView>>, ServerError> {
    let filter = LoanListFilter {
        status: query.status.map(loan_status_from_api),
        kind: query.kind.map(loan_kind_from_api),
    };
    let loans = state.engine.list_loans(&filter).await?;
    Ok(Json(loans.into_iter().map(loan_view).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanView>, ServerError> {
    let loan = state.engine.loan(loan_id).await?;
    Ok(Json(loan_view(loan)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path(loan_id): Path<Uuid>,
    Json(payload): Json<LoanUpdate>,
) -> Result<Json<LoanView>, ServerError> {
    let cmd = UpdateLoanCmd {
        loan_id,
        person: payload.person,
        total_amount_minor: payload.total_amount_minor,
        start_date: payload.start_date,
        due_date: payload.due_date,
        description: payload.description,
        status: payload.status.map(loan_status_from_api),
    };
    let loan = state.engine.update_loan(cmd).await?;
    Ok(Json(loan_view(loan)))
}

pub async fn delete(
    State(state): State<ServerState>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanDeleted>, ServerError> {
    let unlinked_transactions = state.engine.delete_loan(loan_id).await?;
    Ok(Json(LoanDeleted {
        id: loan_id,
        unlinked_transactions,
    }))
}

pub async fn reconcile(
    State(state): State<ServerState>,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<LoanView>, ServerError> {
    let loan = state.engine.reconcile_loan(loan_id).await?;
    Ok(Json(loan_view(loan)))
}

pub async fn positions(
    State(state): State<ServerState>,
    Query(query): Query<PositionsQuery>,
) -> Result<Json<LoanPositionsView>, ServerError> {
    let positions = state
        .engine
        .loan_positions(query.currency.map(currency_from_api))
        .await?;
    Ok(Json(LoanPositionsView {
        currency: query.currency,
        total_receivable_minor: positions.total_receivable_minor,
        total_payable_minor: positions.total_payable_minor,
        net_position_minor: positions.net_position_minor,
        loan_count: positions.loan_count,
        integrity_warnings: positions.integrity_warnings,
    }))
}

//! Budget Routes
//!
//! - GET /api/v1/budget - Balances per member plus recent transactions
//! - POST /api/v1/budget/transfer - Move money between members (parent only)
//! - POST /api/v1/budget/adjust - Allowance or correction (parent only)
//! - GET /api/v1/budget/transactions - The ledger, newest first

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::dto::{
    AdjustRequest, BalanceEntry, BudgetResponse, Envelope, TransactionResponse, TransferRequest,
};
use crate::api::error::ApiResult;
use crate::api::extract::{require_parent, CurrentMember};
use crate::api::state::AppState;

const DEFAULT_LEDGER_LIMIT: usize = 50;
const MAX_LEDGER_LIMIT: usize = 500;

/// Query parameters for ledger listings
#[derive(Debug, Deserialize)]
pub struct LedgerParams {
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /api/v1/budget
pub async fn get_budget(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
) -> ApiResult<Json<Envelope<BudgetResponse>>> {
    let members = state.store.list_members(current.family_id()).await?;
    let transactions = state
        .store
        .list_transactions(current.family_id(), DEFAULT_LEDGER_LIMIT)
        .await?;

    Ok(Json(Envelope::new(BudgetResponse {
        balances: members
            .iter()
            .map(|m| BalanceEntry {
                member_id: m.id.clone(),
                name: m.name.clone(),
                balance_cents: m.balance_cents,
            })
            .collect(),
        transactions: transactions
            .iter()
            .map(TransactionResponse::from_transaction)
            .collect(),
    })))
}

/// POST /api/v1/budget/transfer
pub async fn transfer(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Json(req): Json<TransferRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<TransactionResponse>>)> {
    require_parent(&current)?;

    let record = state
        .store
        .transfer(
            current.family_id(),
            &req.from,
            &req.to,
            req.amount_cents,
            req.note,
            &current.member.id,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(TransactionResponse::from_transaction(
            &record,
        ))),
    ))
}

/// POST /api/v1/budget/adjust
pub async fn adjust(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Json(req): Json<AdjustRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<TransactionResponse>>)> {
    require_parent(&current)?;

    let record = state
        .store
        .adjust_balance(
            current.family_id(),
            &req.member,
            req.amount_cents,
            req.note,
            &current.member.id,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Envelope::new(TransactionResponse::from_transaction(
            &record,
        ))),
    ))
}

/// GET /api/v1/budget/transactions
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    current: CurrentMember,
    Query(params): Query<LedgerParams>,
) -> ApiResult<Json<Envelope<Vec<TransactionResponse>>>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LEDGER_LIMIT)
        .min(MAX_LEDGER_LIMIT);

    let transactions = state
        .store
        .list_transactions(current.family_id(), limit)
        .await?;

    Ok(Json(Envelope::new(
        transactions
            .iter()
            .map(TransactionResponse::from_transaction)
            .collect(),
    )))
}

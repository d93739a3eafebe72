//! Money request routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use gcoin_core::ledger::LedgerStore;
use gcoin_core::transfer::{MoneyRequest, TransferOutcome};
use gcoin_shared::types::{MoneyRequestId, UserId};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{AppState, error::ApiError, middleware::ActorId};

/// Creates the money request routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/wallet/request-money", post(request_money::<S>))
        .route("/wallet/pending-requests", get(list_pending::<S>))
        .route("/wallet/requests/{request_id}", get(get_request::<S>))
        .route("/wallet/approve-request/{request_id}", post(approve::<S>))
        .route("/wallet/reject-request/{request_id}", post(reject::<S>))
}

/// Request body for asking another user for funds.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMoneyRequest {
    /// The user asked to pay.
    pub from_user_id: UserId,
    /// Amount requested.
    pub amount: Decimal,
    /// Free-text note.
    #[serde(default)]
    pub description: String,
}

/// Optional body for a rejection.
#[derive(Debug, Default, Deserialize)]
pub struct RejectRequest {
    /// Why the payer declined.
    pub reason: Option<String>,
}

/// POST `/wallet/request-money` - Ask another user for funds.
async fn request_money<S: LedgerStore>(
    State(state): State<AppState<S>>,
    actor: ActorId,
    Json(payload): Json<RequestMoneyRequest>,
) -> Result<(StatusCode, Json<MoneyRequest>), ApiError> {
    let request = state
        .ledger
        .transfers
        .request_money(
            actor.user_id(),
            payload.from_user_id,
            payload.amount,
            &payload.description,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET `/wallet/pending-requests` - Pending requests the caller is party to.
async fn list_pending<S: LedgerStore>(
    State(state): State<AppState<S>>,
    actor: ActorId,
) -> Result<Json<Vec<MoneyRequest>>, ApiError> {
    Ok(Json(
        state
            .ledger
            .transfers
            .list_pending_requests(actor.user_id())
            .await?,
    ))
}

/// GET `/wallet/requests/{request_id}` - One request, visible to either party.
async fn get_request<S: LedgerStore>(
    State(state): State<AppState<S>>,
    actor: ActorId,
    Path(request_id): Path<MoneyRequestId>,
) -> Result<Json<MoneyRequest>, ApiError> {
    Ok(Json(
        state
            .ledger
            .transfers
            .get_money_request(request_id, actor.user_id())
            .await?,
    ))
}

/// POST `/wallet/approve-request/{request_id}` - Pay a pending request.
async fn approve<S: LedgerStore>(
    State(state): State<AppState<S>>,
    actor: ActorId,
    Path(request_id): Path<MoneyRequestId>,
) -> Result<Json<TransferOutcome>, ApiError> {
    Ok(Json(
        state
            .ledger
            .transfers
            .approve_money_request(request_id, actor.user_id())
            .await?,
    ))
}

/// POST `/wallet/reject-request/{request_id}` - Decline a pending request.
async fn reject<S: LedgerStore>(
    State(state): State<AppState<S>>,
    actor: ActorId,
    Path(request_id): Path<MoneyRequestId>,
    payload: Option<Json<RejectRequest>>,
) -> Result<Json<MoneyRequest>, ApiError> {
    let reason = payload.and_then(|Json(body)| body.reason);
    Ok(Json(
        state
            .ledger
            .transfers
            .reject_money_request(request_id, actor.user_id(), reason)
            .await?,
    ))
}

//! Wallet routes: provisioning, balance, history, transfers, deposits and
//! withdrawals for the calling user.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use gcoin_core::history::{HistoryPage, HistoryParams, HistoryQuery};
use gcoin_core::ledger::{LedgerStore, Wallet};
use gcoin_core::transfer::TransferOutcome;
use gcoin_core::wallet::{LedgerReceipt, WalletSummary};
use gcoin_shared::types::{Money, PageRequest, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError, middleware::ActorId};

/// Creates the wallet routes.
pub fn routes<S: LedgerStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/wallet", get(get_wallet::<S>).post(create_wallet::<S>))
        .route("/wallet/balance", get(get_balance::<S>))
        .route("/wallet/transactions", get(list_transactions::<S>))
        .route("/wallet/transfer", post(transfer::<S>))
        .route("/wallet/deposit", post(deposit::<S>))
        .route("/wallet/withdraw", post(withdraw::<S>))
        .route("/wallet/deposits", get(list_deposits::<S>))
        .route("/wallet/validate-amount", post(validate_amount::<S>))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Balance response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    /// Current balance.
    pub balance: Decimal,
    /// Currency tag.
    pub currency: &'static str,
    /// Human-readable amount, e.g. `100.00 G_COIN`.
    pub formatted: String,
}

/// Request body for a transfer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Recipient.
    pub to_user_id: UserId,
    /// Amount to move.
    pub amount: Decimal,
    /// Free-text note.
    #[serde(default)]
    pub description: String,
}

/// Request body for a deposit or withdrawal.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundsRequest {
    /// Amount.
    pub amount: Decimal,
    /// Payment-provider correlation id.
    pub reference: Option<String>,
    /// Overrides the default row description.
    pub description: Option<String>,
}

/// Request body for amount pre-validation.
#[derive(Debug, Deserialize)]
pub struct ValidateAmountRequest {
    /// Amount to check.
    pub amount: Decimal,
}

/// Pagination query for deposit history.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Page size.
    pub limit: Option<u64>,
    /// Rows to skip.
    pub offset: Option<u64>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/wallet` - Provision the caller's wallet.
async fn create_wallet<S: LedgerStore>(
    State(state): State<AppState<S>>,
    actor: ActorId,
) -> Result<(StatusCode, Json<Wallet>), ApiError> {
    let wallet = state.ledger.wallets.create_wallet(actor.user_id()).await?;
    Ok((StatusCode::CREATED, Json(wallet)))
}

/// GET `/wallet` - Wallet with its most recent rows.
async fn get_wallet<S: LedgerStore>(
    State(state): State<AppState<S>>,
    actor: ActorId,
) -> Result<Json<WalletSummary>, ApiError> {
    Ok(Json(state.ledger.wallets.get_wallet(actor.user_id()).await?))
}

/// GET `/wallet/balance` - Current balance.
async fn get_balance<S: LedgerStore>(
    State(state): State<AppState<S>>,
    actor: ActorId,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.ledger.wallets.get_balance(actor.user_id()).await?;
    let money = Money::gcoin(balance);
    Ok(Json(BalanceResponse {
        balance,
        currency: money.currency.as_str(),
        formatted: money.to_string(),
    }))
}

/// GET `/wallet/transactions` - Filtered, sorted, paginated history.
async fn list_transactions<S: LedgerStore>(
    State(state): State<AppState<S>>,
    actor: ActorId,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryPage>, ApiError> {
    let query = HistoryQuery::try_from(params)?;
    Ok(Json(
        state
            .ledger
            .history
            .list_history(actor.user_id(), query)
            .await?,
    ))
}

/// POST `/wallet/transfer` - Move funds to another user.
async fn transfer<S: LedgerStore>(
    State(state): State<AppState<S>>,
    actor: ActorId,
    Json(payload): Json<TransferRequest>,
) -> Result<Json<TransferOutcome>, ApiError> {
    let outcome = state
        .ledger
        .transfers
        .transfer(
            actor.user_id(),
            payload.to_user_id,
            payload.amount,
            &payload.description,
        )
        .await?;
    Ok(Json(outcome))
}

/// POST `/wallet/deposit` - Record settled inbound funds.
async fn deposit<S: LedgerStore>(
    State(state): State<AppState<S>>,
    actor: ActorId,
    Json(payload): Json<FundsRequest>,
) -> Result<Json<LedgerReceipt>, ApiError> {
    let receipt = state
        .ledger
        .wallets
        .deposit(
            actor.user_id(),
            payload.amount,
            payload.reference,
            payload.description.as_deref(),
        )
        .await?;
    Ok(Json(receipt))
}

/// POST `/wallet/withdraw` - Record funds leaving to an external rail.
async fn withdraw<S: LedgerStore>(
    State(state): State<AppState<S>>,
    actor: ActorId,
    Json(payload): Json<FundsRequest>,
) -> Result<Json<LedgerReceipt>, ApiError> {
    let receipt = state
        .ledger
        .wallets
        .withdraw(
            actor.user_id(),
            payload.amount,
            payload.reference,
            payload.description.as_deref(),
        )
        .await?;
    Ok(Json(receipt))
}

/// GET `/wallet/deposits` - Deposit history, newest first.
async fn list_deposits<S: LedgerStore>(
    State(state): State<AppState<S>>,
    actor: ActorId,
    Query(page): Query<PageQuery>,
) -> Result<Json<HistoryPage>, ApiError> {
    let window = PageRequest::new(page.limit, page.offset);
    Ok(Json(
        state
            .ledger
            .history
            .list_deposits(actor.user_id(), window)
            .await?,
    ))
}

/// POST `/wallet/validate-amount` - Check an amount against the deposit guard.
async fn validate_amount<S: LedgerStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<ValidateAmountRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.ledger.wallets.validate_amount(payload.amount)?;
    Ok(Json(serde_json::json!({ "valid": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{app, call, test_state};
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_actor_is_unauthorized() {
        let state = test_state();
        let (response, body) = call(app(&state), "GET", "/api/v1/wallet/balance", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_provision_then_read_balance() {
        let state = test_state();
        let user = UserId::new();

        let (response, body) = call(app(&state), "POST", "/api/v1/wallet", Some(user), None).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body["currency"], "G_COIN");

        let (response, _) = call(app(&state), "POST", "/api/v1/wallet", Some(user), None).await;
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let (response, body) =
            call(app(&state), "GET", "/api/v1/wallet/balance", Some(user), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["formatted"], "100.00 G_COIN");
    }

    #[tokio::test]
    async fn test_unknown_wallet_is_not_found() {
        let state = test_state();
        let (response, body) =
            call(app(&state), "GET", "/api/v1/wallet", Some(UserId::new()), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Wallet not found");
    }

    #[tokio::test]
    async fn test_transfer_and_history() {
        let state = test_state();
        let (a, b) = (UserId::new(), UserId::new());
        state.ledger.wallets.create_wallet(a).await.unwrap();
        state.ledger.wallets.create_wallet(b).await.unwrap();

        let (response, body) = call(
            app(&state),
            "POST",
            "/api/v1/wallet/transfer",
            Some(a),
            Some(json!({ "toUserId": b, "amount": "40", "description": "rent" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["fromWallet"]["balance"], "60");

        let (response, body) = call(
            app(&state),
            "GET",
            "/api/v1/wallet/transactions?type=TRANSFER&limit=10",
            Some(a),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["transactions"][0]["type"], "TRANSFER");
    }

    #[tokio::test]
    async fn test_transfer_failures_map_to_status() {
        let state = test_state();
        let (a, b) = (UserId::new(), UserId::new());
        state.ledger.wallets.create_wallet(a).await.unwrap();
        state.ledger.wallets.create_wallet(b).await.unwrap();

        let cases = [
            (json!({ "toUserId": b, "amount": "150" }), StatusCode::UNPROCESSABLE_ENTITY),
            (json!({ "toUserId": a, "amount": "1" }), StatusCode::BAD_REQUEST),
            (json!({ "toUserId": b, "amount": "0" }), StatusCode::BAD_REQUEST),
            (
                json!({ "toUserId": UserId::new(), "amount": "1" }),
                StatusCode::NOT_FOUND,
            ),
        ];
        for (payload, status) in cases {
            let (response, _) = call(
                app(&state),
                "POST",
                "/api/v1/wallet/transfer",
                Some(a),
                Some(payload),
            )
            .await;
            assert_eq!(response.status(), status);
        }
        assert_eq!(
            state.ledger.wallets.get_balance(a).await.unwrap(),
            Decimal::ONE_HUNDRED
        );
    }

    #[tokio::test]
    async fn test_unknown_filter_is_bad_request() {
        let state = test_state();
        let user = UserId::new();
        state.ledger.wallets.create_wallet(user).await.unwrap();

        let (response, body) = call(
            app(&state),
            "GET",
            "/api/v1/wallet/transactions?type=REFUND",
            Some(user),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_FILTER");
    }

    #[tokio::test]
    async fn test_deposit_withdraw_and_deposit_history() {
        let state = test_state();
        let user = UserId::new();
        state.ledger.wallets.create_wallet(user).await.unwrap();

        let (response, body) = call(
            app(&state),
            "POST",
            "/api/v1/wallet/deposit",
            Some(user),
            Some(json!({ "amount": "50", "reference": "pi_123" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["transaction"]["type"], "DEPOSIT");
        assert_eq!(body["transaction"]["reference"], "pi_123");

        let (response, _) = call(
            app(&state),
            "POST",
            "/api/v1/wallet/withdraw",
            Some(user),
            Some(json!({ "amount": "500" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let (response, body) = call(
            app(&state),
            "GET",
            "/api/v1/wallet/deposits?limit=5",
            Some(user),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["total"], 1);
    }

    #[tokio::test]
    async fn test_validate_amount() {
        let state = test_state();
        let (response, body) = call(
            app(&state),
            "POST",
            "/api/v1/wallet/validate-amount",
            None,
            Some(json!({ "amount": "25.50" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body["valid"], true);

        let (response, body) = call(
            app(&state),
            "POST",
            "/api/v1/wallet/validate-amount",
            None,
            Some(json!({ "amount": "0.5" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_AMOUNT");
    }
}

//! Transfer Engine: two-sided transfers and the money request workflow.
//!
//! Wallet rows are always locked in ascending wallet-id order, whatever the
//! argument order, so two opposite transfers between the same pair cannot
//! deadlock. Approval locks the request row first and resolves it inside the
//! same unit as the transfer it triggers.

use std::sync::Arc;

use gcoin_shared::types::{MoneyRequestId, UserId};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument};

use crate::events::{EventPublisher, IdentityLookup, LedgerEvent, display_label};
use crate::ledger::{
    LedgerError, LedgerPolicy, LedgerResult, LedgerStore, LedgerUnit, NewTransaction,
    TransactionType, Wallet,
};
use crate::transfer::request::{MoneyRequest, MoneyRequestService, RequestResolution};

/// Both wallets after a committed transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferOutcome {
    /// Sender after the debit.
    pub from_wallet: Wallet,
    /// Recipient after the credit.
    pub to_wallet: Wallet,
}

struct TransferLegs {
    from_user_id: UserId,
    to_user_id: UserId,
    amount: Decimal,
    sender_description: String,
    recipient_description: String,
}

/// Orchestrates atomic wallet-to-wallet movements.
pub struct TransferEngine<S: LedgerStore> {
    store: Arc<S>,
    policy: Arc<LedgerPolicy>,
    events: EventPublisher,
    identity: Arc<dyn IdentityLookup>,
}

impl<S: LedgerStore> Clone for TransferEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            policy: Arc::clone(&self.policy),
            events: self.events.clone(),
            identity: Arc::clone(&self.identity),
        }
    }
}

impl<S: LedgerStore> TransferEngine<S> {
    /// Creates an engine over `store`.
    #[must_use]
    pub fn new(
        store: Arc<S>,
        policy: Arc<LedgerPolicy>,
        events: EventPublisher,
        identity: Arc<dyn IdentityLookup>,
    ) -> Self {
        Self {
            store,
            policy,
            events,
            identity,
        }
    }

    /// Moves `amount` from one user's wallet to another's.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - amount not positive, too precise, or too large
    /// * `SelfTransfer` - sender and recipient are the same user
    /// * `NotFound` - either wallet is missing
    /// * `InsufficientFunds` - sender balance below `amount`
    /// * `Busy` / `Conflict` - store contention; retry the whole call
    #[instrument(skip_all, fields(from_user_id = %from_user_id, to_user_id = %to_user_id, amount = %amount))]
    pub async fn transfer(
        &self,
        from_user_id: UserId,
        to_user_id: UserId,
        amount: Decimal,
        description: &str,
    ) -> LedgerResult<TransferOutcome> {
        self.policy.validate_amount(amount)?;
        if from_user_id == to_user_id {
            return Err(LedgerError::SelfTransfer);
        }

        let (sender_description, recipient_description) = self
            .describe(from_user_id, to_user_id, description)
            .await;
        let legs = TransferLegs {
            from_user_id,
            to_user_id,
            amount,
            sender_description,
            recipient_description,
        };

        let mut unit = self.store.begin().await?;
        let outcome = transfer_in_unit(&mut unit, &legs).await?;
        unit.commit().await?;

        info!(
            from_wallet_id = %outcome.from_wallet.id,
            to_wallet_id = %outcome.to_wallet.id,
            "Transfer completed"
        );
        self.events.publish(LedgerEvent::TransferCompleted {
            from_user_id,
            to_user_id,
            amount,
            description: description.to_string(),
        });
        Ok(outcome)
    }

    /// Asks `from_user_id` to pay `requester_id`. No balance effect.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount`
    /// * `SelfTransfer` - requester asks themselves
    /// * `NotFound` - either party has no wallet
    #[instrument(skip_all, fields(requester_id = %requester_id, from_user_id = %from_user_id, amount = %amount))]
    pub async fn request_money(
        &self,
        requester_id: UserId,
        from_user_id: UserId,
        amount: Decimal,
        description: &str,
    ) -> LedgerResult<MoneyRequest> {
        self.policy.validate_amount(amount)?;
        if requester_id == from_user_id {
            return Err(LedgerError::SelfTransfer);
        }

        let mut unit = self.store.begin().await?;
        let requester = unit.wallet_by_user_id(requester_id).await?;
        let payer = unit.wallet_by_user_id(from_user_id).await?;
        if requester.is_none() || payer.is_none() {
            return Err(both_wallets_not_found());
        }
        let request = unit
            .insert_money_request(MoneyRequest::pending(
                requester_id,
                from_user_id,
                amount,
                description,
            ))
            .await?;
        unit.commit().await?;

        info!(request_id = %request.id, "Money request created");
        self.events.publish(LedgerEvent::MoneyRequested {
            request_id: request.id,
            requester_id,
            from_user_id,
            amount,
            description: request.description.clone(),
        });
        Ok(request)
    }

    /// Pays a pending request from the approver's wallet.
    ///
    /// The transfer and the status change commit together.
    ///
    /// # Errors
    ///
    /// * `NotFound` - no such request, or a wallet vanished
    /// * `Forbidden` - approver is not the payer
    /// * `InvalidState` - request already resolved
    /// * `InsufficientFunds` - payer cannot cover the amount
    #[instrument(skip_all, fields(request_id = %request_id, approver_id = %approver_id))]
    pub async fn approve_money_request(
        &self,
        request_id: MoneyRequestId,
        approver_id: UserId,
    ) -> LedgerResult<TransferOutcome> {
        let snapshot = self.find_request(request_id).await?;
        MoneyRequestService::resolve(&snapshot, approver_id, RequestResolution::Approve)?;

        let (sender_description, recipient_description) = self
            .describe(snapshot.from_user_id, snapshot.requester_id, &snapshot.description)
            .await;

        let mut unit = self.store.begin().await?;
        let request = unit
            .lock_money_request(request_id)
            .await?
            .ok_or_else(LedgerError::request_not_found)?;
        let approved =
            MoneyRequestService::resolve(&request, approver_id, RequestResolution::Approve)?;

        let legs = TransferLegs {
            from_user_id: request.from_user_id,
            to_user_id: request.requester_id,
            amount: request.amount,
            sender_description,
            recipient_description,
        };
        let outcome = transfer_in_unit(&mut unit, &legs).await?;
        unit.update_money_request(approved).await?;
        unit.commit().await?;

        info!(amount = %request.amount, "Money request approved");
        self.events.publish(LedgerEvent::MoneyRequestApproved {
            request_id,
            requester_id: request.requester_id,
            from_user_id: request.from_user_id,
            amount: request.amount,
        });
        Ok(outcome)
    }

    /// Declines a pending request. No balance effect.
    ///
    /// # Errors
    ///
    /// Same authorization and state checks as approval.
    #[instrument(skip_all, fields(request_id = %request_id, rejector_id = %rejector_id))]
    pub async fn reject_money_request(
        &self,
        request_id: MoneyRequestId,
        rejector_id: UserId,
        reason: Option<String>,
    ) -> LedgerResult<MoneyRequest> {
        let mut unit = self.store.begin().await?;
        let request = unit
            .lock_money_request(request_id)
            .await?
            .ok_or_else(LedgerError::request_not_found)?;
        let rejected = MoneyRequestService::resolve(
            &request,
            rejector_id,
            RequestResolution::Reject { reason },
        )?;
        let rejected = unit.update_money_request(rejected).await?;
        unit.commit().await?;

        info!("Money request rejected");
        self.events.publish(LedgerEvent::MoneyRequestRejected {
            request_id,
            requester_id: rejected.requester_id,
            from_user_id: rejected.from_user_id,
            amount: rejected.amount,
            reason: rejected.rejection_reason.clone(),
        });
        Ok(rejected)
    }

    /// Pending requests the user sent or must answer, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` on backend failure.
    pub async fn list_pending_requests(&self, user_id: UserId) -> LedgerResult<Vec<MoneyRequest>> {
        let mut unit = self.store.begin().await?;
        unit.pending_requests_for(user_id).await
    }

    /// Reads a request on behalf of one of its parties.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, or `Forbidden` if `actor_id` is neither party.
    pub async fn get_money_request(
        &self,
        request_id: MoneyRequestId,
        actor_id: UserId,
    ) -> LedgerResult<MoneyRequest> {
        let request = self.find_request(request_id).await?;
        if !request.involves(actor_id) {
            return Err(LedgerError::Forbidden(
                "You are not a party to this request".to_string(),
            ));
        }
        Ok(request)
    }

    async fn find_request(&self, request_id: MoneyRequestId) -> LedgerResult<MoneyRequest> {
        let mut unit = self.store.begin().await?;
        unit.find_money_request(request_id)
            .await?
            .ok_or_else(LedgerError::request_not_found)
    }

    /// Row descriptions for both legs, naming the counterparty.
    async fn describe(&self, from: UserId, to: UserId, description: &str) -> (String, String) {
        let within = self.policy.identity_timeout;
        let to_label = display_label(self.identity.as_ref(), to, within).await;
        let from_label = display_label(self.identity.as_ref(), from, within).await;
        (
            with_note(format!("Transfer to {to_label}"), description),
            with_note(format!("Transfer from {from_label}"), description),
        )
    }
}

fn with_note(prefix: String, description: &str) -> String {
    let note = description.trim();
    if note.is_empty() {
        prefix
    } else {
        format!("{prefix}: {note}")
    }
}

fn both_wallets_not_found() -> LedgerError {
    LedgerError::NotFound("One or both wallets not found".to_string())
}

async fn transfer_in_unit<U: LedgerUnit>(
    unit: &mut U,
    legs: &TransferLegs,
) -> LedgerResult<TransferOutcome> {
    let sender = unit.wallet_by_user_id(legs.from_user_id).await?;
    let recipient = unit.wallet_by_user_id(legs.to_user_id).await?;
    let (Some(sender), Some(recipient)) = (sender, recipient) else {
        return Err(both_wallets_not_found());
    };

    let (first, second) = if sender.id < recipient.id {
        (legs.from_user_id, legs.to_user_id)
    } else {
        (legs.to_user_id, legs.from_user_id)
    };
    let first_locked = unit
        .lock_wallet(first)
        .await?
        .ok_or_else(both_wallets_not_found)?;
    let second_locked = unit
        .lock_wallet(second)
        .await?
        .ok_or_else(both_wallets_not_found)?;
    let sender = if first == legs.from_user_id {
        first_locked
    } else {
        second_locked
    };

    if sender.balance < legs.amount {
        return Err(LedgerError::InsufficientFunds {
            available: sender.balance,
            requested: legs.amount,
        });
    }

    let from_wallet = unit
        .update_wallet_balance(legs.from_user_id, -legs.amount)
        .await?;
    let to_wallet = unit
        .update_wallet_balance(legs.to_user_id, legs.amount)
        .await?;

    unit.insert_transaction(NewTransaction::completed(
        from_wallet.id,
        TransactionType::Transfer,
        legs.amount,
        legs.sender_description.clone(),
    ))
    .await?;
    unit.insert_transaction(NewTransaction::completed(
        to_wallet.id,
        TransactionType::Credit,
        legs.amount,
        legs.recipient_description.clone(),
    ))
    .await?;

    Ok(TransferOutcome {
        from_wallet,
        to_wallet,
    })
}

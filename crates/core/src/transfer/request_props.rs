//! Property-based tests for the money request state machine.

use proptest::prelude::*;
use rust_decimal::Decimal;

use gcoin_shared::types::UserId;

use crate::ledger::error::LedgerError;
use crate::transfer::request::{
    MoneyRequest, MoneyRequestService, MoneyRequestStatus, RequestResolution,
};

fn arb_status() -> impl Strategy<Value = MoneyRequestStatus> {
    prop_oneof![
        Just(MoneyRequestStatus::Pending),
        Just(MoneyRequestStatus::Approved),
        Just(MoneyRequestStatus::Rejected),
    ]
}

fn arb_user() -> impl Strategy<Value = UserId> {
    any::<u128>().prop_map(|n| UserId::from_uuid(uuid::Uuid::from_u128(n)))
}

fn arb_resolution() -> impl Strategy<Value = RequestResolution> {
    prop_oneof![
        Just(RequestResolution::Approve),
        proptest::option::of("[a-z ]{0,20}").prop_map(|reason| RequestResolution::Reject { reason }),
    ]
}

fn arb_cents() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Anyone other than the payer is always Forbidden, whatever the status.
    #[test]
    fn prop_non_payer_always_forbidden(
        requester in arb_user(),
        payer in arb_user(),
        actor in arb_user(),
        status in arb_status(),
        resolution in arb_resolution(),
        amount in arb_cents(),
    ) {
        prop_assume!(actor != payer);
        let mut request = MoneyRequest::pending(requester, payer, amount, "test");
        request.status = status;

        let result = MoneyRequestService::resolve(&request, actor, resolution);
        prop_assert!(matches!(result, Err(LedgerError::Forbidden(_))));
    }

    /// A payer acting on a resolved request always gets InvalidState.
    #[test]
    fn prop_terminal_requests_are_invalid_state(
        requester in arb_user(),
        payer in arb_user(),
        terminal in prop_oneof![Just(MoneyRequestStatus::Approved), Just(MoneyRequestStatus::Rejected)],
        resolution in arb_resolution(),
        amount in arb_cents(),
    ) {
        let mut request = MoneyRequest::pending(requester, payer, amount, "test");
        request.status = terminal;

        let result = MoneyRequestService::resolve(&request, payer, resolution);
        prop_assert!(matches!(result, Err(LedgerError::InvalidState(_))));
    }

    /// Resolution never alters the amount or the parties.
    #[test]
    fn prop_resolution_preserves_terms(
        requester in arb_user(),
        payer in arb_user(),
        resolution in arb_resolution(),
        amount in arb_cents(),
    ) {
        let request = MoneyRequest::pending(requester, payer, amount, "test");
        let resolved = MoneyRequestService::resolve(&request, payer, resolution).unwrap();

        prop_assert_eq!(resolved.id, request.id);
        prop_assert_eq!(resolved.amount, amount);
        prop_assert_eq!(resolved.requester_id, requester);
        prop_assert_eq!(resolved.from_user_id, payer);
        prop_assert!(resolved.status.is_terminal());
    }

    /// `is_valid_transition` accepts exactly the two transitions out of Pending.
    #[test]
    fn prop_only_pending_transitions(from in arb_status(), to in arb_status()) {
        let expected = from == MoneyRequestStatus::Pending && to != MoneyRequestStatus::Pending;
        prop_assert_eq!(MoneyRequestService::is_valid_transition(from, to), expected);
    }
}

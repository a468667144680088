//! Property-based tests for the balance mutator.
//!
//! - Applying plans one by one keeps every cached balance equal to its ledger replay
//! - Transfers conserve the total across the user's accounts

use std::collections::HashMap;

use bux_shared::types::{AccountId, CurrencyCode, TransactionId, UserId};
use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::mutator::BalanceMutator;
use super::types::{
    AccountSnapshot, LedgerEntry, NewTransaction, TransactionStatus, TransactionType,
};

const USER: UserId = UserId::new(1);
const ACCOUNTS: i64 = 3;

fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn status() -> impl Strategy<Value = TransactionStatus> {
    prop_oneof![
        6 => Just(TransactionStatus::Completed),
        1 => Just(TransactionStatus::Pending),
        1 => Just(TransactionStatus::Failed),
    ]
}

/// (type, amount, source, destination offset, status)
fn postings() -> impl Strategy<Value = Vec<(TransactionType, Decimal, i64, i64, TransactionStatus)>>
{
    prop::collection::vec(
        (
            prop_oneof![
                Just(TransactionType::Income),
                Just(TransactionType::Expense),
                Just(TransactionType::Transfer),
            ],
            amount(),
            1..=ACCOUNTS,
            1..ACCOUNTS,
            status(),
        ),
        0..50,
    )
}

fn new_tx(
    kind: TransactionType,
    amount: Decimal,
    src: AccountId,
    dest: Option<AccountId>,
    status: TransactionStatus,
) -> NewTransaction {
    NewTransaction {
        user_id: USER,
        account_id: src,
        destination_account_id: dest,
        category_id: None,
        transaction_type: kind,
        amount,
        currency: CurrencyCode::parse("EUR").unwrap(),
        description: None,
        transaction_date: Utc::now(),
        status,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_cached_balance_matches_replay(
        openings in prop::collection::vec(-100_000i64..100_000i64, 3),
        rows in postings(),
    ) {
        let opening: HashMap<AccountId, Decimal> = (1..=ACCOUNTS)
            .zip(openings)
            .map(|(id, cents)| (AccountId::new(id), Decimal::new(cents, 2)))
            .collect();
        let mut balances = opening.clone();
        let mut ledger = Vec::new();

        for (i, (kind, amount, src, offset, status)) in rows.into_iter().enumerate() {
            let src = AccountId::new(src);
            let dest = (kind == TransactionType::Transfer)
                .then(|| AccountId::new((src.into_inner() - 1 + offset) % ACCOUNTS + 1));
            let tx = new_tx(kind, amount, src, dest, status);
            prop_assert!(BalanceMutator::validate(&tx).is_ok());

            let snapshot = |id: AccountId| AccountSnapshot { id, user_id: USER, balance: balances[&id] };
            let source = snapshot(src);
            let destination = dest.map(snapshot);
            let plan = BalanceMutator::plan(&tx, Some(&source), destination.as_ref()).unwrap();

            let before: Decimal = balances.values().sum();
            for change in &plan.changes {
                prop_assert_eq!(change.previous, balances[&change.account_id]);
                balances.insert(change.account_id, change.new_balance);
            }
            let after: Decimal = balances.values().sum();
            if kind == TransactionType::Transfer || !status.moves_balance() {
                prop_assert_eq!(before, after);
            }

            ledger.push(LedgerEntry {
                id: TransactionId::new(i64::try_from(i).unwrap() + 1),
                account_id: src,
                destination_account_id: dest,
                transaction_type: kind,
                amount,
                status,
            });
        }

        for (id, cached) in &balances {
            let report = BalanceMutator::reconcile(*id, opening[id], *cached, &ledger);
            prop_assert!(report.is_consistent(), "account {} drifted by {}", id, report.drift);
        }
    }
}

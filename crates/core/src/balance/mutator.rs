//! Balance mutator.

use bux_shared::types::{AccountId, CategoryId, MONEY, TransactionId, UserId};
use rust_decimal::Decimal;

use super::error::BalanceError;
use super::types::{
    AccountReconciliation, AccountSnapshot, BalanceChange, BalanceDelta, BalancePlan, LedgerEntry,
    NewTransaction, TransactionType,
};
use crate::replay::replay;

/// Balance mutator for business logic.
pub struct BalanceMutator;

impl BalanceMutator {
    /// Validates a transaction's own fields, before any account is read.
    ///
    /// # Errors
    ///
    /// See [`BalanceMutator::validate_shape`].
    pub fn validate(tx: &NewTransaction) -> Result<(), BalanceError> {
        Self::validate_shape(
            tx.transaction_type,
            tx.amount,
            tx.account_id,
            tx.destination_account_id,
        )
    }

    /// Checks amount sign and the destination rules shared by transactions and
    /// recurring templates.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount`, `OutOfRange`, `SameAccountTransfer` or
    /// `DestinationOnNonTransfer`.
    pub fn validate_shape(
        transaction_type: TransactionType,
        amount: Decimal,
        account_id: AccountId,
        destination_account_id: Option<AccountId>,
    ) -> Result<(), BalanceError> {
        Self::validate_amount(amount)?;
        match (transaction_type, destination_account_id) {
            (TransactionType::Transfer, Some(dest)) if dest == account_id => {
                Err(BalanceError::SameAccountTransfer)
            }
            (TransactionType::Income | TransactionType::Expense, Some(_)) => {
                Err(BalanceError::DestinationOnNonTransfer)
            }
            _ => Ok(()),
        }
    }

    /// Checks that a posting amount is positive and storable as money.
    ///
    /// # Errors
    ///
    /// Returns `NonPositiveAmount` or `OutOfRange`.
    pub fn validate_amount(amount: Decimal) -> Result<(), BalanceError> {
        if amount <= Decimal::ZERO {
            return Err(BalanceError::NonPositiveAmount);
        }
        if !MONEY.fits(amount) {
            return Err(BalanceError::OutOfRange("amount"));
        }
        Ok(())
    }

    /// Checks that an account's opening balance is storable as money. It may be
    /// zero or negative.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange`.
    pub fn validate_opening_balance(balance: Decimal) -> Result<(), BalanceError> {
        if MONEY.fits(balance) {
            Ok(())
        } else {
            Err(BalanceError::OutOfRange("opening_balance"))
        }
    }

    /// Checks that a referenced category exists and belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` when `owner` is `None`, `CategoryAccessDenied`
    /// on mismatch.
    pub fn check_category(
        category_id: CategoryId,
        owner: Option<UserId>,
        user_id: UserId,
    ) -> Result<(), BalanceError> {
        match owner {
            None => Err(BalanceError::CategoryNotFound(category_id)),
            Some(owner) if owner != user_id => Err(BalanceError::CategoryAccessDenied(category_id)),
            Some(_) => Ok(()),
        }
    }

    /// Checks that a transaction exists and belongs to `user_id`, in that order.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` or `TransactionAccessDenied`.
    pub fn check_transaction(
        transaction_id: TransactionId,
        owner: Option<UserId>,
        user_id: UserId,
    ) -> Result<(), BalanceError> {
        match owner {
            None => Err(BalanceError::TransactionNotFound(transaction_id)),
            Some(owner) if owner != user_id => {
                Err(BalanceError::TransactionAccessDenied(transaction_id))
            }
            Some(_) => Ok(()),
        }
    }

    /// Returns the signed amount each touched account moves by.
    ///
    /// The source account comes first. This is the single place where the sign
    /// convention lives; posting and reconciliation both go through it.
    ///
    /// # Errors
    ///
    /// Returns `DestinationAccountRequired` for a transfer without a destination.
    pub fn signed_deltas(
        transaction_type: TransactionType,
        amount: Decimal,
        account_id: AccountId,
        destination_account_id: Option<AccountId>,
    ) -> Result<Vec<(AccountId, Decimal)>, BalanceError> {
        match transaction_type {
            TransactionType::Income => Ok(vec![(account_id, amount)]),
            TransactionType::Expense => Ok(vec![(account_id, -amount)]),
            TransactionType::Transfer => {
                let dest = destination_account_id.ok_or(BalanceError::DestinationAccountRequired)?;
                Ok(vec![(account_id, -amount), (dest, amount)])
            }
        }
    }

    /// Computes the balance updates for a validated transaction.
    ///
    /// `source` and `destination` are the accounts as read (and locked) by the
    /// caller; `None` means the id did not resolve. Existence is checked before
    /// ownership, source before destination. Transactions that are not
    /// completed pass the checks and produce an empty plan.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `AccessDenied`, `DestinationAccountRequired`
    /// or `DestinationAccountNotFound`.
    pub fn plan(
        tx: &NewTransaction,
        source: Option<&AccountSnapshot>,
        destination: Option<&AccountSnapshot>,
    ) -> Result<BalancePlan, BalanceError> {
        let source = source.ok_or(BalanceError::AccountNotFound(tx.account_id))?;
        if source.user_id != tx.user_id {
            return Err(BalanceError::AccessDenied(source.id));
        }

        let destination = if tx.transaction_type == TransactionType::Transfer {
            let dest_id = tx
                .destination_account_id
                .ok_or(BalanceError::DestinationAccountRequired)?;
            let dest = destination.ok_or(BalanceError::DestinationAccountNotFound(dest_id))?;
            if dest.user_id != tx.user_id {
                return Err(BalanceError::AccessDenied(dest.id));
            }
            Some(dest)
        } else {
            None
        };

        if !tx.status.moves_balance() {
            return Ok(BalancePlan::default());
        }

        let changes = Self::signed_deltas(
            tx.transaction_type,
            tx.amount,
            source.id,
            destination.map(|d| d.id),
        )?
        .into_iter()
        .map(|(account_id, delta)| {
            let previous = if account_id == source.id {
                source.balance
            } else {
                destination.map_or(Decimal::ZERO, |d| d.balance)
            };
            BalanceChange {
                account_id,
                previous,
                delta,
                new_balance: previous + delta,
            }
        })
        .collect();

        Ok(BalancePlan { changes })
    }

    /// Replays the completed transactions touching `account_id` and compares
    /// the result with the cached balance.
    ///
    /// Entries that do not touch the account are ignored.
    #[must_use]
    pub fn reconcile(
        account_id: AccountId,
        opening_balance: Decimal,
        cached_balance: Decimal,
        entries: &[LedgerEntry],
    ) -> AccountReconciliation {
        let deltas: Vec<BalanceDelta> = entries
            .iter()
            .filter(|e| e.status.moves_balance())
            .filter_map(|e| {
                let moves = Self::signed_deltas(
                    e.transaction_type,
                    e.amount,
                    e.account_id,
                    e.destination_account_id,
                )
                .ok()?;
                let delta: Decimal = moves
                    .iter()
                    .filter(|(id, _)| *id == account_id)
                    .map(|(_, d)| *d)
                    .sum();
                Some(BalanceDelta {
                    transaction_id: e.id,
                    delta,
                })
            })
            .collect();

        let ledger_balance = opening_balance + replay(&deltas);
        AccountReconciliation {
            account_id,
            opening_balance,
            cached_balance,
            ledger_balance,
            drift: cached_balance - ledger_balance,
        }
    }
}

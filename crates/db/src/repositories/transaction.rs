//! Transaction repository for ledger postings and their balance effects.
//!
//! Every posting runs in one storage transaction: the touched account rows are
//! locked `FOR UPDATE` in ascending id order, the balance plan is computed from
//! the locked rows, balances are written and the transaction row is inserted.
//! Any failure rolls the whole unit back.

use std::collections::HashMap;

use bux_core::balance::{AccountSnapshot, BalanceError, BalanceMutator, NewTransaction};
use bux_shared::types::{AccountId, CategoryId, RecurringTransactionId, TransactionId, UserId};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

use crate::entities::{accounts, categories, transactions};

/// Error types for transaction and account operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// Validation, lookup or ownership failure.
    #[error(transparent)]
    Balance(#[from] BalanceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl TransactionError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Balance(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Balance(e) => e.http_status_code(),
            Self::Database(_) => 500,
        }
    }
}

/// A posted transaction together with the balances it produced.
#[derive(Debug, Clone)]
pub struct PostedTransaction {
    /// The transaction row.
    pub transaction: transactions::Model,
    /// Updated account rows, source first; empty when the status does not move balances.
    pub accounts: Vec<accounts::Model>,
}

/// Transaction repository for posting and listing transactions.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Validates and posts a transaction, updating the affected balances atomically.
    ///
    /// # Errors
    ///
    /// Returns validation errors, `AccountNotFound`, `DestinationAccountNotFound`,
    /// `AccessDenied`, `DestinationAccountRequired`, `CategoryNotFound`,
    /// `CategoryAccessDenied` or a database error. On error nothing is written.
    pub async fn create_transaction(
        &self,
        tx: NewTransaction,
    ) -> Result<PostedTransaction, TransactionError> {
        BalanceMutator::validate(&tx)?;

        let txn = self.db.begin().await?;
        let posted = Self::create_in(&txn, &tx, None).await?;
        txn.commit().await?;

        tracing::info!(
            transaction_id = posted.transaction.id,
            account_id = %tx.account_id,
            transaction_type = %tx.transaction_type,
            amount = %tx.amount,
            "Transaction posted"
        );
        Ok(posted)
    }

    /// Posts a transaction inside a caller-owned storage transaction.
    ///
    /// Used directly by the recurring scheduler so that a posting and the rule's
    /// cursor advance commit together.
    ///
    /// # Errors
    ///
    /// Same as [`TransactionRepository::create_transaction`].
    pub async fn create_in(
        txn: &DatabaseTransaction,
        tx: &NewTransaction,
        recurring_id: Option<RecurringTransactionId>,
    ) -> Result<PostedTransaction, TransactionError> {
        BalanceMutator::validate(tx)?;

        let mut locked = Self::lock_accounts(txn, tx.account_id, tx.destination_account_id).await?;
        let snapshot = |id: Option<AccountId>| {
            id.and_then(|id| locked.get(&id)).map(|a| AccountSnapshot {
                id: AccountId::new(a.id),
                user_id: UserId::new(a.user_id),
                balance: a.balance,
            })
        };
        let source = snapshot(Some(tx.account_id));
        let destination = snapshot(tx.destination_account_id);

        let plan = BalanceMutator::plan(tx, source.as_ref(), destination.as_ref())?;
        Self::check_category(txn, tx.category_id, tx.user_id).await?;

        let now = Utc::now().fixed_offset();
        let mut updated = Vec::with_capacity(plan.changes.len());
        for change in &plan.changes {
            let Some(account) = locked.remove(&change.account_id) else {
                continue;
            };
            let mut account: accounts::ActiveModel = account.into();
            account.balance = Set(change.new_balance);
            account.updated_at = Set(now);
            updated.push(account.update(txn).await?);

            tracing::debug!(
                account_id = %change.account_id,
                previous = %change.previous,
                delta = %change.delta,
                new_balance = %change.new_balance,
                "Balance updated"
            );
        }

        let row = transactions::ActiveModel {
            user_id: Set(tx.user_id.into()),
            account_id: Set(tx.account_id.into()),
            destination_account_id: Set(tx.destination_account_id.map(i64::from)),
            category_id: Set(tx.category_id.map(i64::from)),
            recurring_transaction_id: Set(recurring_id.map(i64::from)),
            transaction_type: Set(tx.transaction_type.into()),
            amount: Set(tx.amount),
            currency: Set(tx.currency.to_string()),
            description: Set(tx.description.clone()),
            transaction_date: Set(tx.transaction_date.fixed_offset()),
            status: Set(tx.status.into()),
            created_at: Set(now),
            ..Default::default()
        };
        let transaction = row.insert(txn).await?;

        Ok(PostedTransaction {
            transaction,
            accounts: updated,
        })
    }

    /// Checks that an optional category exists and belongs to `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` (404), `CategoryAccessDenied` (403) or a
    /// database error.
    pub async fn check_category<C: ConnectionTrait>(
        conn: &C,
        category_id: Option<CategoryId>,
        user_id: UserId,
    ) -> Result<(), TransactionError> {
        let Some(category_id) = category_id else {
            return Ok(());
        };
        let category = categories::Entity::find_by_id(i64::from(category_id))
            .one(conn)
            .await?;
        BalanceMutator::check_category(category_id, category.map(|c| UserId::new(c.user_id)), user_id)?;
        Ok(())
    }

    /// Locks the source and (optional) destination rows in ascending id order.
    ///
    /// Missing ids are simply absent from the returned map.
    async fn lock_accounts(
        txn: &DatabaseTransaction,
        account_id: AccountId,
        destination_account_id: Option<AccountId>,
    ) -> Result<HashMap<AccountId, accounts::Model>, TransactionError> {
        let mut ids: Vec<AccountId> = std::iter::once(account_id)
            .chain(destination_account_id)
            .collect();
        ids.sort_unstable();
        ids.dedup();

        let mut locked = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(account) = accounts::Entity::find_by_id(i64::from(id))
                .lock_exclusive()
                .one(txn)
                .await?
            {
                locked.insert(id, account);
            }
        }
        Ok(locked)
    }

    /// Loads one transaction, checking existence before ownership.
    ///
    /// # Errors
    ///
    /// Returns `TransactionNotFound` (404), `TransactionAccessDenied` (403) or a
    /// database error.
    pub async fn get_transaction(
        &self,
        id: TransactionId,
        user_id: UserId,
    ) -> Result<transactions::Model, TransactionError> {
        let row = transactions::Entity::find_by_id(i64::from(id))
            .one(&self.db)
            .await?;
        BalanceMutator::check_transaction(id, row.as_ref().map(|t| UserId::new(t.user_id)), user_id)?;
        row.ok_or(BalanceError::TransactionNotFound(id).into())
    }

    /// Lists a user's transactions, newest first, optionally narrowed to one account.
    ///
    /// The account filter matches both the source and the destination side.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_transactions(
        &self,
        user_id: UserId,
        account_id: Option<AccountId>,
    ) -> Result<Vec<transactions::Model>, TransactionError> {
        let mut query =
            transactions::Entity::find().filter(transactions::Column::UserId.eq(i64::from(user_id)));

        if let Some(account_id) = account_id {
            let account_id = i64::from(account_id);
            query = query.filter(
                Condition::any()
                    .add(transactions::Column::AccountId.eq(account_id))
                    .add(transactions::Column::DestinationAccountId.eq(account_id)),
            );
        }

        let rows = query
            .order_by_desc(transactions::Column::TransactionDate)
            .order_by_desc(transactions::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rows)
    }
}

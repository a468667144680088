//! Account repository for cash accounts and balance reconciliation.

use bux_core::balance::{AccountReconciliation, BalanceError, BalanceMutator, LedgerEntry};
use bux_shared::types::{AccountId, CurrencyCode, TransactionId, UserId};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};

use super::transaction::TransactionError;
use crate::entities::{accounts, transactions};

/// Input for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    /// Owning user.
    pub user_id: UserId,
    /// Display name.
    pub name: String,
    /// Currency label.
    pub currency: CurrencyCode,
    /// Balance the account starts with.
    pub opening_balance: Decimal,
}

/// Changes to an account. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    /// New display name.
    pub name: Option<String>,
    /// Reopen or close the account.
    pub is_active: Option<bool>,
}

/// Account repository for CRUD and reconciliation.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an account whose cached balance starts at its opening balance.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRange` when the opening balance cannot be stored, or a
    /// database error.
    pub async fn create_account(
        &self,
        input: CreateAccountInput,
    ) -> Result<accounts::Model, TransactionError> {
        BalanceMutator::validate_opening_balance(input.opening_balance)?;

        let now = Utc::now().fixed_offset();
        let account = accounts::ActiveModel {
            user_id: Set(input.user_id.into()),
            name: Set(input.name),
            currency: Set(input.currency.into()),
            balance: Set(input.opening_balance),
            opening_balance: Set(input.opening_balance),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let account = account.insert(&self.db).await?;

        tracing::info!(account_id = account.id, user_id = %input.user_id, "Account created");
        Ok(account)
    }

    /// Loads an account, checking existence before ownership.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` (404) or `AccessDenied` (403).
    pub async fn get_account(
        &self,
        account_id: AccountId,
        user_id: UserId,
    ) -> Result<accounts::Model, TransactionError> {
        let account = accounts::Entity::find_by_id(i64::from(account_id))
            .one(&self.db)
            .await?
            .ok_or(BalanceError::AccountNotFound(account_id))?;
        if account.user_id != i64::from(user_id) {
            return Err(BalanceError::AccessDenied(account_id).into());
        }
        Ok(account)
    }

    /// Lists a user's accounts by id, optionally only the active ones.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_accounts(
        &self,
        user_id: UserId,
        active_only: bool,
    ) -> Result<Vec<accounts::Model>, TransactionError> {
        let mut query =
            accounts::Entity::find().filter(accounts::Column::UserId.eq(i64::from(user_id)));
        if active_only {
            query = query.filter(accounts::Column::IsActive.eq(true));
        }
        let accounts = query.order_by_asc(accounts::Column::Id).all(&self.db).await?;
        Ok(accounts)
    }

    /// Renames, closes or reopens an account. The balance is never touched here.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `AccessDenied` or a database error.
    pub async fn update_account(
        &self,
        account_id: AccountId,
        user_id: UserId,
        input: UpdateAccountInput,
    ) -> Result<accounts::Model, TransactionError> {
        let account = self.get_account(account_id, user_id).await?;

        let mut account: accounts::ActiveModel = account.into();
        if let Some(name) = input.name {
            account.name = Set(name);
        }
        if let Some(is_active) = input.is_active {
            account.is_active = Set(is_active);
        }
        account.updated_at = Set(Utc::now().fixed_offset());
        let account = account.update(&self.db).await?;

        tracing::info!(account_id = %account_id, is_active = account.is_active, "Account updated");
        Ok(account)
    }

    /// Closes an account. The row and its ledger are kept so history and
    /// reconciliation still work.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `AccessDenied` or a database error.
    pub async fn deactivate_account(
        &self,
        account_id: AccountId,
        user_id: UserId,
    ) -> Result<accounts::Model, TransactionError> {
        self.update_account(
            account_id,
            user_id,
            UpdateAccountInput {
                name: None,
                is_active: Some(false),
            },
        )
        .await
    }

    /// Replays the account's ledger and compares it with the cached balance.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound`, `AccessDenied` or a database error.
    pub async fn reconcile(
        &self,
        account_id: AccountId,
        user_id: UserId,
    ) -> Result<AccountReconciliation, TransactionError> {
        let account = self.get_account(account_id, user_id).await?;
        let raw_id = i64::from(account_id);

        let entries: Vec<LedgerEntry> = transactions::Entity::find()
            .filter(
                Condition::any()
                    .add(transactions::Column::AccountId.eq(raw_id))
                    .add(transactions::Column::DestinationAccountId.eq(raw_id)),
            )
            .order_by_asc(transactions::Column::TransactionDate)
            .order_by_asc(transactions::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|t| LedgerEntry {
                id: TransactionId::new(t.id),
                account_id: AccountId::new(t.account_id),
                destination_account_id: t.destination_account_id.map(AccountId::new),
                transaction_type: t.transaction_type.into(),
                amount: t.amount,
                status: t.status.into(),
            })
            .collect();

        let report = BalanceMutator::reconcile(
            account_id,
            account.opening_balance,
            account.balance,
            &entries,
        );

        if report.is_consistent() {
            tracing::debug!(account_id = %account_id, entries = entries.len(), "Account reconciled");
        } else {
            tracing::warn!(
                account_id = %account_id,
                cached = %report.cached_balance,
                ledger = %report.ledger_balance,
                drift = %report.drift,
                "Account balance drift detected"
            );
        }
        Ok(report)
    }
}

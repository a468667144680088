//! Recurring transaction repository.
//!
//! Each firing posts one transaction and advances the rule's cursor inside the
//! same storage transaction, with the rule row locked `FOR UPDATE`.

use bux_core::balance::BalanceError;
use bux_core::recurring::{
    Firing, NewRecurringRule, Posting, RecurringError, RecurringRule, RecurringScheduler,
    RecurringUpdate,
};
use bux_shared::types::{AccountId, CategoryId, CurrencyCode, RecurringTransactionId, UserId};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use super::transaction::{PostedTransaction, TransactionError, TransactionRepository};
use crate::entities::{accounts, recurring_transactions};

/// Error types for recurring transaction operations.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Rule validation, ownership, state or posting failure.
    #[error(transparent)]
    Recurring(#[from] RecurringError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<BalanceError> for SchedulerError {
    fn from(err: BalanceError) -> Self {
        Self::Recurring(err.into())
    }
}

impl From<TransactionError> for SchedulerError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::Balance(e) => e.into(),
            TransactionError::Database(e) => Self::Database(e),
        }
    }
}

impl SchedulerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Recurring(e) => e.error_code(),
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Recurring(e) => e.http_status_code(),
            Self::Database(_) => 500,
        }
    }
}

/// Result of firing a rule once.
#[derive(Debug, Clone)]
pub struct ExecutedRule {
    /// The posting.
    pub posted: PostedTransaction,
    /// The rule after its cursor advanced.
    pub rule: recurring_transactions::Model,
}

/// Converts a stored rule into its core representation.
fn to_rule(model: &recurring_transactions::Model) -> Result<RecurringRule, SchedulerError> {
    let currency = CurrencyCode::parse(&model.currency).map_err(BalanceError::from)?;
    Ok(RecurringRule {
        id: RecurringTransactionId::new(model.id),
        user_id: UserId::new(model.user_id),
        account_id: AccountId::new(model.account_id),
        destination_account_id: model.destination_account_id.map(AccountId::new),
        category_id: model.category_id.map(CategoryId::new),
        transaction_type: model.transaction_type.into(),
        amount: model.amount,
        currency,
        description: model.description.clone(),
        frequency: model.frequency.into(),
        next_date: model.next_date.to_utc(),
        end_date: model.end_date.map(|d| d.to_utc()),
        is_active: model.is_active,
    })
}

/// Recurring repository for rule management and firing.
#[derive(Debug, Clone)]
pub struct RecurringRepository {
    db: DatabaseConnection,
}

impl RecurringRepository {
    /// Creates a new recurring repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates an active rule; `next_date` defaults to `now`.
    ///
    /// # Errors
    ///
    /// Returns validation errors, `AccountNotFound`, `DestinationAccountNotFound`,
    /// `AccessDenied`, `CategoryNotFound`, `CategoryAccessDenied` or a database
    /// error.
    pub async fn create(
        &self,
        rule: NewRecurringRule,
        now: DateTime<Utc>,
    ) -> Result<recurring_transactions::Model, SchedulerError> {
        RecurringScheduler::validate_new(&rule)?;

        self.check_account(rule.account_id, rule.user_id, false).await?;
        if let Some(dest) = rule.destination_account_id {
            self.check_account(dest, rule.user_id, true).await?;
        }
        TransactionRepository::check_category(&self.db, rule.category_id, rule.user_id).await?;

        let created_at = now.fixed_offset();
        let model = recurring_transactions::ActiveModel {
            user_id: Set(rule.user_id.into()),
            account_id: Set(rule.account_id.into()),
            destination_account_id: Set(rule.destination_account_id.map(i64::from)),
            category_id: Set(rule.category_id.map(i64::from)),
            transaction_type: Set(rule.transaction_type.into()),
            amount: Set(rule.amount),
            currency: Set(rule.currency.into()),
            description: Set(rule.description),
            frequency: Set(rule.frequency.into()),
            next_date: Set(rule.next_date.unwrap_or(now).fixed_offset()),
            end_date: Set(rule.end_date.map(|d| d.fixed_offset())),
            is_active: Set(true),
            created_at: Set(created_at),
            updated_at: Set(created_at),
            ..Default::default()
        };
        let model = model.insert(&self.db).await?;

        tracing::info!(
            recurring_id = model.id,
            user_id = %rule.user_id,
            frequency = %rule.frequency,
            "Recurring transaction created"
        );
        Ok(model)
    }

    async fn check_account(
        &self,
        account_id: AccountId,
        user_id: UserId,
        destination: bool,
    ) -> Result<(), SchedulerError> {
        let account = accounts::Entity::find_by_id(i64::from(account_id))
            .one(&self.db)
            .await?;
        match account {
            None if destination => Err(BalanceError::DestinationAccountNotFound(account_id).into()),
            None => Err(BalanceError::AccountNotFound(account_id).into()),
            Some(a) if a.user_id != i64::from(user_id) => {
                Err(BalanceError::AccessDenied(account_id).into())
            }
            Some(_) => Ok(()),
        }
    }

    /// Lists a user's rules by next firing date.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(
        &self,
        user_id: UserId,
    ) -> Result<Vec<recurring_transactions::Model>, SchedulerError> {
        let rules = recurring_transactions::Entity::find()
            .filter(recurring_transactions::Column::UserId.eq(i64::from(user_id)))
            .order_by_asc(recurring_transactions::Column::NextDate)
            .order_by_asc(recurring_transactions::Column::Id)
            .all(&self.db)
            .await?;
        Ok(rules)
    }

    /// Loads a rule, checking existence before ownership.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` (404) or `AccessDenied` (403).
    pub async fn get(
        &self,
        id: RecurringTransactionId,
        user_id: UserId,
    ) -> Result<recurring_transactions::Model, SchedulerError> {
        let rule = recurring_transactions::Entity::find_by_id(i64::from(id))
            .one(&self.db)
            .await?;
        Self::owned(id, rule, user_id)
    }

    fn owned(
        id: RecurringTransactionId,
        rule: Option<recurring_transactions::Model>,
        user_id: UserId,
    ) -> Result<recurring_transactions::Model, SchedulerError> {
        RecurringScheduler::check_owner(
            id,
            rule.as_ref().map(|r| UserId::new(r.user_id)),
            user_id,
        )?;
        rule.ok_or(RecurringError::NotFound(id).into())
    }

    /// Applies the set fields of `update` to a rule.
    ///
    /// # Errors
    ///
    /// Returns validation errors, `NotFound`, `AccessDenied`, `CategoryNotFound`,
    /// `CategoryAccessDenied` or a database error.
    pub async fn update(
        &self,
        id: RecurringTransactionId,
        user_id: UserId,
        update: RecurringUpdate,
    ) -> Result<recurring_transactions::Model, SchedulerError> {
        RecurringScheduler::validate_update(&update)?;
        let rule = self.get(id, user_id).await?;
        TransactionRepository::check_category(&self.db, update.category_id, user_id).await?;

        let mut rule: recurring_transactions::ActiveModel = rule.into();
        if let Some(amount) = update.amount {
            rule.amount = Set(amount);
        }
        if let Some(description) = update.description {
            rule.description = Set(Some(description));
        }
        if let Some(category_id) = update.category_id {
            rule.category_id = Set(Some(category_id.into()));
        }
        if let Some(frequency) = update.frequency {
            rule.frequency = Set(frequency.into());
        }
        if let Some(next_date) = update.next_date {
            rule.next_date = Set(next_date.fixed_offset());
        }
        if let Some(end_date) = update.end_date {
            rule.end_date = Set(Some(end_date.fixed_offset()));
        }
        rule.updated_at = Set(Utc::now().fixed_offset());
        let rule = rule.update(&self.db).await?;

        tracing::info!(recurring_id = %id, "Recurring transaction updated");
        Ok(rule)
    }

    /// Flips `is_active`. This is the only way back from `inactive`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `AccessDenied` or a database error.
    pub async fn toggle(
        &self,
        id: RecurringTransactionId,
        user_id: UserId,
    ) -> Result<recurring_transactions::Model, SchedulerError> {
        let rule = self.get(id, user_id).await?;
        let is_active = !rule.is_active;

        let mut rule: recurring_transactions::ActiveModel = rule.into();
        rule.is_active = Set(is_active);
        rule.updated_at = Set(Utc::now().fixed_offset());
        let rule = rule.update(&self.db).await?;

        tracing::info!(recurring_id = %id, is_active, "Recurring transaction toggled");
        Ok(rule)
    }

    /// Deletes a rule. Transactions it already posted are kept.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `AccessDenied` or a database error.
    pub async fn delete(
        &self,
        id: RecurringTransactionId,
        user_id: UserId,
    ) -> Result<(), SchedulerError> {
        self.get(id, user_id).await?;
        recurring_transactions::Entity::delete_by_id(i64::from(id))
            .exec(&self.db)
            .await?;

        tracing::info!(recurring_id = %id, "Recurring transaction deleted");
        Ok(())
    }

    /// Fires a rule manually: posts at `now` and advances from `max(next_date, now)`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `AccessDenied`, `Inactive`, posting errors or a
    /// database error. On error neither the posting nor the cursor move is kept.
    pub async fn execute(
        &self,
        id: RecurringTransactionId,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<ExecutedRule, SchedulerError> {
        let txn = self.db.begin().await?;

        let model = Self::lock_rule(&txn, id).await?;
        let model = Self::owned(id, model, user_id)?;
        let rule = to_rule(&model)?;

        let posting = RecurringScheduler::plan_manual(&rule, now)?;
        let executed = Self::post_and_advance(&txn, model, &rule, posting).await?;
        txn.commit().await?;

        tracing::info!(
            recurring_id = %id,
            transaction_id = executed.posted.transaction.id,
            next_date = %executed.rule.next_date,
            is_active = executed.rule.is_active,
            "Recurring transaction executed"
        );
        Ok(executed)
    }

    /// Fires every active rule whose `next_date` is at or before `before`.
    ///
    /// With `owner` set only that user's rules are swept; `None` sweeps every
    /// user and is reserved for the operator sweep. Each rule fires at most once, in its own storage transaction, posting at
    /// its scheduled `next_date`. Rules already past their `end_date` are
    /// deactivated without posting. A failing rule is logged and skipped; its
    /// cursor stays put so the next sweep retries it.
    ///
    /// Returns the number of transactions posted.
    ///
    /// # Errors
    ///
    /// Returns an error only if the due rules cannot be listed.
    pub async fn process_due(
        &self,
        before: DateTime<Utc>,
        owner: Option<UserId>,
    ) -> Result<u64, SchedulerError> {
        let mut query = recurring_transactions::Entity::find()
            .select_only()
            .column(recurring_transactions::Column::Id)
            .filter(recurring_transactions::Column::IsActive.eq(true))
            .filter(recurring_transactions::Column::NextDate.lte(before.fixed_offset()));
        if let Some(owner) = owner {
            query = query.filter(recurring_transactions::Column::UserId.eq(i64::from(owner)));
        }
        let due: Vec<i64> = query
            .order_by_asc(recurring_transactions::Column::NextDate)
            .order_by_asc(recurring_transactions::Column::Id)
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut processed = 0u64;
        for raw_id in due {
            let id = RecurringTransactionId::new(raw_id);
            match self.fire_scheduled(id, before).await {
                Ok(true) => processed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(recurring_id = %id, error = %e, "Recurring transaction failed, skipping");
                }
            }
        }

        tracing::info!(
            processed,
            before = %before,
            owner = owner.map(i64::from),
            "Processed due recurring transactions"
        );
        Ok(processed)
    }

    /// Fires one due rule. Returns true if a transaction was posted.
    async fn fire_scheduled(
        &self,
        id: RecurringTransactionId,
        before: DateTime<Utc>,
    ) -> Result<bool, SchedulerError> {
        let txn = self.db.begin().await?;

        let Some(model) = Self::lock_rule(&txn, id).await? else {
            return Ok(false);
        };
        let rule = to_rule(&model)?;
        // Another sweep may have fired it between listing and locking.
        if !RecurringScheduler::is_due(&rule, before) {
            return Ok(false);
        }

        let posted = match RecurringScheduler::plan_scheduled(&rule)? {
            Firing::Post(posting) => {
                Self::post_and_advance(&txn, model, &rule, posting).await?;
                true
            }
            Firing::Expire => {
                let mut active: recurring_transactions::ActiveModel = model.into();
                active.is_active = Set(false);
                active.updated_at = Set(Utc::now().fixed_offset());
                active.update(&txn).await?;
                tracing::info!(recurring_id = %id, "Recurring transaction expired");
                false
            }
        };
        txn.commit().await?;
        Ok(posted)
    }

    async fn lock_rule(
        txn: &DatabaseTransaction,
        id: RecurringTransactionId,
    ) -> Result<Option<recurring_transactions::Model>, SchedulerError> {
        let rule = recurring_transactions::Entity::find_by_id(i64::from(id))
            .lock_exclusive()
            .one(txn)
            .await?;
        Ok(rule)
    }

    /// Posts the rule's transaction and moves its cursor, inside `txn`.
    async fn post_and_advance(
        txn: &DatabaseTransaction,
        model: recurring_transactions::Model,
        rule: &RecurringRule,
        posting: Posting,
    ) -> Result<ExecutedRule, SchedulerError> {
        let posted = TransactionRepository::create_in(
            txn,
            &rule.posting(posting.posted_at),
            Some(rule.id),
        )
        .await?;

        let mut active: recurring_transactions::ActiveModel = model.into();
        active.next_date = Set(posting.next_date.fixed_offset());
        active.is_active = Set(posting.still_active);
        active.updated_at = Set(Utc::now().fixed_offset());
        let rule = active.update(txn).await?;

        Ok(ExecutedRule { posted, rule })
    }
}

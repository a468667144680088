//! Recurring scheduler.

use bux_shared::types::{RecurringTransactionId, UserId};
use chrono::{DateTime, Utc};

use super::error::RecurringError;
use super::types::{Firing, Frequency, NewRecurringRule, Posting, RecurringRule, RecurringUpdate};
use crate::balance::{BalanceError, BalanceMutator, TransactionType};

/// Recurring scheduler for business logic.
pub struct RecurringScheduler;

impl RecurringScheduler {
    /// Validates a new rule with the same checks a posted transaction gets.
    ///
    /// Transfer rules must name their destination up front.
    ///
    /// # Errors
    ///
    /// Returns `RecurringError::Transaction` wrapping the balance validation error.
    pub fn validate_new(rule: &NewRecurringRule) -> Result<(), RecurringError> {
        BalanceMutator::validate_shape(
            rule.transaction_type,
            rule.amount,
            rule.account_id,
            rule.destination_account_id,
        )?;
        if rule.transaction_type == TransactionType::Transfer
            && rule.destination_account_id.is_none()
        {
            return Err(BalanceError::DestinationAccountRequired.into());
        }
        Ok(())
    }

    /// Validates changes to an existing rule.
    ///
    /// # Errors
    ///
    /// Returns `RecurringError::Transaction` wrapping `NonPositiveAmount` or
    /// `OutOfRange` for a bad amount.
    pub fn validate_update(update: &RecurringUpdate) -> Result<(), RecurringError> {
        if let Some(amount) = update.amount {
            BalanceMutator::validate_amount(amount)?;
        }
        Ok(())
    }

    /// Checks that a rule exists and belongs to `user_id`, in that order.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when `owner` is `None`, `AccessDenied` on mismatch.
    pub fn check_owner(
        id: RecurringTransactionId,
        owner: Option<UserId>,
        user_id: UserId,
    ) -> Result<(), RecurringError> {
        match owner {
            None => Err(RecurringError::NotFound(id)),
            Some(owner) if owner != user_id => Err(RecurringError::AccessDenied(id)),
            Some(_) => Ok(()),
        }
    }

    /// Returns true if the batch sweep should pick this rule up.
    #[must_use]
    pub fn is_due(rule: &RecurringRule, before: DateTime<Utc>) -> bool {
        rule.is_active && rule.next_date <= before
    }

    /// Plans a manual execution at `now`.
    ///
    /// The posting is dated `now`; the cursor advances from whichever of
    /// `next_date` and `now` is later.
    ///
    /// # Errors
    ///
    /// Returns `Inactive` for an inactive rule, `DateOverflow` if the cursor
    /// cannot advance.
    pub fn plan_manual(rule: &RecurringRule, now: DateTime<Utc>) -> Result<Posting, RecurringError> {
        if !rule.is_active {
            return Err(RecurringError::Inactive(rule.id));
        }
        let base = rule.next_date.max(now);
        Self::post(rule, now, base)
    }

    /// Plans a batch-sweep firing.
    ///
    /// The posting is dated at the rule's `next_date`. A rule whose cursor is
    /// already past its `end_date` expires without posting.
    ///
    /// # Errors
    ///
    /// Returns `Inactive` for an inactive rule, `DateOverflow` if the cursor
    /// cannot advance.
    pub fn plan_scheduled(rule: &RecurringRule) -> Result<Firing, RecurringError> {
        if !rule.is_active {
            return Err(RecurringError::Inactive(rule.id));
        }
        if rule.end_date.is_some_and(|end| rule.next_date > end) {
            return Ok(Firing::Expire);
        }
        Self::post(rule, rule.next_date, rule.next_date).map(Firing::Post)
    }

    fn post(
        rule: &RecurringRule,
        posted_at: DateTime<Utc>,
        base: DateTime<Utc>,
    ) -> Result<Posting, RecurringError> {
        let next_date = Self::advance(rule.frequency, base)?;
        let still_active = rule.end_date.is_none_or(|end| next_date <= end);
        Ok(Posting {
            posted_at,
            next_date,
            still_active,
        })
    }

    /// Advances `date` by one period of `frequency`.
    ///
    /// # Errors
    ///
    /// Returns `DateOverflow` when the result is out of range.
    pub fn advance(frequency: Frequency, date: DateTime<Utc>) -> Result<DateTime<Utc>, RecurringError> {
        frequency.advance(date).ok_or(RecurringError::DateOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bux_shared::types::{AccountId, CurrencyCode};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn rule(next: DateTime<Utc>, end: Option<DateTime<Utc>>) -> RecurringRule {
        RecurringRule {
            id: RecurringTransactionId::new(1),
            user_id: UserId::new(1),
            account_id: AccountId::new(1),
            destination_account_id: None,
            category_id: None,
            transaction_type: TransactionType::Expense,
            amount: dec!(42),
            currency: CurrencyCode::parse("USD").unwrap(),
            description: Some("Rent".into()),
            frequency: Frequency::Monthly,
            next_date: next,
            end_date: end,
            is_active: true,
        }
    }

    fn new_rule(kind: TransactionType, dest: Option<i64>) -> NewRecurringRule {
        NewRecurringRule {
            user_id: UserId::new(1),
            account_id: AccountId::new(1),
            destination_account_id: dest.map(AccountId::new),
            category_id: None,
            transaction_type: kind,
            amount: dec!(10),
            currency: CurrencyCode::parse("USD").unwrap(),
            description: None,
            frequency: Frequency::Weekly,
            next_date: None,
            end_date: None,
        }
    }

    #[test]
    fn test_scheduled_posts_at_next_date() {
        let r = rule(at(2024, 1, 15), None);
        assert!(RecurringScheduler::is_due(&r, at(2024, 2, 1)));
        assert_eq!(
            RecurringScheduler::plan_scheduled(&r).unwrap(),
            Firing::Post(Posting {
                posted_at: at(2024, 1, 15),
                next_date: at(2024, 2, 15),
                still_active: true,
            })
        );
    }

    #[test]
    fn test_manual_posts_at_now_and_advances_from_later_date() {
        let now = at(2024, 3, 10);
        let r = rule(at(2024, 1, 15), None);
        assert_eq!(
            RecurringScheduler::plan_manual(&r, now).unwrap(),
            Posting {
                posted_at: now,
                next_date: at(2024, 4, 10),
                still_active: true,
            }
        );

        let future = rule(at(2024, 5, 1), None);
        assert_eq!(
            RecurringScheduler::plan_manual(&future, now).unwrap(),
            Posting {
                posted_at: now,
                next_date: at(2024, 6, 1),
                still_active: true,
            }
        );
    }

    #[test]
    fn test_advancing_past_end_date_deactivates() {
        let r = rule(at(2024, 1, 15), Some(at(2024, 2, 1)));
        match RecurringScheduler::plan_scheduled(&r).unwrap() {
            Firing::Post(posting) => assert!(!posting.still_active),
            Firing::Expire => panic!("rule within its end date must post"),
        }
    }

    #[test]
    fn test_landing_on_end_date_stays_active() {
        let r = rule(at(2024, 1, 15), Some(at(2024, 2, 15)));
        assert!(matches!(
            RecurringScheduler::plan_scheduled(&r).unwrap(),
            Firing::Post(Posting { still_active: true, .. })
        ));
    }

    #[test]
    fn test_already_past_end_date_expires_without_posting() {
        let r = rule(at(2024, 3, 1), Some(at(2024, 2, 1)));
        assert_eq!(RecurringScheduler::plan_scheduled(&r).unwrap(), Firing::Expire);
    }

    #[test]
    fn test_inactive_rule_is_rejected_and_not_due() {
        let mut r = rule(at(2024, 1, 15), None);
        r.is_active = false;
        assert!(!RecurringScheduler::is_due(&r, at(2030, 1, 1)));
        assert!(matches!(
            RecurringScheduler::plan_manual(&r, at(2024, 1, 20)),
            Err(RecurringError::Inactive(_))
        ));
        assert!(matches!(
            RecurringScheduler::plan_scheduled(&r),
            Err(RecurringError::Inactive(_))
        ));
    }

    #[test]
    fn test_not_due_before_cursor() {
        let r = rule(at(2024, 1, 15), None);
        assert!(!RecurringScheduler::is_due(&r, at(2024, 1, 15) - Duration::seconds(1)));
        assert!(RecurringScheduler::is_due(&r, at(2024, 1, 15)));
    }

    #[test]
    fn test_posting_copies_template() {
        let r = rule(at(2024, 1, 15), None);
        let tx = r.posting(at(2024, 1, 15));
        assert_eq!(tx.amount, dec!(42));
        assert_eq!(tx.account_id, AccountId::new(1));
        assert_eq!(tx.transaction_date, at(2024, 1, 15));
        assert_eq!(tx.description.as_deref(), Some("Rent"));
    }

    #[test]
    fn test_validate_new() {
        assert!(RecurringScheduler::validate_new(&new_rule(TransactionType::Income, None)).is_ok());
        assert!(matches!(
            RecurringScheduler::validate_new(&new_rule(TransactionType::Transfer, None)),
            Err(RecurringError::Transaction(BalanceError::DestinationAccountRequired))
        ));
        assert!(matches!(
            RecurringScheduler::validate_new(&new_rule(TransactionType::Transfer, Some(1))),
            Err(RecurringError::Transaction(BalanceError::SameAccountTransfer))
        ));
        let mut zero = new_rule(TransactionType::Expense, None);
        zero.amount = dec!(0);
        assert!(matches!(
            RecurringScheduler::validate_new(&zero),
            Err(RecurringError::Transaction(BalanceError::NonPositiveAmount))
        ));
    }

    #[test]
    fn test_validate_update() {
        assert!(RecurringScheduler::validate_update(&RecurringUpdate::default()).is_ok());
        let update = RecurringUpdate {
            amount: Some(dec!(-3)),
            ..RecurringUpdate::default()
        };
        assert!(matches!(
            RecurringScheduler::validate_update(&update),
            Err(RecurringError::Transaction(BalanceError::NonPositiveAmount))
        ));
        let update = RecurringUpdate {
            amount: Some(dec!(9.99999)),
            ..RecurringUpdate::default()
        };
        assert!(matches!(
            RecurringScheduler::validate_update(&update),
            Err(RecurringError::Transaction(BalanceError::OutOfRange("amount")))
        ));
    }

    #[test]
    fn test_check_owner() {
        let id = RecurringTransactionId::new(8);
        assert!(matches!(
            RecurringScheduler::check_owner(id, None, UserId::new(1)),
            Err(RecurringError::NotFound(_))
        ));
        assert!(matches!(
            RecurringScheduler::check_owner(id, Some(UserId::new(2)), UserId::new(1)),
            Err(RecurringError::AccessDenied(_))
        ));
    }
}

//! Integration tests for recurring rules and the due sweep.

mod common;

use bux_core::balance::TransactionType;
use bux_core::recurring::{Frequency, NewRecurringRule, RecurringError, RecurringUpdate};
use bux_db::repositories::{
    AccountRepository, AnalyticsRepository, RecurringRepository, SchedulerError,
    TransactionRepository,
};
use bux_shared::types::{AccountId, CategoryId, RecurringTransactionId, UserId};
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal_macros::dec;

fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn rent(user_id: UserId, account_id: AccountId, frequency: Frequency) -> NewRecurringRule {
    NewRecurringRule {
        user_id,
        account_id,
        destination_account_id: None,
        category_id: None,
        transaction_type: TransactionType::Expense,
        amount: dec!(25),
        currency: common::usd(),
        description: Some("Rent".to_string()),
        frequency,
        next_date: None,
        end_date: None,
    }
}

#[tokio::test]
async fn test_process_due_posts_at_scheduled_date() {
    let Some(db) = common::connect().await else {
        return;
    };
    let user = common::unique_user();
    let account = common::account(&db, user, dec!(100)).await;
    let repo = RecurringRepository::new(db.clone());

    let rule = repo
        .create(
            NewRecurringRule {
                next_date: Some(at(2024, 1, 15)),
                ..rent(user, account, Frequency::Monthly)
            },
            Utc::now(),
        )
        .await
        .unwrap();
    let id = RecurringTransactionId::new(rule.id);

    let processed = repo.process_due(at(2024, 2, 1), Some(user)).await.unwrap();
    assert!(processed >= 1);

    let rule = repo.get(id, user).await.unwrap();
    assert_eq!(rule.next_date.to_utc(), at(2024, 2, 15));
    assert!(rule.is_active);

    let posted = TransactionRepository::new(db.clone())
        .list_transactions(user, Some(account))
        .await
        .unwrap();
    assert_eq!(posted.len(), 1);
    assert_eq!(posted[0].transaction_date.to_utc(), at(2024, 1, 15));
    assert_eq!(posted[0].recurring_transaction_id, Some(rule.id));

    let balance = AccountRepository::new(db.clone())
        .get_account(account, user)
        .await
        .unwrap()
        .balance;
    assert_eq!(balance, dec!(75));

    // Already advanced past the window.
    repo.process_due(at(2024, 2, 1), Some(user)).await.unwrap();
    let posted = TransactionRepository::new(db.clone())
        .list_transactions(user, Some(account))
        .await
        .unwrap();
    assert_eq!(posted.len(), 1);
}

#[tokio::test]
async fn test_rule_deactivates_past_end_date() {
    let Some(db) = common::connect().await else {
        return;
    };
    let user = common::unique_user();
    let account = common::account(&db, user, dec!(100)).await;
    let repo = RecurringRepository::new(db.clone());

    let rule = repo
        .create(
            NewRecurringRule {
                next_date: Some(at(2023, 6, 1)),
                end_date: Some(at(2023, 6, 20)),
                ..rent(user, account, Frequency::Monthly)
            },
            Utc::now(),
        )
        .await
        .unwrap();
    let id = RecurringTransactionId::new(rule.id);

    repo.process_due(at(2023, 6, 2), Some(user)).await.unwrap();
    let rule = repo.get(id, user).await.unwrap();
    assert!(!rule.is_active);
    assert_eq!(rule.next_date.to_utc(), at(2023, 7, 1));

    // Inactive rules are not swept again.
    repo.process_due(at(2023, 12, 31), Some(user)).await.unwrap();
    let posted = TransactionRepository::new(db.clone())
        .list_transactions(user, Some(account))
        .await
        .unwrap();
    assert_eq!(posted.len(), 1);

    let err = repo.execute(id, user, Utc::now()).await.unwrap_err();
    assert!(matches!(
        err,
        SchedulerError::Recurring(RecurringError::Inactive(_))
    ));
}

#[tokio::test]
async fn test_execute_posts_now_and_advances_from_now() {
    let Some(db) = common::connect().await else {
        return;
    };
    let user = common::unique_user();
    let account = common::account(&db, user, dec!(0)).await;
    let repo = RecurringRepository::new(db.clone());
    let now = at(2025, 3, 10);

    let rule = repo
        .create(
            NewRecurringRule {
                next_date: Some(at(2025, 3, 1)),
                ..rent(user, account, Frequency::Weekly)
            },
            now,
        )
        .await
        .unwrap();

    let executed = repo
        .execute(RecurringTransactionId::new(rule.id), user, now)
        .await
        .unwrap();
    assert_eq!(executed.posted.transaction.transaction_date.to_utc(), now);
    assert_eq!(executed.rule.next_date.to_utc(), at(2025, 3, 17));
    assert_eq!(executed.posted.accounts[0].balance, dec!(-25));
}

#[tokio::test]
async fn test_toggle_delete_and_ownership() {
    let Some(db) = common::connect().await else {
        return;
    };
    let user = common::unique_user();
    let account = common::account(&db, user, dec!(0)).await;
    let repo = RecurringRepository::new(db.clone());

    let rule = repo
        .create(rent(user, account, Frequency::Daily), Utc::now())
        .await
        .unwrap();
    let id = RecurringTransactionId::new(rule.id);

    let toggled = repo.toggle(id, user).await.unwrap();
    assert!(!toggled.is_active);
    let toggled = repo.toggle(id, user).await.unwrap();
    assert!(toggled.is_active);

    let err = repo.get(id, common::unique_user()).await.unwrap_err();
    assert_eq!(err.http_status_code(), 403);

    assert_eq!(repo.list(user).await.unwrap().len(), 1);
    repo.delete(id, user).await.unwrap();
    let err = repo.get(id, user).await.unwrap_err();
    assert_eq!(err.http_status_code(), 404);
}

#[tokio::test]
async fn test_transfer_rule_requires_existing_destination() {
    let Some(db) = common::connect().await else {
        return;
    };
    let user = common::unique_user();
    let account = common::account(&db, user, dec!(0)).await;
    let repo = RecurringRepository::new(db.clone());

    let err = repo
        .create(
            NewRecurringRule {
                transaction_type: TransactionType::Transfer,
                destination_account_id: Some(AccountId::new(i64::MAX)),
                ..rent(user, account, Frequency::Monthly)
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "DESTINATION_ACCOUNT_NOT_FOUND");
    assert_eq!(err.http_status_code(), 404);
}

#[tokio::test]
async fn test_scoped_sweep_leaves_other_users_rules_alone() {
    let Some(db) = common::connect().await else {
        return;
    };
    let alice = common::unique_user();
    let bob = common::unique_user();
    let alice_account = common::account(&db, alice, dec!(100)).await;
    let bob_account = common::account(&db, bob, dec!(100)).await;
    let repo = RecurringRepository::new(db.clone());

    let next = Utc::now() + Duration::days(365);
    let alice_rule = repo
        .create(
            NewRecurringRule {
                next_date: Some(next),
                ..rent(alice, alice_account, Frequency::Yearly)
            },
            Utc::now(),
        )
        .await
        .unwrap();
    let bob_rule = repo
        .create(
            NewRecurringRule {
                next_date: Some(next),
                ..rent(bob, bob_account, Frequency::Yearly)
            },
            Utc::now(),
        )
        .await
        .unwrap();

    let processed = repo
        .process_due(next + Duration::days(1), Some(bob))
        .await
        .unwrap();
    assert_eq!(processed, 1);

    let alice_rule = repo
        .get(RecurringTransactionId::new(alice_rule.id), alice)
        .await
        .unwrap();
    assert_eq!(alice_rule.next_date.to_utc(), next);
    let accounts = AccountRepository::new(db.clone());
    assert_eq!(
        accounts.get_account(alice_account, alice).await.unwrap().balance,
        dec!(100)
    );
    assert_eq!(
        accounts.get_account(bob_account, bob).await.unwrap().balance,
        dec!(75)
    );
    let bob_rule = repo
        .get(RecurringTransactionId::new(bob_rule.id), bob)
        .await
        .unwrap();
    assert!(bob_rule.next_date.to_utc() > next);
}

#[tokio::test]
async fn test_rule_category_must_exist_and_be_owned() {
    let Some(db) = common::connect().await else {
        return;
    };
    let user = common::unique_user();
    let other = common::unique_user();
    let account = common::account(&db, user, dec!(0)).await;
    let repo = RecurringRepository::new(db.clone());
    let foreign = AnalyticsRepository::new(db.clone())
        .create_category(other, "Housing")
        .await
        .unwrap();

    let err = repo
        .create(
            NewRecurringRule {
                category_id: Some(CategoryId::new(i64::MAX)),
                ..rent(user, account, Frequency::Monthly)
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "CATEGORY_NOT_FOUND");
    assert_eq!(err.http_status_code(), 404);

    let err = repo
        .create(
            NewRecurringRule {
                category_id: Some(CategoryId::new(foreign.id)),
                ..rent(user, account, Frequency::Monthly)
            },
            Utc::now(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.http_status_code(), 403);
    assert!(repo.list(user).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_update_changes_only_given_fields() {
    let Some(db) = common::connect().await else {
        return;
    };
    let user = common::unique_user();
    let account = common::account(&db, user, dec!(0)).await;
    let repo = RecurringRepository::new(db.clone());
    let housing = AnalyticsRepository::new(db.clone())
        .create_category(user, "Housing")
        .await
        .unwrap();

    let rule = repo
        .create(
            NewRecurringRule {
                next_date: Some(at(2025, 1, 1)),
                ..rent(user, account, Frequency::Monthly)
            },
            Utc::now(),
        )
        .await
        .unwrap();
    let id = RecurringTransactionId::new(rule.id);

    let updated = repo
        .update(
            id,
            user,
            RecurringUpdate {
                amount: Some(dec!(30)),
                category_id: Some(CategoryId::new(housing.id)),
                frequency: Some(Frequency::Weekly),
                ..RecurringUpdate::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.amount, dec!(30));
    assert_eq!(updated.category_id, Some(housing.id));
    assert_eq!(updated.description.as_deref(), Some("Rent"));
    assert_eq!(updated.next_date.to_utc(), at(2025, 1, 1));

    let err = repo
        .update(id, common::unique_user(), RecurringUpdate::default())
        .await
        .unwrap_err();
    assert_eq!(err.http_status_code(), 403);

    let err = repo
        .update(
            id,
            user,
            RecurringUpdate {
                category_id: Some(CategoryId::new(i64::MAX)),
                ..RecurringUpdate::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.http_status_code(), 404);

    let err = repo
        .update(
            RecurringTransactionId::new(i64::MAX),
            user,
            RecurringUpdate::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "RECURRING_NOT_FOUND");
}

//! Property-based tests for the recurring scheduler.

use bux_shared::types::{AccountId, CurrencyCode, RecurringTransactionId, UserId};
use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::schedule::RecurringScheduler;
use super::types::{Firing, Frequency, Posting, RecurringRule};
use crate::balance::TransactionType;

fn frequency() -> impl Strategy<Value = Frequency> {
    prop_oneof![
        Just(Frequency::Daily),
        Just(Frequency::Weekly),
        Just(Frequency::Monthly),
        Just(Frequency::Yearly),
    ]
}

fn start() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..3_650).prop_map(|days| Utc.with_ymd_and_hms(2015, 1, 1, 8, 0, 0).unwrap() + Duration::days(days))
}

fn rule(frequency: Frequency, next: DateTime<Utc>, end: Option<DateTime<Utc>>) -> RecurringRule {
    RecurringRule {
        id: RecurringTransactionId::new(1),
        user_id: UserId::new(1),
        account_id: AccountId::new(1),
        destination_account_id: None,
        category_id: None,
        transaction_type: TransactionType::Income,
        amount: Decimal::ONE,
        currency: CurrencyCode::parse("USD").unwrap(),
        description: None,
        frequency,
        next_date: next,
        end_date: end,
        is_active: true,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Sweeping repeatedly posts at strictly increasing scheduled dates, never
    /// after the end date, and stops once the rule deactivates.
    #[test]
    fn prop_sweep_respects_end_date(
        freq in frequency(),
        next in start(),
        end_offset in prop::option::of(0i64..400),
        horizon in 0i64..400,
    ) {
        let end = end_offset.map(|d| next + Duration::days(d));
        let before = next + Duration::days(horizon);
        let mut r = rule(freq, next, end);
        let mut last_post: Option<DateTime<Utc>> = None;

        for _ in 0..500 {
            if !RecurringScheduler::is_due(&r, before) {
                break;
            }
            match RecurringScheduler::plan_scheduled(&r).unwrap() {
                Firing::Post(Posting { posted_at, next_date, still_active }) => {
                    prop_assert_eq!(posted_at, r.next_date);
                    prop_assert!(posted_at <= before);
                    if let Some(end) = end {
                        prop_assert!(posted_at <= end);
                    }
                    if let Some(prev) = last_post {
                        prop_assert!(posted_at > prev);
                    }
                    prop_assert!(next_date > posted_at);
                    last_post = Some(posted_at);
                    r.next_date = next_date;
                    r.is_active = still_active;
                }
                Firing::Expire => {
                    r.is_active = false;
                }
            }
        }

        prop_assert!(!RecurringScheduler::is_due(&r, before));
    }

    /// Manual execution always posts at `now` and moves the cursor past both
    /// `now` and the previous cursor.
    #[test]
    fn prop_manual_moves_cursor_forward(
        freq in frequency(),
        next in start(),
        now in start(),
    ) {
        let r = rule(freq, next, None);
        let posting = RecurringScheduler::plan_manual(&r, now).unwrap();
        prop_assert_eq!(posting.posted_at, now);
        prop_assert!(posting.next_date > now);
        prop_assert!(posting.next_date > next);
        prop_assert!(posting.still_active);
    }
}

//! Shared setup for repository integration tests.
//!
//! Tests run against the Postgres named by `DATABASE_URL` and return early when
//! it is unset. Every test works under a fresh user id so runs never collide.

#![allow(dead_code)]

use std::env;
use std::sync::atomic::{AtomicI64, Ordering};

use bux_db::migration::{Migrator, MigratorTrait};
use bux_db::repositories::{AccountRepository, CreateAccountInput};
use bux_shared::types::{AccountId, CurrencyCode, UserId};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{Database, DatabaseConnection};
use tokio::sync::Mutex;

static MIGRATED: Mutex<bool> = Mutex::const_new(false);
static SEQ: AtomicI64 = AtomicI64::new(0);

/// Connects and applies pending migrations once per test binary.
pub async fn connect() -> Option<DatabaseConnection> {
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    let db = Database::connect(&url).await.expect("connect to test database");

    let mut migrated = MIGRATED.lock().await;
    if !*migrated {
        Migrator::up(&db, None).await.expect("apply migrations");
        *migrated = true;
    }
    Some(db)
}

/// A user id not used by any earlier run.
pub fn unique_user() -> UserId {
    let micros = Utc::now().timestamp_micros();
    UserId::new(micros * 1000 + SEQ.fetch_add(1, Ordering::Relaxed) % 1000)
}

/// A ticker symbol not used by any earlier run; fits the 20 character column.
pub fn unique_symbol(prefix: &str) -> String {
    format!("{prefix}{:X}", unique_user().into_inner())
}

pub fn usd() -> CurrencyCode {
    CurrencyCode::parse("USD").unwrap()
}

pub async fn account(db: &DatabaseConnection, user_id: UserId, opening: Decimal) -> AccountId {
    let account = AccountRepository::new(db.clone())
        .create_account(CreateAccountInput {
            user_id,
            name: "Checking".to_string(),
            currency: usd(),
            opening_balance: opening,
        })
        .await
        .unwrap();
    AccountId::new(account.id)
}

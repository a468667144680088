//! Recurring rule types.

use bux_shared::types::{AccountId, CategoryId, CurrencyCode, RecurringTransactionId, UserId};
use chrono::{DateTime, Days, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::RecurringError;
use crate::balance::{NewTransaction, TransactionStatus, TransactionType};

/// How often a rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// Every day.
    Daily,
    /// Every seven days.
    Weekly,
    /// Same day next calendar month.
    Monthly,
    /// Same day next calendar year.
    Yearly,
}

impl Frequency {
    /// Returns the wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }

    /// Moves `date` forward by one period.
    ///
    /// Month and year steps use chrono's calendar arithmetic, so Jan 31 plus one
    /// month lands on the last day of February. Returns `None` on overflow.
    #[must_use]
    pub fn advance(self, date: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Daily => date.checked_add_days(Days::new(1)),
            Self::Weekly => date.checked_add_days(Days::new(7)),
            Self::Monthly => date.checked_add_months(Months::new(1)),
            Self::Yearly => date.checked_add_months(Months::new(12)),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Frequency {
    type Err = RecurringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(RecurringError::InvalidFrequency(other.to_string())),
        }
    }
}

/// A rule about to be created.
#[derive(Debug, Clone)]
pub struct NewRecurringRule {
    /// Owning user.
    pub user_id: UserId,
    /// Source account of every posting.
    pub account_id: AccountId,
    /// Destination account, transfer rules only.
    pub destination_account_id: Option<AccountId>,
    /// Category of every posting.
    pub category_id: Option<CategoryId>,
    /// Income, expense or transfer.
    pub transaction_type: TransactionType,
    /// Strictly positive amount.
    pub amount: Decimal,
    /// Currency label.
    pub currency: CurrencyCode,
    /// Description copied to every posting.
    pub description: Option<String>,
    /// Firing period.
    pub frequency: Frequency,
    /// First firing; defaults to the creation time.
    pub next_date: Option<DateTime<Utc>>,
    /// Last date the rule may fire on.
    pub end_date: Option<DateTime<Utc>>,
}

/// A stored recurring rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecurringRule {
    /// Rule id.
    pub id: RecurringTransactionId,
    /// Owning user.
    pub user_id: UserId,
    /// Source account of every posting.
    pub account_id: AccountId,
    /// Destination account, transfer rules only.
    pub destination_account_id: Option<AccountId>,
    /// Category of every posting.
    pub category_id: Option<CategoryId>,
    /// Income, expense or transfer.
    pub transaction_type: TransactionType,
    /// Positive amount.
    pub amount: Decimal,
    /// Currency label.
    pub currency: CurrencyCode,
    /// Description copied to every posting.
    pub description: Option<String>,
    /// Firing period.
    pub frequency: Frequency,
    /// Recurrence cursor.
    pub next_date: DateTime<Utc>,
    /// Last date the rule may fire on.
    pub end_date: Option<DateTime<Utc>>,
    /// Whether the rule still fires.
    pub is_active: bool,
}

impl RecurringRule {
    /// Builds the completed transaction this rule posts at `posted_at`.
    #[must_use]
    pub fn posting(&self, posted_at: DateTime<Utc>) -> NewTransaction {
        NewTransaction {
            user_id: self.user_id,
            account_id: self.account_id,
            destination_account_id: self.destination_account_id,
            category_id: self.category_id,
            transaction_type: self.transaction_type,
            amount: self.amount,
            currency: self.currency.clone(),
            description: self.description.clone(),
            transaction_date: posted_at,
            status: TransactionStatus::Completed,
        }
    }
}

/// Changes to an existing rule. `None` leaves a field as it is.
#[derive(Debug, Clone, Default)]
pub struct RecurringUpdate {
    /// New amount of each posting.
    pub amount: Option<Decimal>,
    /// New description.
    pub description: Option<String>,
    /// New category.
    pub category_id: Option<CategoryId>,
    /// New period.
    pub frequency: Option<Frequency>,
    /// Moved cursor.
    pub next_date: Option<DateTime<Utc>>,
    /// New end date.
    pub end_date: Option<DateTime<Utc>>,
}

/// One posting of a rule and where its cursor moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    /// Date of the posted transaction.
    pub posted_at: DateTime<Utc>,
    /// New cursor.
    pub next_date: DateTime<Utc>,
    /// False when the new cursor passed `end_date`.
    pub still_active: bool,
}

/// What a sweep does with a due rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Firing {
    /// Post one transaction and move the cursor.
    Post(Posting),
    /// The rule is already past its end date; deactivate without posting.
    Expire,
}

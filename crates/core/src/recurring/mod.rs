//! Recurring transaction scheduling.
//!
//! A recurring rule is a transaction template plus a schedule cursor
//! (`next_date`). Rules are `active` until advancing the cursor passes their
//! `end_date`; only an explicit toggle makes them active again.
//!
//! Manual execution posts at the moment of the request, while the batch sweep
//! posts at the scheduled `next_date`. Both advance the cursor by one period.

pub mod error;
pub mod schedule;
pub mod types;

#[cfg(test)]
mod schedule_props;

pub use error::RecurringError;
pub use schedule::RecurringScheduler;
pub use types::{Firing, Frequency, NewRecurringRule, Posting, RecurringRule, RecurringUpdate};

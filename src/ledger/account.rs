use chrono::DateTime;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;

use crate::LedgerError;

/// A customer account record.
///
/// The region is the single source of truth for account state; callers
/// read a copy, mutate it, and write it back — either through a region
/// transaction or accepting last-writer-wins on the plain put path. The
/// entity itself owns no concurrency control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identity, immutable after creation
    pub account_id: String,
    pub customer_id: String,
    pub account_number: String,
    pub account_type: AccountType,
    /// Exact decimal balance, never floating point
    pub balance: Decimal,
    pub credit_limit: Decimal,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    Checking,
    Savings,
    Credit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Frozen,
    Closed,
}

impl Account {
    /// Adds `amount` to the balance unconditionally and touches
    /// `updated_at`. Amount positivity is the caller's contract (the
    /// service layer validates it).
    pub fn credit(
        &mut self,
        amount: Decimal,
    ) {
        self.balance += amount;
        self.updated_at = Utc::now();
    }

    /// Subtracts `amount` from the balance, or fails with
    /// [`LedgerError::InsufficientBalance`] leaving the account untouched.
    pub fn debit(
        &mut self,
        amount: Decimal,
    ) -> Result<(), LedgerError> {
        if self.balance < amount {
            return Err(LedgerError::InsufficientBalance {
                available: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        self.updated_at = Utc::now();
        Ok(())
    }
}

use rust_decimal::Decimal;

use crate::Account;
use crate::ChangeNotification;

/// Subscription predicate over account change notifications.
///
/// Value-based variants match on the notification's resulting value, so
/// destroy/invalidate notifications (no new value) only match [`All`].
///
/// [`All`]: QueryFilter::All
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryFilter {
    /// Every change on the account data set
    All,
    /// Changes to accounts owned by one customer
    Customer(String),
    /// Changes leaving the balance strictly below the limit
    BalanceBelow(Decimal),
    /// Changes leaving the balance at or above the limit
    BalanceAtLeast(Decimal),
}

impl QueryFilter {
    pub fn matches(
        &self,
        notification: &ChangeNotification<Account>,
    ) -> bool {
        match self {
            QueryFilter::All => true,
            QueryFilter::Customer(customer_id) => notification
                .new_value
                .as_ref()
                .map(|account| &account.customer_id == customer_id)
                .unwrap_or(false),
            QueryFilter::BalanceBelow(limit) => notification
                .new_value
                .as_ref()
                .map(|account| account.balance < *limit)
                .unwrap_or(false),
            QueryFilter::BalanceAtLeast(limit) => notification
                .new_value
                .as_ref()
                .map(|account| account.balance >= *limit)
                .unwrap_or(false),
        }
    }
}

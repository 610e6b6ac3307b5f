use chrono::DateTime;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde::Serialize;

use crate::ChangeKind;

/// Business classification attached to a balance change that crossed a
/// threshold. Low balance takes precedence when both conditions hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertType {
    LowBalance,
    LargeTransaction,
}

/// One balance change observed by a continuous query.
///
/// Created exactly once per qualifying notification and never mutated
/// afterwards; retained only inside the event store's bounded buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceChangeEvent {
    /// Unique per emission
    pub event_id: String,
    pub account_id: String,
    /// Unavailable when neither the new nor the old value carried it
    /// (e.g. a destroy notification without a prior value)
    pub customer_id: Option<String>,
    pub kind: ChangeKind,
    pub old_balance: Decimal,
    pub new_balance: Decimal,
    /// Signed: `new_balance - old_balance`
    pub change_amount: Decimal,
    pub timestamp: DateTime<Utc>,
    pub alert: Option<AlertType>,
}

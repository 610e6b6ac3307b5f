use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::Utc;
use nanoid::nanoid;
use rust_decimal::Decimal;
use tracing::debug;
use tracing::warn;

use super::AlertType;
use super::BalanceChangeEvent;
use super::EventStore;
use crate::Account;
use crate::AlertConfig;
use crate::ChangeNotification;
use crate::QueryError;
use crate::Result;

/// Live, shared alert thresholds. Every listener holds the same handle,
/// so a runtime update is visible to all active subscriptions for
/// subsequently processed notifications.
pub type SharedThresholds = Arc<ArcSwap<AlertConfig>>;

/// Classifies one raw change notification into a [`BalanceChangeEvent`].
///
/// One fresh listener per subscription; all listeners share the process-
/// wide event store and the live threshold handle.
pub struct BalanceChangeListener {
    event_store: Arc<EventStore>,
    thresholds: SharedThresholds,
}

impl BalanceChangeListener {
    pub fn new(
        event_store: Arc<EventStore>,
        thresholds: SharedThresholds,
    ) -> Self {
        Self {
            event_store,
            thresholds,
        }
    }

    /// Derive, classify, store, and return the event for one notification.
    ///
    /// The old balance prefers the notification's prior value, falls back
    /// to the last-known-balance cache, and defaults to zero — so the
    /// first observation of a pre-existing account reports its full
    /// balance as the change amount.
    ///
    /// Errors are the dispatcher's to log; one bad notification never
    /// affects the ones after it.
    pub fn process(
        &self,
        notification: &ChangeNotification<Account>,
    ) -> Result<BalanceChangeEvent> {
        if notification.key.is_empty() {
            return Err(QueryError::MalformedNotification(
                "notification without a key".to_string(),
            )
            .into());
        }

        debug!(
            kind = ?notification.kind,
            account_id = %notification.key,
            "Processing change notification"
        );

        // Zero when the entry no longer exists (destroy/invalidate).
        let new_balance = notification
            .new_value
            .as_ref()
            .map(|account| account.balance)
            .unwrap_or(Decimal::ZERO);

        let old_balance = notification
            .old_value
            .as_ref()
            .map(|account| account.balance)
            .or_else(|| self.event_store.last_known_balance(&notification.key))
            .unwrap_or(Decimal::ZERO);

        let change_amount = new_balance - old_balance;

        let thresholds = **self.thresholds.load();
        let alert = classify(new_balance, change_amount, &thresholds);

        let customer_id = notification
            .new_value
            .as_ref()
            .or(notification.old_value.as_ref())
            .map(|account| account.customer_id.clone());

        let event = BalanceChangeEvent {
            event_id: nanoid!(),
            account_id: notification.key.clone(),
            customer_id,
            kind: notification.kind,
            old_balance,
            new_balance,
            change_amount,
            timestamp: Utc::now(),
            alert,
        };

        self.event_store.add_event(event.clone());
        self.event_store
            .update_last_known_balance(&notification.key, new_balance);

        if let Some(alert) = alert {
            warn!(
                ?alert,
                account_id = %event.account_id,
                balance = %new_balance,
                change = %change_amount,
                "Balance alert"
            );
        }

        Ok(event)
    }
}

/// Low balance takes precedence over large transaction.
fn classify(
    new_balance: Decimal,
    change_amount: Decimal,
    thresholds: &AlertConfig,
) -> Option<AlertType> {
    if new_balance < thresholds.low_balance_threshold {
        return Some(AlertType::LowBalance);
    }
    if change_amount.abs() > thresholds.large_transaction_threshold {
        return Some(AlertType::LargeTransaction);
    }
    None
}

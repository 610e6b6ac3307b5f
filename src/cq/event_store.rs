use std::collections::VecDeque;

use dashmap::DashMap;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use tracing::info;

use super::BalanceChangeEvent;

/// Bounded, newest-first buffer of balance-change events plus the
/// last-known-balance cache used for delta computation.
///
/// Safe for concurrent insertion from the dispatcher thread and
/// concurrent reads from API threads; the insert path completes in
/// bounded time regardless of reader activity. Content is volatile and
/// does not survive a restart — a production deployment would back this
/// with durable messaging.
pub struct EventStore {
    events: RwLock<VecDeque<BalanceChangeEvent>>,
    last_known_balances: DashMap<String, Decimal>,
    capacity: usize,
}

impl EventStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::with_capacity(capacity.min(1024))),
            last_known_balances: DashMap::new(),
            capacity,
        }
    }

    /// Insert at the front, evicting from the tail while over capacity.
    /// The most recently inserted `capacity` events are always retained.
    pub fn add_event(
        &self,
        event: BalanceChangeEvent,
    ) {
        info!(
            kind = ?event.kind,
            account_id = %event.account_id,
            new_balance = %event.new_balance,
            "Event stored"
        );
        let mut events = self.events.write();
        events.push_front(event);
        while events.len() > self.capacity {
            events.pop_back();
        }
    }

    /// Up to `limit` most recent events, newest first. Snapshot-style
    /// read: concurrent insertions may or may not be visible.
    pub fn recent_events(
        &self,
        limit: usize,
    ) -> Vec<BalanceChangeEvent> {
        let events = self.events.read();
        events.iter().take(limit).cloned().collect()
    }

    /// All buffered events for one account, newest first.
    pub fn events_for_account(
        &self,
        account_id: &str,
    ) -> Vec<BalanceChangeEvent> {
        let events = self.events.read();
        events
            .iter()
            .filter(|event| event.account_id == account_id)
            .cloned()
            .collect()
    }

    /// All buffered events carrying an alert, newest first.
    pub fn alerts(&self) -> Vec<BalanceChangeEvent> {
        let events = self.events.read();
        events
            .iter()
            .filter(|event| event.alert.is_some())
            .cloned()
            .collect()
    }

    /// Empty both the event buffer and the balance cache. Test/reset
    /// scenarios only.
    pub fn clear(&self) {
        self.events.write().clear();
        self.last_known_balances.clear();
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }

    /// Most recently observed balance for `account_id`, if any.
    pub fn last_known_balance(
        &self,
        account_id: &str,
    ) -> Option<Decimal> {
        self.last_known_balances.get(account_id).map(|entry| *entry)
    }

    /// Record the latest observed balance. Last write wins.
    pub fn update_last_known_balance(
        &self,
        account_id: &str,
        balance: Decimal,
    ) {
        self.last_known_balances.insert(account_id.to_string(), balance);
    }
}

use std::collections::BTreeMap;
use std::collections::HashMap;

use tracing::debug;
use tracing::trace;

use super::memory::Slot;
use super::ChangeKind;
use super::ChangeNotification;
use super::MemoryRegion;
use crate::RegionError;
use crate::Result;

/// Transaction lifecycle. `Committed` and `RolledBack` are terminal;
/// the consuming `commit`/`rollback` signatures make reuse impossible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxPhase {
    Active,
    Committed,
    RolledBack,
}

/// An optimistic transaction over a [`MemoryRegion`].
///
/// Reads are repeatable (the version observed at first touch is
/// revalidated at commit) and writes are buffered with read-your-writes
/// visibility. `commit` validates every touched key under the region
/// write lock, applies all writes atomically, then publishes one change
/// notification per write. A version mismatch fails the whole commit with
/// [`RegionError::CommitConflict`] and applies nothing.
///
/// Dropping an uncommitted transaction rolls it back (the buffer is
/// simply discarded), so early error returns inside a transaction scope
/// never leave it open.
pub struct RegionTransaction<'a, V> {
    region: &'a MemoryRegion<V>,
    /// Version observed at first touch, keyed by key. Absent key = 0.
    reads: HashMap<String, u64>,
    /// Buffered writes: `Some` = put, `None` = remove. BTreeMap keeps the
    /// apply/notify order deterministic.
    writes: BTreeMap<String, Option<V>>,
    phase: TxPhase,
}

impl<'a, V: Clone> RegionTransaction<'a, V> {
    pub(super) fn new(region: &'a MemoryRegion<V>) -> Self {
        Self {
            region,
            reads: HashMap::new(),
            writes: BTreeMap::new(),
            phase: TxPhase::Active,
        }
    }

    pub fn phase(&self) -> TxPhase {
        self.phase
    }

    /// Read `key` with read-your-writes visibility.
    pub fn get(
        &mut self,
        key: &str,
    ) -> Option<V> {
        if let Some(buffered) = self.writes.get(key) {
            return buffered.clone();
        }
        let (value, version) = {
            let entries = self.region.entries.read();
            match entries.get(key) {
                Some(slot) => (slot.value.clone(), slot.version),
                None => (None, 0),
            }
        };
        self.reads.entry(key.to_string()).or_insert(version);
        value
    }

    /// Buffer a put for `key`.
    pub fn put(
        &mut self,
        key: impl Into<String>,
        value: V,
    ) {
        let key = key.into();
        self.touch(&key);
        self.writes.insert(key, Some(value));
    }

    /// Buffer a remove for `key`.
    pub fn remove(
        &mut self,
        key: &str,
    ) {
        self.touch(key);
        self.writes.insert(key.to_string(), None);
    }

    /// Record the committed version of `key` at first touch.
    fn touch(
        &mut self,
        key: &str,
    ) {
        if !self.reads.contains_key(key) {
            let version = self.region.version_of(key);
            self.reads.insert(key.to_string(), version);
        }
    }

    /// Validate and atomically apply the buffered writes.
    ///
    /// On conflict the transaction is terminal (`RolledBack`), the region
    /// is untouched, and the conflicting key is reported. Notifications
    /// are published only after the write lock is released.
    pub fn commit(mut self) -> Result<()> {
        let notifications = {
            let mut entries = self.region.entries.write();

            for (key, observed) in &self.reads {
                let current = entries.get(key).map(|slot| slot.version).unwrap_or(0);
                if current != *observed {
                    self.phase = TxPhase::RolledBack;
                    debug!(
                        key,
                        observed, current, "Commit conflict, rolling back transaction"
                    );
                    return Err(RegionError::CommitConflict { key: key.clone() }.into());
                }
            }

            let mut notifications = Vec::with_capacity(self.writes.len());
            for (key, write) in std::mem::take(&mut self.writes) {
                match write {
                    Some(value) => {
                        let slot = entries.entry(key.clone()).or_insert(Slot {
                            value: None,
                            version: 0,
                        });
                        let old_value = slot.value.replace(value.clone());
                        slot.version += 1;
                        notifications.push(ChangeNotification {
                            kind: if old_value.is_some() {
                                ChangeKind::Updated
                            } else {
                                ChangeKind::Created
                            },
                            key,
                            new_value: Some(value),
                            old_value,
                        });
                    }
                    None => {
                        if let Some(slot) = entries.get_mut(&key) {
                            if let Some(old_value) = slot.value.take() {
                                slot.version += 1;
                                notifications.push(ChangeNotification {
                                    kind: ChangeKind::Destroyed,
                                    key,
                                    new_value: None,
                                    old_value: Some(old_value),
                                });
                            }
                        }
                    }
                }
            }
            self.phase = TxPhase::Committed;
            notifications
        };

        for notification in notifications {
            self.region.feed.publish(notification);
        }
        Ok(())
    }

    /// Discard the buffered writes. Equivalent to dropping the
    /// transaction; provided for explicit error paths.
    pub fn rollback(mut self) {
        self.phase = TxPhase::RolledBack;
        trace!("Transaction rolled back");
    }
}

impl<V> Drop for RegionTransaction<'_, V> {
    fn drop(&mut self) {
        if self.phase == TxPhase::Active {
            trace!("Transaction dropped while active, rolling back");
        }
    }
}

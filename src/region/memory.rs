use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use super::ChangeFeedSender;
use super::ChangeKind;
use super::ChangeNotification;
use super::RegionTransaction;

/// A versioned slot. Removal leaves a tombstone (`value: None`) so the
/// version counter survives delete/re-create cycles and transactions
/// cannot miss a conflict through key reuse.
#[derive(Debug, Clone)]
pub(super) struct Slot<V> {
    pub(super) value: Option<V>,
    pub(super) version: u64,
}

/// In-memory key-value region.
///
/// All methods are safe to call concurrently from multiple threads; the
/// interior `RwLock` is the only synchronization. Non-transactional
/// mutation is last-writer-wins; multi-key atomicity requires [`begin`].
///
/// [`begin`]: MemoryRegion::begin
#[derive(Debug)]
pub struct MemoryRegion<V> {
    pub(super) entries: RwLock<HashMap<String, Slot<V>>>,
    pub(super) feed: ChangeFeedSender<V>,
}

impl<V: Clone> MemoryRegion<V> {
    pub fn new(feed: ChangeFeedSender<V>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            feed,
        }
    }

    /// Read the committed value for `key`.
    pub fn get(
        &self,
        key: &str,
    ) -> Option<V> {
        let entries = self.entries.read();
        entries.get(key).and_then(|slot| slot.value.clone())
    }

    /// Insert or replace the value for `key`, bumping its version and
    /// publishing a Create/Update notification.
    pub fn put(
        &self,
        key: impl Into<String>,
        value: V,
    ) {
        let key = key.into();
        let notification = {
            let mut entries = self.entries.write();
            let slot = entries.entry(key.clone()).or_insert(Slot {
                value: None,
                version: 0,
            });
            let old_value = slot.value.replace(value.clone());
            slot.version += 1;
            ChangeNotification {
                kind: if old_value.is_some() {
                    ChangeKind::Updated
                } else {
                    ChangeKind::Created
                },
                key,
                new_value: Some(value),
                old_value,
            }
        };
        self.feed.publish(notification);
    }

    /// Remove the value for `key`, returning it when present. Publishes a
    /// Destroy notification; removing an absent key is a no-op.
    pub fn remove(
        &self,
        key: &str,
    ) -> Option<V> {
        let notification = {
            let mut entries = self.entries.write();
            let slot = entries.get_mut(key)?;
            let old_value = slot.value.take()?;
            slot.version += 1;
            ChangeNotification {
                kind: ChangeKind::Destroyed,
                key: key.to_string(),
                new_value: None,
                old_value: Some(old_value),
            }
        };
        let removed = notification.old_value.clone();
        self.feed.publish(notification);
        debug!(key, "Entry removed from region");
        removed
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        let entries = self.entries.read();
        entries.get(key).map(|slot| slot.value.is_some()).unwrap_or(false)
    }

    /// Snapshot of all live keys.
    pub fn keys(&self) -> Vec<String> {
        let entries = self.entries.read();
        entries
            .iter()
            .filter(|(_, slot)| slot.value.is_some())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Snapshot of all live values.
    pub fn values(&self) -> Vec<V> {
        let entries = self.entries.read();
        entries.values().filter_map(|slot| slot.value.clone()).collect()
    }

    /// Number of live entries.
    ///
    /// NOTE: This method scans the whole map. Use with caution.
    pub fn len(&self) -> usize {
        let entries = self.entries.read();
        entries.values().filter(|slot| slot.value.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Begin an optimistic transaction over this region.
    ///
    /// The transaction buffers reads and writes locally; nothing becomes
    /// visible (and no notifications are published) until `commit`.
    pub fn begin(&self) -> RegionTransaction<'_, V> {
        RegionTransaction::new(self)
    }

    /// Committed version of `key`; 0 when the key was never written.
    pub(super) fn version_of(
        &self,
        key: &str,
    ) -> u64 {
        let entries = self.entries.read();
        entries.get(key).map(|slot| slot.version).unwrap_or(0)
    }
}

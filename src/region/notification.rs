use serde::Deserialize;
use serde::Serialize;

/// Kind of change a notification describes.
///
/// `Invalidated` and `Unknown` are never produced by the in-memory region
/// itself; they exist so externally sourced notifications classify the
/// same way the full store's operation set does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Created,
    Updated,
    Destroyed,
    Invalidated,
    Unknown,
}

/// A single delivered change record: operation kind, key, the resulting
/// value, and — when the region can supply it — the value before the
/// change.
#[derive(Debug, Clone)]
pub struct ChangeNotification<V> {
    pub kind: ChangeKind,
    pub key: String,
    pub new_value: Option<V>,
    pub old_value: Option<V>,
}

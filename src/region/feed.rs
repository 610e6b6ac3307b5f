use crossbeam_channel::bounded;
use crossbeam_channel::Receiver;
use crossbeam_channel::Sender;
use crossbeam_channel::TrySendError;
use tracing::trace;

use super::ChangeNotification;

/// Receiving half of the change feed, consumed by the dispatcher.
/// Cloneable so the dispatcher can be restarted after a shutdown.
pub type ChangeFeedReceiver<V> = Receiver<ChangeNotification<V>>;

/// Sending half of the change feed, owned by the region write path.
///
/// Publishing never blocks: a full or closed feed drops the notification.
/// This trade-off keeps the write path bounded-time regardless of
/// dispatcher or subscriber activity.
pub struct ChangeFeedSender<V> {
    tx: Sender<ChangeNotification<V>>,
}

impl<V> Clone for ChangeFeedSender<V> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<V> std::fmt::Debug for ChangeFeedSender<V> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ChangeFeedSender").finish_non_exhaustive()
    }
}

impl<V> ChangeFeedSender<V> {
    /// Non-blocking send (drop if full or disconnected).
    pub fn publish(
        &self,
        notification: ChangeNotification<V>,
    ) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(n)) => {
                trace!(key = %n.key, "Change feed full, notification dropped");
            }
            Err(TrySendError::Disconnected(n)) => {
                trace!(key = %n.key, "Change feed closed, notification dropped");
            }
        }
    }
}

/// Create a bounded change feed pair.
pub fn change_feed<V>(capacity: usize) -> (ChangeFeedSender<V>, ChangeFeedReceiver<V>) {
    let (tx, rx) = bounded(capacity);
    (ChangeFeedSender { tx }, rx)
}

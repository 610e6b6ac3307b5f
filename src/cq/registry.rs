use std::sync::Arc;
use std::thread::JoinHandle;

use arc_swap::ArcSwap;
use crossbeam_channel::bounded;
use crossbeam_channel::Sender;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::trace;
use tracing::warn;

use super::BalanceChangeEvent;
use super::BalanceChangeListener;
use super::EventStore;
use super::QueryFilter;
use super::SharedThresholds;
use crate::constants::DEFAULT_QUERY_NAME;
use crate::Account;
use crate::AlertConfig;
use crate::ChangeFeedReceiver;
use crate::ChangeNotification;
use crate::QueryError;
use crate::Result;

/// Handle for a custom subscription's classified-event stream.
///
/// Events matching the subscription's filter are delivered on a bounded
/// channel; when the buffer is full, events for this subscriber are
/// dropped (the shared event store still records them). The stream ends
/// when the subscription is stopped.
#[derive(Debug)]
pub struct SubscriptionHandle {
    name: String,
    receiver: mpsc::Receiver<BalanceChangeEvent>,
}

impl SubscriptionHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn receiver_mut(&mut self) -> &mut mpsc::Receiver<BalanceChangeEvent> {
        &mut self.receiver
    }

    /// Consume the handle and return the event receiver.
    pub fn into_receiver(self) -> mpsc::Receiver<BalanceChangeEvent> {
        self.receiver
    }
}

/// One registered continuous query. Present in the registry map means
/// REGISTERED; removal (stop) is terminal.
struct Subscription {
    filter: QueryFilter,
    listener: BalanceChangeListener,
    /// Outbound stream for custom subscriptions; the default
    /// subscription feeds the event store only.
    sink: Option<mpsc::Sender<BalanceChangeEvent>>,
}

struct RegistryInner {
    /// Subscriptions by name (lock-free concurrent map)
    subscriptions: DashMap<String, Subscription>,

    event_store: Arc<EventStore>,

    /// Live thresholds shared with every listener
    thresholds: SharedThresholds,

    subscriber_buffer: usize,

    /// Dispatcher thread handle (None when not running)
    dispatcher: Mutex<Option<JoinHandle<()>>>,

    /// Shutdown signal sender (None when not running)
    shutdown_tx: Mutex<Option<Sender<()>>>,
}

/// Manages named continuous-query subscriptions over the region's change
/// feed.
///
/// # Thread Safety
///
/// All methods are safe to call concurrently. Dispatch runs on a single
/// dedicated background thread; registration and stop take effect for
/// notifications dispatched after the map update.
pub struct ContinuousQueryRegistry {
    inner: Arc<RegistryInner>,

    /// Receiver for the region change feed. Cloned into the dispatcher
    /// thread so the registry can be restarted after a shutdown.
    feed_rx: ChangeFeedReceiver<Account>,
}

impl ContinuousQueryRegistry {
    pub fn new(
        event_store: Arc<EventStore>,
        initial_thresholds: AlertConfig,
        feed_rx: ChangeFeedReceiver<Account>,
        subscriber_buffer: usize,
    ) -> Self {
        let inner = Arc::new(RegistryInner {
            subscriptions: DashMap::new(),
            event_store,
            thresholds: Arc::new(ArcSwap::from_pointee(initial_thresholds)),
            subscriber_buffer,
            dispatcher: Mutex::new(None),
            shutdown_tx: Mutex::new(None),
        });

        Self { inner, feed_rx }
    }

    /// Start the background dispatcher thread.
    ///
    /// Calling `start()` while a dispatcher is already running is a no-op.
    pub fn start(&self) {
        let mut handle_guard = self.inner.dispatcher.lock();

        // Already running
        if handle_guard.is_some() {
            return;
        }

        let (shutdown_tx, shutdown_rx) = bounded(1);
        let inner = self.inner.clone();
        let feed_rx = self.feed_rx.clone();

        let handle = std::thread::spawn(move || {
            debug!("CQ dispatcher thread started");

            loop {
                crossbeam_channel::select! {
                    recv(feed_rx) -> result => {
                        match result {
                            Ok(notification) => {
                                Self::dispatch(&inner, &notification);
                            }
                            Err(_) => {
                                // Feed closed, exit thread
                                warn!("Change feed closed unexpectedly");
                                break;
                            }
                        }
                    }
                    recv(shutdown_rx) -> _ => {
                        debug!("CQ dispatcher received shutdown signal");
                        break;
                    }
                }
            }

            debug!("CQ dispatcher thread stopped");
        });

        *handle_guard = Some(handle);
        *self.inner.shutdown_tx.lock() = Some(shutdown_tx);
    }

    /// Stop the dispatcher thread and every subscription.
    ///
    /// Safe to call more than once; used at process shutdown.
    pub fn shutdown(&self) {
        if let Some(tx) = self.inner.shutdown_tx.lock().take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.inner.dispatcher.lock().take() {
            let _ = handle.join();
        }
        self.stop_all();
    }

    /// Register the fixed all-accounts subscription under
    /// [`DEFAULT_QUERY_NAME`]. Registering it twice is an idempotent
    /// no-op.
    pub fn register_default(&self) {
        match self.inner.subscriptions.entry(DEFAULT_QUERY_NAME.to_string()) {
            Entry::Occupied(_) => {
                info!(name = DEFAULT_QUERY_NAME, "CQ already registered");
            }
            Entry::Vacant(entry) => {
                entry.insert(Subscription {
                    filter: QueryFilter::All,
                    listener: self.new_listener(),
                    sink: None,
                });
                info!(name = DEFAULT_QUERY_NAME, "CQ registered");
            }
        }
    }

    /// Register a custom subscription under a caller-chosen unique name.
    ///
    /// # Errors
    ///
    /// [`QueryError::AlreadyExists`] when the name is taken; the existing
    /// subscription is left untouched.
    pub fn register_custom(
        &self,
        name: &str,
        filter: QueryFilter,
    ) -> Result<SubscriptionHandle> {
        match self.inner.subscriptions.entry(name.to_string()) {
            Entry::Occupied(_) => Err(QueryError::AlreadyExists(name.to_string()).into()),
            Entry::Vacant(entry) => {
                let (sink, receiver) = mpsc::channel(self.inner.subscriber_buffer);
                entry.insert(Subscription {
                    filter: filter.clone(),
                    listener: self.new_listener(),
                    sink: Some(sink),
                });
                info!(name, ?filter, "Custom CQ registered");
                Ok(SubscriptionHandle {
                    name: name.to_string(),
                    receiver,
                })
            }
        }
    }

    /// Stop one subscription, releasing its stream. Stopping an unknown
    /// name is a silent no-op.
    pub fn stop(
        &self,
        name: &str,
    ) {
        if self.inner.subscriptions.remove(name).is_some() {
            info!(name, "CQ stopped");
        } else {
            trace!(name, "Stop for unknown CQ ignored");
        }
    }

    /// Stop every active subscription.
    pub fn stop_all(&self) {
        let names: Vec<String> = self
            .inner
            .subscriptions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        for name in names {
            self.stop(&name);
        }
    }

    /// Names of the currently registered subscriptions.
    pub fn active_queries(&self) -> Vec<String> {
        self.inner
            .subscriptions
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Swap the shared alert thresholds. Takes effect for subsequently
    /// processed notifications across all active subscriptions; buffered
    /// events are not reclassified.
    pub fn update_thresholds(
        &self,
        low_balance: Decimal,
        large_transaction: Decimal,
    ) {
        self.inner.thresholds.store(Arc::new(AlertConfig {
            low_balance_threshold: low_balance,
            large_transaction_threshold: large_transaction,
        }));
        info!(
            %low_balance,
            %large_transaction,
            "Alert thresholds updated"
        );
    }

    /// Current alert thresholds.
    pub fn thresholds(&self) -> AlertConfig {
        **self.inner.thresholds.load()
    }

    fn new_listener(&self) -> BalanceChangeListener {
        BalanceChangeListener::new(
            Arc::clone(&self.inner.event_store),
            Arc::clone(&self.inner.thresholds),
        )
    }

    /// Deliver one notification to every matching subscription.
    ///
    /// Runs on the dispatcher thread. A classification failure is logged
    /// and skipped for that subscription only; it never stops dispatch.
    fn dispatch(
        inner: &Arc<RegistryInner>,
        notification: &ChangeNotification<Account>,
    ) {
        for entry in inner.subscriptions.iter() {
            if !entry.filter.matches(notification) {
                continue;
            }
            match entry.listener.process(notification) {
                Ok(event) => {
                    if let Some(sink) = &entry.sink {
                        // Non-blocking send to the subscriber stream
                        let _ = sink.try_send(event);
                    }
                }
                Err(e) => {
                    error!(
                        name = %entry.key(),
                        key = %notification.key,
                        "Notification dropped: {e}"
                    );
                }
            }
        }

        trace!(
            key = %notification.key,
            kind = ?notification.kind,
            "Notification dispatched"
        );
    }
}

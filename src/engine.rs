//! Engine assembly: wires configuration, region, change feed, event
//! store, continuous queries, and the ledger/transfer services into one
//! ready-to-use unit.

use std::sync::Arc;

use tracing::info;

use crate::change_feed;
use crate::Account;
use crate::AccountAggregator;
use crate::ContinuousQueryRegistry;
use crate::EngineConfig;
use crate::EventStore;
use crate::LedgerService;
use crate::MemoryRegion;
use crate::Result;
use crate::TransferService;

/// The assembled ledger engine.
///
/// Construction validates the configuration and builds every subsystem;
/// [`start`] brings up the continuous-query dispatcher and registers the
/// default all-accounts subscription; [`shutdown`] tears both down. The
/// region and services are usable before `start`, but no events are
/// classified until the dispatcher runs.
///
/// [`start`]: LedgerEngine::start
/// [`shutdown`]: LedgerEngine::shutdown
pub struct LedgerEngine {
    config: EngineConfig,
    region: Arc<MemoryRegion<Account>>,
    event_store: Arc<EventStore>,
    queries: ContinuousQueryRegistry,
    ledger: LedgerService,
    transfers: TransferService,
}

impl LedgerEngine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let config = config.validate()?;

        let (feed_tx, feed_rx) = change_feed(config.feed.feed_capacity);
        let region = Arc::new(MemoryRegion::new(feed_tx));
        let event_store = Arc::new(EventStore::new(config.event_store.capacity));
        let queries = ContinuousQueryRegistry::new(
            Arc::clone(&event_store),
            config.alerts,
            feed_rx,
            config.feed.subscriber_buffer,
        );
        let ledger = LedgerService::new(Arc::clone(&region));
        let transfers = TransferService::new(Arc::clone(&region));

        Ok(Self {
            config,
            region,
            event_store,
            queries,
            ledger,
            transfers,
        })
    }

    /// Start the dispatcher and register the default subscription.
    /// Idempotent.
    pub fn start(&self) {
        self.queries.start();
        self.queries.register_default();
        info!("Ledger engine started");
    }

    /// Stop the dispatcher and every subscription. Safe to call more
    /// than once.
    pub fn shutdown(&self) {
        self.queries.shutdown();
        info!("Ledger engine stopped");
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn region(&self) -> &Arc<MemoryRegion<Account>> {
        &self.region
    }

    pub fn event_store(&self) -> &Arc<EventStore> {
        &self.event_store
    }

    pub fn queries(&self) -> &ContinuousQueryRegistry {
        &self.queries
    }

    pub fn ledger(&self) -> &LedgerService {
        &self.ledger
    }

    pub fn transfers(&self) -> &TransferService {
        &self.transfers
    }

    pub fn aggregator(&self) -> AccountAggregator {
        AccountAggregator::new(Arc::clone(&self.region))
    }
}

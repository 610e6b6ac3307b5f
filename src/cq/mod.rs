//! Continuous queries: change classification and alerting.
//!
//! This module turns the region's raw change feed into business-level
//! balance-change events. It is designed so a slow or failing consumer
//! never blocks the region write path.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐
//! │ MemoryRegion │
//! │ put/commit   │
//! └──────┬───────┘
//!        │ publish() [try_send, non-blocking]
//!        ▼
//! ┌──────────────────┐
//! │ Change Feed      │ (crossbeam-channel, bounded)
//! └──────┬───────────┘
//!        │
//!        ▼
//! ┌──────────────────┐
//! │ Dispatcher       │ (background thread owned by the registry)
//! │ Thread           │
//! └──────┬───────────┘
//!        │ per-subscription filter match
//!        ▼
//! ┌──────────────────┐     ┌──────────────────────┐
//! │ BalanceChange    │ ──> │ EventStore (bounded) │
//! │ Listener         │     │ + balance cache      │
//! └──────┬───────────┘     └──────────────────────┘
//!        │ classified event
//!        ▼
//! ┌──────────────────┐
//! │ Per-subscription │ (tokio mpsc, bounded, drop-on-full)
//! │ streams          │
//! └──────────────────┘
//! ```
//!
//! # Error Handling
//!
//! A notification that fails classification is logged and dropped; it
//! never stops the subscription or delays later notifications. When a
//! subscriber's stream buffer is full its events are dropped — the
//! shared event store remains the authoritative recent history.

mod event;
mod event_store;
mod filter;
mod listener;
mod registry;


pub use event::*;
pub use event_store::*;
pub use filter::*;
pub use listener::*;
pub use registry::*;

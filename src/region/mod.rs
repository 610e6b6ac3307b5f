//! In-memory key-value region with change notifications and optimistic
//! transactions.
//!
//! This is the in-process stand-in for the backing data grid. It exposes
//! the store contract the rest of the crate builds on:
//!
//! - `get`/`put`/`remove` with per-key version counters
//! - a bounded, non-blocking change feed delivering one
//!   [`ChangeNotification`] per committed mutation
//! - `begin()` transactions with read-your-writes buffering and
//!   commit-time conflict detection on every touched key
//!
//! # Architecture
//!
//! ```text
//! Write Path (hot path):
//!   put()/remove()/commit() -> feed.publish() [try_send, non-blocking]
//!                                     ↓
//! Bounded Change Feed (crossbeam-channel):
//!   consumed by the continuous-query dispatcher thread
//! ```
//!
//! When the feed is full the notification is dropped rather than blocking
//! the write path; readers of the event store can re-sync from the region
//! itself if they detect gaps.

mod feed;
mod memory;
mod notification;
mod transaction;


pub use feed::*;
pub use memory::*;
pub use notification::*;
pub use transaction::*;

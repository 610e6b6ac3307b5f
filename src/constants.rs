//! Crate-wide defaults shared by configuration and the engine assembly.

/// Name under which the default all-accounts subscription is registered.
pub const DEFAULT_QUERY_NAME: &str = "account-balance-monitor";

/// Upper bound on buffered balance-change events before tail eviction.
pub const DEFAULT_EVENT_STORE_CAPACITY: usize = 1000;

/// Capacity of the bounded change feed between the region write path and
/// the dispatcher. Writes never block on a full feed; overflow is dropped.
pub const DEFAULT_FEED_CAPACITY: usize = 1000;

/// Per-subscription outbound channel buffer. A slow subscriber loses
/// events rather than stalling the dispatcher.
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

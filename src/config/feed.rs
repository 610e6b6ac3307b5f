use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::constants::DEFAULT_EVENT_STORE_CAPACITY;
use crate::constants::DEFAULT_FEED_CAPACITY;
use crate::constants::DEFAULT_SUBSCRIBER_BUFFER;
use crate::Error;
use crate::Result;

/// Change feed and per-subscription channel sizing.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct FeedConfig {
    /// Bounded capacity of the global change feed between the region write
    /// path and the dispatcher thread. Writes never block; overflow drops.
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,

    /// Per-subscription outbound channel buffer
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            feed_capacity: default_feed_capacity(),
            subscriber_buffer: default_subscriber_buffer(),
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> Result<()> {
        if self.feed_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "feed_capacity must be greater than 0".into(),
            )));
        }
        if self.subscriber_buffer == 0 {
            return Err(Error::Config(ConfigError::Message(
                "subscriber_buffer must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

/// Event store buffer sizing.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct EventStoreConfig {
    /// Maximum number of buffered events before tail eviction
    #[serde(default = "default_event_store_capacity")]
    pub capacity: usize,
}

impl Default for EventStoreConfig {
    fn default() -> Self {
        Self {
            capacity: default_event_store_capacity(),
        }
    }
}

impl EventStoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "event store capacity must be greater than 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_feed_capacity() -> usize {
    DEFAULT_FEED_CAPACITY
}

fn default_subscriber_buffer() -> usize {
    DEFAULT_SUBSCRIBER_BUFFER
}

fn default_event_store_capacity() -> usize {
    DEFAULT_EVENT_STORE_CAPACITY
}

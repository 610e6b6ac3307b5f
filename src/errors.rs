//! Fund Ledger Engine Error Hierarchy
//!
//! Defines error types for the ledger engine, categorized by subsystem:
//! account invariants, region storage/transactions, continuous queries,
//! and configuration.

use config::ConfigError;
use rust_decimal::Decimal;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Account balance invariant and request validation failures
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Region storage and transaction failures
    #[error(transparent)]
    Region(#[from] RegionError),

    /// Continuous query registration and notification failures
    #[error(transparent)]
    Query(#[from] QueryError),

    /// Configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Unrecoverable failures requiring the caller to abort
    #[error("Fatal error: {0}")]
    Fatal(String),
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A debit would drive the balance below zero
    #[error("Insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        available: Decimal,
        requested: Decimal,
    },

    /// Credit/debit/transfer amounts must be strictly positive
    #[error("Amount must be positive: {0}")]
    NonPositiveAmount(Decimal),
}

#[derive(Debug, thiserror::Error)]
pub enum RegionError {
    /// Lookup for a key that is not present in the region
    #[error("{resource} {id} not found")]
    NotFound { resource: &'static str, id: String },

    /// Another transaction committed an overlapping key set first
    #[error("Commit conflict on key {key}")]
    CommitConflict { key: String },
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Custom registration under a name that is already taken
    #[error("Continuous query '{0}' already exists")]
    AlreadyExists(String),

    /// A delivered notification that cannot be classified
    #[error("Malformed change notification: {0}")]
    MalformedNotification(String),
}

// ============== Conversion helpers ============== //

impl RegionError {
    pub fn account_not_found(id: impl Into<String>) -> Self {
        RegionError::NotFound {
            resource: "Account",
            id: id.into(),
        }
    }
}

impl Error {
    /// Whether the error is a commit-time conflict the caller may retry.
    pub fn is_commit_conflict(&self) -> bool {
        matches!(self, Error::Region(RegionError::CommitConflict { .. }))
    }
}

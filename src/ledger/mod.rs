//! Account ledger model and services.
//!
//! The [`Account`] entity owns the balance-mutation invariants; the
//! [`LedgerService`] covers account lifecycle and the non-transactional
//! deposit/withdraw path (last-writer-wins); aggregation helpers compute
//! region-wide statistics. The transactional transfer path lives in the
//! `transfer` module.

mod account;
mod aggregate;
mod service;


pub use account::*;
pub use aggregate::*;
pub use service::*;

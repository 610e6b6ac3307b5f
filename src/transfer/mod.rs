//! Transactional fund movement: single transfers and batch adjustments
//! with all-or-nothing semantics over the region's optimistic
//! transactions.

mod service;

#[cfg(test)]
mod service_test;

pub use service::*;

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::RoundingStrategy;
use serde::Serialize;

use crate::Account;
use crate::AccountType;
use crate::MemoryRegion;

/// Region-wide account statistics computed over a values snapshot.
pub struct AccountAggregator {
    region: Arc<MemoryRegion<Account>>,
}

/// Combined aggregation result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionSummary {
    pub account_count: usize,
    pub total_balance: Decimal,
    pub average_balance: Decimal,
    pub min_balance: Option<Decimal>,
    pub max_balance: Option<Decimal>,
    pub count_by_type: HashMap<AccountType, u64>,
}

impl AccountAggregator {
    pub fn new(region: Arc<MemoryRegion<Account>>) -> Self {
        Self { region }
    }

    pub fn total_balance(&self) -> Decimal {
        self.region
            .values()
            .iter()
            .map(|account| account.balance)
            .sum()
    }

    pub fn count_by_type(&self) -> HashMap<AccountType, u64> {
        let mut counts = HashMap::new();
        for account in self.region.values() {
            *counts.entry(account.account_type).or_insert(0) += 1;
        }
        counts
    }

    /// Average balance across all accounts, rounded to 2 decimal places
    /// (half-up). Zero for an empty region.
    pub fn average_balance(&self) -> Decimal {
        let accounts = self.region.values();
        if accounts.is_empty() {
            return Decimal::ZERO;
        }
        let total: Decimal = accounts.iter().map(|account| account.balance).sum();
        let average = total / Decimal::from(accounts.len() as u64);
        average.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Smallest and largest balance, `None` for an empty region.
    pub fn min_max_balance(&self) -> Option<(Decimal, Decimal)> {
        let accounts = self.region.values();
        let min = accounts.iter().map(|account| account.balance).min()?;
        let max = accounts.iter().map(|account| account.balance).max()?;
        Some((min, max))
    }

    pub fn summary(&self) -> RegionSummary {
        let min_max = self.min_max_balance();
        RegionSummary {
            account_count: self.region.len(),
            total_balance: self.total_balance(),
            average_balance: self.average_balance(),
            min_balance: min_max.map(|(min, _)| min),
            max_balance: min_max.map(|(_, max)| max),
            count_by_type: self.count_by_type(),
        }
    }
}

use std::sync::Arc;

use chrono::Utc;
use nanoid::nanoid;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::info;

use crate::Account;
use crate::AccountStatus;
use crate::AccountType;
use crate::LedgerError;
use crate::MemoryRegion;
use crate::RegionError;
use crate::Result;

/// Caller-supplied fields for account creation; everything else
/// (identity, account number, status, timestamps) is generated.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub customer_id: String,
    pub account_type: AccountType,
    pub balance: Option<Decimal>,
    pub credit_limit: Option<Decimal>,
}

/// Account lifecycle operations over the shared region.
///
/// Deposit and withdraw here are the plain last-writer-wins path; the
/// transactional multi-key path is `TransferService`.
pub struct LedgerService {
    region: Arc<MemoryRegion<Account>>,
}

impl LedgerService {
    pub fn new(region: Arc<MemoryRegion<Account>>) -> Self {
        Self { region }
    }

    pub fn create_account(
        &self,
        request: NewAccount,
    ) -> Account {
        let now = Utc::now();
        let account = Account {
            account_id: nanoid!(),
            customer_id: request.customer_id,
            account_number: generate_account_number(),
            account_type: request.account_type,
            balance: request.balance.unwrap_or(Decimal::ZERO),
            credit_limit: request.credit_limit.unwrap_or(Decimal::ZERO),
            status: AccountStatus::Active,
            created_at: now,
            updated_at: now,
        };

        self.region.put(account.account_id.clone(), account.clone());
        info!(
            account_id = %account.account_id,
            customer_id = %account.customer_id,
            "Created account"
        );
        account
    }

    pub fn account(
        &self,
        account_id: &str,
    ) -> Result<Account> {
        self.region
            .get(account_id)
            .ok_or_else(|| RegionError::account_not_found(account_id).into())
    }

    pub fn accounts_for_customer(
        &self,
        customer_id: &str,
    ) -> Vec<Account> {
        self.region
            .values()
            .into_iter()
            .filter(|account| account.customer_id == customer_id)
            .collect()
    }

    pub fn all_accounts(&self) -> Vec<Account> {
        self.region.values()
    }

    pub fn deposit(
        &self,
        account_id: &str,
        amount: Decimal,
    ) -> Result<Account> {
        ensure_positive(amount)?;

        let mut account = self.account(account_id)?;
        account.credit(amount);
        self.region.put(account_id, account.clone());

        info!(
            account_id,
            amount = %amount,
            balance = %account.balance,
            "Deposit applied"
        );
        Ok(account)
    }

    pub fn withdraw(
        &self,
        account_id: &str,
        amount: Decimal,
    ) -> Result<Account> {
        ensure_positive(amount)?;

        let mut account = self.account(account_id)?;
        account.debit(amount)?;
        self.region.put(account_id, account.clone());

        info!(
            account_id,
            amount = %amount,
            balance = %account.balance,
            "Withdrawal applied"
        );
        Ok(account)
    }
}

fn ensure_positive(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(amount).into());
    }
    Ok(())
}

fn generate_account_number() -> String {
    let digits: u64 = rand::thread_rng().gen_range(0..10_000_000_000);
    format!("{digits:010}")
}

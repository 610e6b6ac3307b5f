use std::collections::BTreeMap;
use std::sync::Arc;

use nanoid::nanoid;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::Account;
use crate::LedgerError;
use crate::MemoryRegion;
use crate::RegionError;
use crate::Result;

/// Outcome of a single transfer, always carrying the transaction id for
/// traceability.
///
/// Insufficient funds and commit conflicts are structured failures
/// (`success == false`), not errors; the message distinguishes a
/// retryable conflict from a definitive refusal. Balances are reported
/// for the insufficient-funds case only, and the amount for the success
/// case only, mirroring what each outcome can truthfully state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferResult {
    pub transaction_id: String,
    pub success: bool,
    pub message: String,
    pub from_balance: Option<Decimal>,
    pub to_balance: Option<Decimal>,
    pub amount: Option<Decimal>,
}

/// Executes multi-key read-modify-write sequences under explicit
/// transaction boundaries with conflict/rollback handling.
///
/// The service never retries a conflicted commit — retry is caller
/// policy. Any error path that leaves a transaction open rolls it back
/// before returning (enforced by the transaction's drop guard).
pub struct TransferService {
    region: Arc<MemoryRegion<Account>>,
}

impl TransferService {
    pub fn new(region: Arc<MemoryRegion<Account>>) -> Self {
        Self { region }
    }

    /// Transfer `amount` from one account to another atomically.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::NonPositiveAmount`] before any transaction starts
    /// - [`RegionError::NotFound`] when either account is missing
    ///   (request-validation failure, no event recorded)
    ///
    /// Unexpected internal errors roll the transaction back and
    /// propagate.
    pub fn transfer(
        &self,
        from_id: &str,
        to_id: &str,
        amount: Decimal,
    ) -> Result<TransferResult> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount(amount).into());
        }

        let transaction_id = nanoid!();
        info!(
            %transaction_id,
            from_id,
            to_id,
            %amount,
            "Starting transfer transaction"
        );

        let mut tx = self.region.begin();

        let Some(mut from_account) = tx.get(from_id) else {
            tx.rollback();
            return Err(RegionError::account_not_found(from_id).into());
        };
        let Some(mut to_account) = tx.get(to_id) else {
            tx.rollback();
            return Err(RegionError::account_not_found(to_id).into());
        };

        if from_account.balance < amount {
            tx.rollback();
            warn!(%transaction_id, from_id, "Transfer refused: insufficient balance");
            return Ok(TransferResult {
                transaction_id,
                success: false,
                message: "Insufficient balance".to_string(),
                from_balance: Some(from_account.balance),
                to_balance: Some(to_account.balance),
                amount: None,
            });
        }

        from_account.debit(amount)?;
        to_account.credit(amount);

        tx.put(from_id, from_account.clone());
        tx.put(to_id, to_account.clone());

        match tx.commit() {
            Ok(()) => {
                info!(%transaction_id, "Transfer transaction committed");
                Ok(TransferResult {
                    transaction_id,
                    success: true,
                    message: "Transfer completed successfully".to_string(),
                    from_balance: Some(from_account.balance),
                    to_balance: Some(to_account.balance),
                    amount: Some(amount),
                })
            }
            Err(e) if e.is_commit_conflict() => {
                error!(%transaction_id, "Transfer transaction failed due to conflict: {e}");
                Ok(TransferResult {
                    transaction_id,
                    success: false,
                    message: "Transaction conflict - please retry".to_string(),
                    from_balance: None,
                    to_balance: None,
                    amount: None,
                })
            }
            Err(e) => {
                error!(%transaction_id, "Transfer transaction failed: {e}");
                Err(e)
            }
        }
    }

    /// Apply signed balance adjustments to multiple accounts in one
    /// transaction, iterating in key order.
    ///
    /// All-or-nothing: a missing account fails the batch with
    /// [`RegionError::NotFound`]; an adjustment that would drive a
    /// balance negative returns `Ok(false)`. Either way the region is
    /// left exactly as before the call. A commit conflict propagates as
    /// [`RegionError::CommitConflict`].
    pub fn batch_adjust(
        &self,
        adjustments: &BTreeMap<String, Decimal>,
    ) -> Result<bool> {
        let transaction_id = nanoid!();
        info!(
            %transaction_id,
            accounts = adjustments.len(),
            "Starting batch transaction"
        );

        let mut tx = self.region.begin();

        for (account_id, adjustment) in adjustments {
            let Some(mut account) = tx.get(account_id) else {
                tx.rollback();
                return Err(RegionError::account_not_found(account_id).into());
            };

            if account.balance + adjustment < Decimal::ZERO {
                warn!(
                    %transaction_id,
                    account_id,
                    "Batch transaction rolled back: insufficient balance"
                );
                tx.rollback();
                return Ok(false);
            }

            if adjustment.is_zero() {
                // Nothing to write for this entry.
                continue;
            }
            if adjustment.is_sign_positive() {
                account.credit(*adjustment);
            } else {
                account.debit(-adjustment)?;
            }
            tx.put(account_id, account);
        }

        tx.commit()?;
        info!(%transaction_id, "Batch transaction committed");
        Ok(true)
    }
}

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::change_feed;
use crate::Account;
use crate::AccountStatus;
use crate::AccountType;
use crate::ChangeFeedReceiver;
use crate::Error;
use crate::LedgerError;
use crate::MemoryRegion;
use crate::RegionError;

fn account(
    account_id: &str,
    balance: Decimal,
) -> Account {
    let now = Utc::now();
    Account {
        account_id: account_id.to_string(),
        customer_id: "cust-1".to_string(),
        account_number: "0000000001".to_string(),
        account_type: AccountType::Checking,
        balance,
        credit_limit: Decimal::ZERO,
        status: AccountStatus::Active,
        created_at: now,
        updated_at: now,
    }
}

fn setup(
    balances: &[(&str, Decimal)]
) -> (
    TransferService,
    Arc<MemoryRegion<Account>>,
    ChangeFeedReceiver<Account>,
) {
    let (feed_tx, feed_rx) = change_feed(100);
    let region = Arc::new(MemoryRegion::new(feed_tx));
    for (id, balance) in balances {
        region.put(*id, account(id, *balance));
    }
    // Drain the seeding notifications.
    while feed_rx.try_recv().is_ok() {}
    (TransferService::new(Arc::clone(&region)), region, feed_rx)
}

#[test]
fn transfer_moves_funds_and_reports_success() {
    let (service, region, _rx) = setup(&[("a", dec!(100)), ("b", dec!(0))]);

    let result = service.transfer("a", "b", dec!(100)).unwrap();

    assert!(result.success);
    assert!(!result.transaction_id.is_empty());
    assert_eq!(result.from_balance, Some(dec!(0)));
    assert_eq!(result.to_balance, Some(dec!(100)));
    assert_eq!(result.amount, Some(dec!(100)));

    assert_eq!(region.get("a").unwrap().balance, dec!(0));
    assert_eq!(region.get("b").unwrap().balance, dec!(100));
}

#[test]
fn transfer_with_insufficient_balance_fails_structurally() {
    let (service, region, _rx) = setup(&[("a", dec!(100)), ("b", dec!(50))]);

    let result = service.transfer("a", "b", dec!(150)).unwrap();

    assert!(!result.success);
    assert_eq!(result.message, "Insufficient balance");
    assert_eq!(result.from_balance, Some(dec!(100)));
    assert_eq!(result.to_balance, Some(dec!(50)));
    assert_eq!(result.amount, None);
    assert!(!result.transaction_id.is_empty());

    // Store untouched.
    assert_eq!(region.get("a").unwrap().balance, dec!(100));
    assert_eq!(region.get("b").unwrap().balance, dec!(50));
}

#[test]
fn transfer_to_missing_account_is_a_not_found_error() {
    let (service, region, rx) = setup(&[("a", dec!(100))]);

    let err = service.transfer("a", "ghost", dec!(10)).unwrap_err();
    assert!(matches!(
        err,
        Error::Region(RegionError::NotFound { resource: "Account", ref id }) if id == "ghost"
    ));

    let err = service.transfer("ghost", "a", dec!(10)).unwrap_err();
    assert!(matches!(err, Error::Region(RegionError::NotFound { .. })));

    assert_eq!(region.get("a").unwrap().balance, dec!(100));
    // Validation failures record no change notifications.
    assert!(rx.try_recv().is_err());
}

#[test]
fn transfer_rejects_non_positive_amounts() {
    let (service, _region, _rx) = setup(&[("a", dec!(100)), ("b", dec!(0))]);

    for amount in [Decimal::ZERO, dec!(-10)] {
        let err = service.transfer("a", "b", amount).unwrap_err();
        assert!(matches!(
            err,
            Error::Ledger(LedgerError::NonPositiveAmount(_))
        ));
    }
}

#[test]
fn racing_transfers_never_double_apply_and_report_conflicts_as_retryable() {
    let (service, region, _rx) = setup(&[("a", dec!(1000)), ("b", dec!(0))]);
    let service = Arc::new(service);

    // Pairs of transfers released together: the loser of each commit
    // race must surface as a structured conflict result, and the final
    // balances must reflect exactly the committed transfers.
    let mut results: Vec<TransferResult> = Vec::new();
    for _ in 0..50 {
        let barrier = Arc::new(std::sync::Barrier::new(2));
        let handles: Vec<_> = (0..2)
            .map(|_| {
                let service = Arc::clone(&service);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    service.transfer("a", "b", dec!(1)).unwrap()
                })
            })
            .collect();
        results.extend(handles.into_iter().map(|h| h.join().unwrap()));
    }

    for failed in results.iter().filter(|r| !r.success) {
        assert_eq!(failed.message, "Transaction conflict - please retry");
        assert_eq!(failed.from_balance, None);
        assert_eq!(failed.to_balance, None);
        assert_eq!(failed.amount, None);
        assert!(!failed.transaction_id.is_empty());
    }

    let succeeded = Decimal::from(results.iter().filter(|r| r.success).count() as u64);
    assert_eq!(region.get("a").unwrap().balance, dec!(1000) - succeeded);
    assert_eq!(region.get("b").unwrap().balance, succeeded);
}

#[test]
fn batch_adjust_applies_all_entries_atomically() {
    let (service, region, _rx) = setup(&[("a", dec!(100)), ("b", dec!(50)), ("c", dec!(10))]);

    let adjustments = BTreeMap::from([
        ("a".to_string(), dec!(-50)),
        ("b".to_string(), dec!(50)),
        ("c".to_string(), dec!(0)),
    ]);
    let applied = service.batch_adjust(&adjustments).unwrap();

    assert!(applied);
    assert_eq!(region.get("a").unwrap().balance, dec!(50));
    assert_eq!(region.get("b").unwrap().balance, dec!(100));
    assert_eq!(region.get("c").unwrap().balance, dec!(10));
}

#[test]
fn batch_adjust_rolls_back_whole_batch_when_a_balance_would_go_negative() {
    let (service, region, rx) = setup(&[("a", dec!(30)), ("b", dec!(50))]);

    let adjustments = BTreeMap::from([
        ("a".to_string(), dec!(-50)),
        ("b".to_string(), dec!(50)),
    ]);
    let applied = service.batch_adjust(&adjustments).unwrap();

    assert!(!applied);
    // Neither account moved, and nothing was published.
    assert_eq!(region.get("a").unwrap().balance, dec!(30));
    assert_eq!(region.get("b").unwrap().balance, dec!(50));
    assert!(rx.try_recv().is_err());
}

#[test]
fn batch_adjust_with_missing_account_fails_the_whole_batch() {
    let (service, region, _rx) = setup(&[("a", dec!(100))]);

    let adjustments = BTreeMap::from([
        ("a".to_string(), dec!(-10)),
        ("ghost".to_string(), dec!(10)),
    ]);
    let err = service.batch_adjust(&adjustments).unwrap_err();

    assert!(matches!(
        err,
        Error::Region(RegionError::NotFound { resource: "Account", ref id }) if id == "ghost"
    ));
    assert_eq!(region.get("a").unwrap().balance, dec!(100));
}

#[test]
fn committed_transfer_publishes_one_notification_per_account() {
    let (service, _region, rx) = setup(&[("a", dec!(100)), ("b", dec!(0))]);

    service.transfer("a", "b", dec!(25)).unwrap();

    let first = rx.try_recv().unwrap();
    let second = rx.try_recv().unwrap();
    assert_eq!(first.key, "a");
    assert_eq!(second.key, "b");
    assert!(rx.try_recv().is_err());
}

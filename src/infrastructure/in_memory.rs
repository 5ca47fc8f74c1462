use crate::domain::allocation::Allocation;
use crate::domain::ports::{PaymentStore, ReceivableStore};
use crate::domain::receipt::ReceiptPayment;
use crate::domain::receivable::Receivable;
use crate::error::{EmiError, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Ledger {
    allocations: Vec<Allocation>,
    receipts: Vec<ReceiptPayment>,
    receipt_nos: HashSet<String>,
}

impl Ledger {
    fn ensure_new_receipt(&self, receipt_no: &str) -> Result<()> {
        if self.receipt_nos.contains(receipt_no) {
            Err(EmiError::storage(format!(
                "Duplicate receipt number: {}",
                receipt_no
            )))
        } else {
            Ok(())
        }
    }

    fn push_receipt(&mut self, receipt: ReceiptPayment) {
        self.receipt_nos.insert(receipt.receipt_no.clone());
        self.receipts.push(receipt);
    }
}

/// A thread-safe in-memory store for receivables and payment records.
///
/// Receivables live in `Arc<RwLock<HashMap<String, Vec<Receivable>>>>`, kept
/// sorted by creation date per account. Allocations and receipts share a single
/// lock so a payment is recorded under one write guard. Cloning shares state.
#[derive(Default, Clone)]
pub struct InMemoryLoanStore {
    receivables: Arc<RwLock<HashMap<String, Vec<Receivable>>>>,
    ledger: Arc<RwLock<Ledger>>,
}

impl InMemoryLoanStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReceivableStore for InMemoryLoanStore {
    async fn store(&self, receivable: Receivable) -> Result<()> {
        let mut receivables = self.receivables.write().await;
        let snapshots = receivables
            .entry(receivable.loan_account_no.clone())
            .or_default();
        // Insert after any snapshot with the same date so equal dates keep load order
        let at = snapshots.partition_point(|r| r.created_date <= receivable.created_date);
        snapshots.insert(at, receivable);
        Ok(())
    }

    async fn find_by_account(&self, loan_account_no: &str) -> Result<Option<Receivable>> {
        let receivables = self.receivables.read().await;
        Ok(receivables
            .get(loan_account_no)
            .and_then(|snapshots| snapshots.last())
            .cloned())
    }

    async fn pending(&self, loan_account_no: &str) -> Result<Vec<Receivable>> {
        let receivables = self.receivables.read().await;
        Ok(receivables
            .get(loan_account_no)
            .into_iter()
            .flatten()
            .filter(|r| r.is_pending())
            .cloned()
            .collect())
    }

    async fn total_pending_amount(&self, loan_account_no: &str) -> Result<Decimal> {
        let receivables = self.receivables.read().await;
        Ok(receivables
            .get(loan_account_no)
            .into_iter()
            .flatten()
            .map(|r| r.total_amount)
            .sum())
    }
}

#[async_trait]
impl PaymentStore for InMemoryLoanStore {
    async fn save_allocation(&self, allocation: Allocation) -> Result<Allocation> {
        let mut ledger = self.ledger.write().await;
        ledger.allocations.push(allocation.clone());
        Ok(allocation)
    }

    async fn save_receipt_payment(&self, receipt: ReceiptPayment) -> Result<ReceiptPayment> {
        let mut ledger = self.ledger.write().await;
        ledger.ensure_new_receipt(&receipt.receipt_no)?;
        ledger.push_receipt(receipt.clone());
        Ok(receipt)
    }

    async fn record_payment(
        &self,
        allocation: Allocation,
        receipt: ReceiptPayment,
    ) -> Result<(Allocation, ReceiptPayment)> {
        let mut ledger = self.ledger.write().await;
        // Check every constraint before the first write
        ledger.ensure_new_receipt(&receipt.receipt_no)?;
        ledger.allocations.push(allocation.clone());
        ledger.push_receipt(receipt.clone());
        Ok((allocation, receipt))
    }

    async fn allocations(&self, loan_account_no: &str) -> Result<Vec<Allocation>> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .allocations
            .iter()
            .filter(|a| a.loan_account_no == loan_account_no)
            .cloned()
            .collect())
    }

    async fn receipts(&self, loan_account_no: &str) -> Result<Vec<ReceiptPayment>> {
        let ledger = self.ledger.read().await;
        Ok(ledger
            .receipts
            .iter()
            .filter(|r| r.loan_account_no == loan_account_no)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::receipt::PaymentMode;
    use crate::error::ErrorKind;
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal_macros::dec;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn receipt(receipt_no: &str) -> ReceiptPayment {
        ReceiptPayment {
            loan_account_no: "12345".to_string(),
            paid_amount: dec!(5200.00),
            payment_mode: PaymentMode::Cash,
            receipt_no: receipt_no.to_string(),
            payment_date: at(20),
        }
    }

    fn allocation() -> Allocation {
        Allocation {
            loan_account_no: "12345".to_string(),
            allocated_penalty: dec!(200.00),
            allocated_emi: dec!(5000.00),
            allocation_date: at(20),
            receipt_no: None,
        }
    }

    #[tokio::test]
    async fn test_find_returns_latest_snapshot() {
        let store = InMemoryLoanStore::new();
        store
            .store(Receivable::new("12345", dec!(5000.00), dec!(0), at(15)))
            .await
            .unwrap();
        store
            .store(Receivable::new("12345", dec!(5000.00), dec!(200.00), at(1)))
            .await
            .unwrap();

        let found = store.find_by_account("12345").await.unwrap().unwrap();
        assert_eq!(found.created_date, at(15));
        assert_eq!(found.penalty, Some(dec!(0)));

        assert!(store.find_by_account("99999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pending_and_total() {
        let store = InMemoryLoanStore::new();
        store
            .store(Receivable::new("12345", dec!(5000.00), dec!(200.00), at(1)))
            .await
            .unwrap();
        store
            .store(Receivable::new("12345", dec!(0), dec!(0), at(2)))
            .await
            .unwrap();
        store
            .store(Receivable::new("12345", dec!(100.00), dec!(10.00), at(3)))
            .await
            .unwrap();

        let pending = store.pending("12345").await.unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[0].created_date, at(1));
        assert_eq!(pending[1].created_date, at(3));

        assert_eq!(
            store.total_pending_amount("12345").await.unwrap(),
            dec!(5310.00)
        );
        assert_eq!(
            store.total_pending_amount("99999").await.unwrap(),
            Decimal::ZERO
        );
        assert!(store.pending("99999").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_date_snapshots_keep_load_order() {
        let store = InMemoryLoanStore::new();
        for emi in [dec!(100.00), dec!(200.00), dec!(50.00)] {
            store
                .store(Receivable::new("12345", emi, dec!(0), at(1)))
                .await
                .unwrap();
        }

        let totals: Vec<Decimal> = store
            .pending("12345")
            .await
            .unwrap()
            .iter()
            .map(|r| r.total_amount)
            .collect();
        assert_eq!(totals, vec![dec!(100.00), dec!(200.00), dec!(50.00)]);
        let latest = store.find_by_account("12345").await.unwrap().unwrap();
        assert_eq!(latest.total_amount, dec!(50.00));
    }

    #[tokio::test]
    async fn test_record_payment_rejects_duplicate_receipt_atomically() {
        let store = InMemoryLoanStore::new();
        store
            .record_payment(allocation(), receipt("RCP20240120090000001"))
            .await
            .unwrap();

        let err = store
            .record_payment(allocation(), receipt("RCP20240120090000001"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StorageFailure);

        // The failed call must not leave an orphaned allocation behind
        assert_eq!(store.allocations("12345").await.unwrap().len(), 1);
        assert_eq!(store.receipts("12345").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_individual_saves() {
        let store = InMemoryLoanStore::new();
        let saved = store.save_allocation(allocation()).await.unwrap();
        assert_eq!(saved, allocation());

        store
            .save_receipt_payment(receipt("RCP20240120090000002"))
            .await
            .unwrap();
        assert!(
            store
                .save_receipt_payment(receipt("RCP20240120090000002"))
                .await
                .is_err()
        );

        assert_eq!(store.allocations("12345").await.unwrap().len(), 1);
        assert_eq!(store.receipts("12345").await.unwrap().len(), 1);
        assert!(store.receipts("99999").await.unwrap().is_empty());
    }
}

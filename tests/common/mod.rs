#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Local, NaiveDate, NaiveDateTime};
use emi_payments::application::service::PaymentService;
use emi_payments::domain::allocation::Allocation;
use emi_payments::domain::ports::{PaymentStore, ReceiptNumberSource, ReceivableStore};
use emi_payments::domain::receipt::{ReceiptPayment, format_receipt_no};
use emi_payments::domain::receivable::Receivable;
use emi_payments::error::{EmiError, Result};
use emi_payments::infrastructure::in_memory::InMemoryLoanStore;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, AtomicUsize, Ordering};

pub fn created_date() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

/// The account used throughout: penalty 200.00, EMI 5000.00, total 5200.00.
pub fn standard_receivable() -> Receivable {
    Receivable::new("12345", dec!(5000.00), dec!(200.00), created_date())
}

pub async fn seeded_store() -> InMemoryLoanStore {
    let store = InMemoryLoanStore::new();
    store.store(standard_receivable()).await.unwrap();
    store
}

pub fn service_over(store: InMemoryLoanStore) -> PaymentService {
    PaymentService::new(Box::new(store.clone()), Box::new(store))
}

/// Receipt numbers that never repeat within a run.
#[derive(Default)]
pub struct SequentialReceiptNumbers {
    next: AtomicU16,
}

impl ReceiptNumberSource for SequentialReceiptNumbers {
    fn next_receipt_no(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        // The suffix is only three digits, so vary the timestamp as well
        let at = Local::now().naive_local() + chrono::Duration::seconds(i64::from(n / 1000));
        format_receipt_no(at, n % 1000)
    }
}

/// Counts every storage call before delegating to an in-memory store.
#[derive(Clone, Default)]
pub struct CountingStore {
    inner: InMemoryLoanStore,
    calls: Arc<AtomicUsize>,
}

impl CountingStore {
    pub fn new(inner: InMemoryLoanStore) -> Self {
        Self {
            inner,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ReceivableStore for CountingStore {
    async fn store(&self, receivable: Receivable) -> Result<()> {
        self.hit();
        self.inner.store(receivable).await
    }

    async fn find_by_account(&self, loan_account_no: &str) -> Result<Option<Receivable>> {
        self.hit();
        self.inner.find_by_account(loan_account_no).await
    }

    async fn pending(&self, loan_account_no: &str) -> Result<Vec<Receivable>> {
        self.hit();
        self.inner.pending(loan_account_no).await
    }

    async fn total_pending_amount(&self, loan_account_no: &str) -> Result<Decimal> {
        self.hit();
        self.inner.total_pending_amount(loan_account_no).await
    }
}

#[async_trait]
impl PaymentStore for CountingStore {
    async fn save_allocation(&self, allocation: Allocation) -> Result<Allocation> {
        self.hit();
        self.inner.save_allocation(allocation).await
    }

    async fn save_receipt_payment(&self, receipt: ReceiptPayment) -> Result<ReceiptPayment> {
        self.hit();
        self.inner.save_receipt_payment(receipt).await
    }

    async fn record_payment(
        &self,
        allocation: Allocation,
        receipt: ReceiptPayment,
    ) -> Result<(Allocation, ReceiptPayment)> {
        self.hit();
        self.inner.record_payment(allocation, receipt).await
    }

    async fn allocations(&self, loan_account_no: &str) -> Result<Vec<Allocation>> {
        self.hit();
        self.inner.allocations(loan_account_no).await
    }

    async fn receipts(&self, loan_account_no: &str) -> Result<Vec<ReceiptPayment>> {
        self.hit();
        self.inner.receipts(loan_account_no).await
    }
}

fn unavailable() -> EmiError {
    EmiError::storage("connection refused")
}

/// A receivable store whose backend is down.
pub struct UnavailableReceivables;

#[async_trait]
impl ReceivableStore for UnavailableReceivables {
    async fn store(&self, _receivable: Receivable) -> Result<()> {
        Err(unavailable())
    }

    async fn find_by_account(&self, _loan_account_no: &str) -> Result<Option<Receivable>> {
        Err(unavailable())
    }

    async fn pending(&self, _loan_account_no: &str) -> Result<Vec<Receivable>> {
        Err(unavailable())
    }

    async fn total_pending_amount(&self, _loan_account_no: &str) -> Result<Decimal> {
        Err(unavailable())
    }
}

/// A payment store that accepts reads but fails every write.
#[derive(Clone, Default)]
pub struct ReadOnlyPayments {
    inner: InMemoryLoanStore,
}

#[async_trait]
impl PaymentStore for ReadOnlyPayments {
    async fn save_allocation(&self, _allocation: Allocation) -> Result<Allocation> {
        Err(unavailable())
    }

    async fn save_receipt_payment(&self, _receipt: ReceiptPayment) -> Result<ReceiptPayment> {
        Err(unavailable())
    }

    async fn record_payment(
        &self,
        _allocation: Allocation,
        _receipt: ReceiptPayment,
    ) -> Result<(Allocation, ReceiptPayment)> {
        Err(unavailable())
    }

    async fn allocations(&self, loan_account_no: &str) -> Result<Vec<Allocation>> {
        self.inner.allocations(loan_account_no).await
    }

    async fn receipts(&self, loan_account_no: &str) -> Result<Vec<ReceiptPayment>> {
        self.inner.receipts(loan_account_no).await
    }
}

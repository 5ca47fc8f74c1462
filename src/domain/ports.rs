use super::allocation::Allocation;
use super::receipt::ReceiptPayment;
use super::receivable::Receivable;
use crate::error::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

/// Read side of the dues a loan account owes. Snapshots are append-only.
#[async_trait]
pub trait ReceivableStore: Send + Sync {
    async fn store(&self, receivable: Receivable) -> Result<()>;

    /// The most recent snapshot for the account, if any.
    async fn find_by_account(&self, loan_account_no: &str) -> Result<Option<Receivable>>;

    /// Snapshots with a positive total, oldest first.
    async fn pending(&self, loan_account_no: &str) -> Result<Vec<Receivable>>;

    /// Sum of `total_amount` over every snapshot of the account; zero when none exist.
    async fn total_pending_amount(&self, loan_account_no: &str) -> Result<Decimal>;
}

/// Append-only storage for payment outcomes.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn save_allocation(&self, allocation: Allocation) -> Result<Allocation>;

    /// Fails with a storage error if the receipt number is already taken.
    async fn save_receipt_payment(&self, receipt: ReceiptPayment) -> Result<ReceiptPayment>;

    /// Persists an allocation and its receipt as one unit: either both are
    /// written or neither is.
    async fn record_payment(
        &self,
        allocation: Allocation,
        receipt: ReceiptPayment,
    ) -> Result<(Allocation, ReceiptPayment)>;

    async fn allocations(&self, loan_account_no: &str) -> Result<Vec<Allocation>>;

    async fn receipts(&self, loan_account_no: &str) -> Result<Vec<ReceiptPayment>>;

    /// Makes buffered writes durable. Called once at shutdown.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

pub trait ReceiptNumberSource: Send + Sync {
    fn next_receipt_no(&self) -> String;
}

pub type ReceivableStoreBox = Box<dyn ReceivableStore>;
pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type ReceiptNumberSourceBox = Box<dyn ReceiptNumberSource>;

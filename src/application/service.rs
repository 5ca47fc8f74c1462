use super::locks::AccountLocks;
use super::policy::OverpaymentPolicy;
use crate::domain::allocation::{Allocation, allocate};
use crate::domain::ports::{PaymentStoreBox, ReceiptNumberSourceBox, ReceivableStoreBox};
use crate::domain::receipt::{PaymentMode, RandomReceiptNumbers, ReceiptPayment};
use crate::domain::receivable::Receivable;
use crate::domain::validation::{
    ensure_loan_account, ensure_payment_amount, ensure_receivable_amounts, ensure_sufficient,
    validate_loan_account,
};
use crate::error::{EmiError, Result};
use chrono::{Local, NaiveDateTime};
use log::{debug, info, warn};
use rust_decimal::Decimal;

/// Receipt and allocation written for one accepted payment.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub receipt: ReceiptPayment,
    pub allocation: Allocation,
}

/// The main entry point for EMI payment handling.
///
/// `PaymentService` owns the storage backends it is given at construction and
/// exposes the lookup, allocation and payment operations used by the console.
/// It is `Send + Sync`; concurrent payments on the same loan account are
/// serialized, payments on different accounts are not.
pub struct PaymentService {
    receivables: ReceivableStoreBox,
    payments: PaymentStoreBox,
    receipt_numbers: ReceiptNumberSourceBox,
    overpayment: OverpaymentPolicy,
    locks: AccountLocks,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

impl PaymentService {
    /// Creates a new `PaymentService` instance.
    ///
    /// # Arguments
    ///
    /// * `receivables` - The store holding receivable snapshots.
    /// * `payments` - The store for allocations and receipts.
    ///
    /// Receipt numbers are timestamp-plus-random and overpayments are absorbed
    /// until configured otherwise.
    pub fn new(receivables: ReceivableStoreBox, payments: PaymentStoreBox) -> Self {
        Self {
            receivables,
            payments,
            receipt_numbers: Box::new(RandomReceiptNumbers::new()),
            overpayment: OverpaymentPolicy::default(),
            locks: AccountLocks::new(),
        }
    }

    pub fn with_overpayment_policy(mut self, policy: OverpaymentPolicy) -> Self {
        self.overpayment = policy;
        self
    }

    pub fn with_receipt_numbers(mut self, source: ReceiptNumberSourceBox) -> Self {
        self.receipt_numbers = source;
        self
    }

    pub fn overpayment_policy(&self) -> OverpaymentPolicy {
        self.overpayment
    }

    /// Format check only; see [`validate_loan_account`].
    pub fn validate_loan_account(&self, loan_account_no: &str) -> bool {
        validate_loan_account(loan_account_no)
    }

    /// Adds a receivable snapshot, as a loan-servicing batch would.
    pub async fn load_receivable(&self, receivable: Receivable) -> Result<()> {
        ensure_loan_account(&receivable.loan_account_no)?;
        ensure_receivable_amounts(&receivable)?;
        if !receivable.is_consistent() {
            warn!(
                "Receivable for {} has total {} but penalty + EMI is {}",
                receivable.loan_account_no,
                receivable.total_amount,
                receivable.allocatable()
            );
        }
        self.receivables.store(receivable).await
    }

    async fn fetch_receivable(&self, loan_account_no: &str) -> Result<Receivable> {
        self.receivables
            .find_by_account(loan_account_no)
            .await?
            .ok_or_else(|| {
                EmiError::NotFound(format!(
                    "No pending EMI found for loan account: {}",
                    loan_account_no
                ))
            })
    }

    /// Returns the current receivable of a loan account.
    pub async fn get_pending_emi_details(&self, loan_account_no: &str) -> Result<Receivable> {
        ensure_loan_account(loan_account_no)?;
        self.fetch_receivable(loan_account_no).await
    }

    pub async fn pending_receivables(&self, loan_account_no: &str) -> Result<Vec<Receivable>> {
        ensure_loan_account(loan_account_no)?;
        self.receivables.pending(loan_account_no).await
    }

    pub async fn total_pending_amount(&self, loan_account_no: &str) -> Result<Decimal> {
        ensure_loan_account(loan_account_no)?;
        self.receivables.total_pending_amount(loan_account_no).await
    }

    /// Previews how `payment_amount` would be split for the account.
    ///
    /// Unlike [`process_payment`](Self::process_payment) this accepts amounts
    /// below the total due and persists nothing.
    pub async fn calculate_allocation(
        &self,
        loan_account_no: &str,
        payment_amount: Decimal,
    ) -> Result<Allocation> {
        ensure_loan_account(loan_account_no)?;
        if payment_amount < Decimal::ZERO {
            return Err(EmiError::InvalidInput(
                "Payment amount must not be negative".to_string(),
            ));
        }

        let receivable = self.fetch_receivable(loan_account_no).await?;
        Ok(allocate(&receivable, payment_amount, now()))
    }

    /// Accepts a payment against the account's current receivable.
    ///
    /// Input is validated before any storage access. The receivable is read
    /// once, and the allocation and receipt are written in a single atomic
    /// store call while the account lock is held.
    pub async fn process_payment(
        &self,
        loan_account_no: &str,
        payment_amount: Option<Decimal>,
        payment_mode: &str,
    ) -> Result<PaymentOutcome> {
        ensure_loan_account(loan_account_no)?;
        let amount = ensure_payment_amount(payment_amount)?;
        let mode: PaymentMode = payment_mode.parse()?;

        let _guard = self.locks.acquire(loan_account_no).await;

        let receivable = self.fetch_receivable(loan_account_no).await?;
        ensure_sufficient(amount, &receivable)?;
        self.overpayment.check(amount, &receivable)?;

        let processed_at = now();
        let mut allocation = allocate(&receivable, amount, processed_at);
        debug!(
            "Allocated {} for {}: penalty {}, EMI {}",
            amount, loan_account_no, allocation.allocated_penalty, allocation.allocated_emi
        );

        let receipt_no = self.receipt_numbers.next_receipt_no();
        allocation.receipt_no = Some(receipt_no.clone());
        let receipt = ReceiptPayment {
            loan_account_no: loan_account_no.to_string(),
            paid_amount: amount,
            payment_mode: mode,
            receipt_no,
            payment_date: processed_at,
        };

        let (allocation, receipt) = self.payments.record_payment(allocation, receipt).await?;
        info!(
            "Payment {} of {} ({}) recorded for {}",
            receipt.receipt_no, receipt.paid_amount, receipt.payment_mode, loan_account_no
        );

        Ok(PaymentOutcome {
            receipt,
            allocation,
        })
    }

    pub async fn receipts(&self, loan_account_no: &str) -> Result<Vec<ReceiptPayment>> {
        self.payments.receipts(loan_account_no).await
    }

    pub async fn allocations(&self, loan_account_no: &str) -> Result<Vec<Allocation>> {
        self.payments.allocations(loan_account_no).await
    }

    /// Consumes the service, flushing the payment store.
    pub async fn shutdown(self) -> Result<()> {
        self.payments.flush().await
    }
}

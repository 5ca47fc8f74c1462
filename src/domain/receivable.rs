use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A snapshot of what a borrower owes on a loan account at a point in time.
///
/// Receivables are produced outside this crate (a loan-servicing batch, or the
/// CSV seed file) and are never modified by payment processing.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Receivable {
    pub loan_account_no: String,
    /// Pending installment. Missing values allocate as zero.
    pub emi_amount: Option<Decimal>,
    /// Outstanding penalty charges. Missing values allocate as zero.
    pub penalty: Option<Decimal>,
    /// Amount a payment has to cover to be accepted.
    pub total_amount: Decimal,
    pub created_date: NaiveDateTime,
}

impl Receivable {
    pub fn new(
        loan_account_no: impl Into<String>,
        emi_amount: Decimal,
        penalty: Decimal,
        created_date: NaiveDateTime,
    ) -> Self {
        Self {
            loan_account_no: loan_account_no.into(),
            emi_amount: Some(emi_amount),
            penalty: Some(penalty),
            total_amount: emi_amount + penalty,
            created_date,
        }
    }

    pub fn penalty_or_zero(&self) -> Decimal {
        self.penalty.unwrap_or(Decimal::ZERO)
    }

    pub fn emi_or_zero(&self) -> Decimal {
        self.emi_amount.unwrap_or(Decimal::ZERO)
    }

    /// Penalty plus EMI, i.e. the most the waterfall can ever allocate.
    pub fn allocatable(&self) -> Decimal {
        self.penalty_or_zero() + self.emi_or_zero()
    }

    /// Whether `total_amount` agrees with its components.
    pub fn is_consistent(&self) -> bool {
        self.total_amount == self.allocatable()
    }

    pub fn is_pending(&self) -> bool {
        self.total_amount > Decimal::ZERO
    }
}

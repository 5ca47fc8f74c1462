use super::receivable::Receivable;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// How one payment was split between penalty and EMI.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Allocation {
    pub loan_account_no: String,
    pub allocated_penalty: Decimal,
    pub allocated_emi: Decimal,
    pub allocation_date: NaiveDateTime,
    /// Receipt of the payment this allocation belongs to, once one is issued.
    #[serde(default)]
    pub receipt_no: Option<String>,
}

impl Allocation {
    pub fn total(&self) -> Decimal {
        self.allocated_penalty + self.allocated_emi
    }
}

/// Penalty-first waterfall.
///
/// The penalty is satisfied before anything reaches the EMI, and neither
/// bucket receives more than the receivable owes on it. Whatever exceeds
/// penalty plus EMI is left unallocated.
pub fn allocate(receivable: &Receivable, payment: Decimal, at: NaiveDateTime) -> Allocation {
    let penalty = receivable.penalty_or_zero();
    let emi = receivable.emi_or_zero();

    let (allocated_penalty, allocated_emi) = if payment >= penalty {
        let remaining = payment - penalty;
        (penalty, remaining.min(emi))
    } else {
        (payment, Decimal::ZERO)
    };

    Allocation {
        loan_account_no: receivable.loan_account_no.clone(),
        allocated_penalty,
        allocated_emi,
        allocation_date: at,
        receipt_no: None,
    }
}

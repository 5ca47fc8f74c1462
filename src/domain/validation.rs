//! Input checks applied before a payment touches storage.

use super::receivable::Receivable;
use crate::error::{EmiError, Result};
use rust_decimal::Decimal;

/// Scale at which amounts are persisted.
pub const AMOUNT_SCALE: u32 = 2;

/// Format gate for loan account numbers: non-empty, ASCII digits only.
///
/// This does not check that the account exists.
pub fn validate_loan_account(loan_account_no: &str) -> bool {
    !loan_account_no.is_empty() && loan_account_no.bytes().all(|b| b.is_ascii_digit())
}

pub fn ensure_loan_account(loan_account_no: &str) -> Result<()> {
    if validate_loan_account(loan_account_no) {
        Ok(())
    } else {
        Err(EmiError::InvalidInput(format!(
            "Invalid loan account number: {}",
            loan_account_no
        )))
    }
}

/// Checks that a payment amount is present, positive and representable at
/// [`AMOUNT_SCALE`].
///
/// The scale check is a policy of this crate: amounts are stored at two
/// decimals, so a payment with a finer fraction is refused as invalid input
/// rather than silently rounded.
pub fn ensure_payment_amount(amount: Option<Decimal>) -> Result<Decimal> {
    let amount = match amount {
        Some(amount) if amount > Decimal::ZERO => amount,
        _ => {
            return Err(EmiError::InvalidInput(
                "Payment amount must be greater than zero".to_string(),
            ));
        }
    };

    if amount.normalize().scale() > AMOUNT_SCALE {
        return Err(EmiError::InvalidInput(format!(
            "Payment amount must have at most {} decimal places",
            AMOUNT_SCALE
        )));
    }

    Ok(amount)
}

/// Receivables must not carry negative components; the allocation waterfall
/// relies on penalty and EMI being at least zero.
pub fn ensure_receivable_amounts(receivable: &Receivable) -> Result<()> {
    let components = [
        ("EMI amount", receivable.emi_or_zero()),
        ("penalty", receivable.penalty_or_zero()),
        ("total amount", receivable.total_amount),
    ];
    match components.iter().find(|(_, amount)| *amount < Decimal::ZERO) {
        Some((name, amount)) => Err(EmiError::InvalidInput(format!(
            "Receivable for {} has a negative {}: {}",
            receivable.loan_account_no, name, amount
        ))),
        None => Ok(()),
    }
}

/// Exact-or-more: a payment must cover the receivable's total amount.
pub fn ensure_sufficient(amount: Decimal, receivable: &Receivable) -> Result<()> {
    if amount < receivable.total_amount {
        Err(EmiError::InvalidInput(
            "Payment amount is less than total pending amount".to_string(),
        ))
    } else {
        Ok(())
    }
}

use crate::domain::receivable::Receivable;
use crate::error::{EmiError, Result};
use rust_decimal::Decimal;

/// What to do with the part of a payment that exceeds penalty plus EMI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverpaymentPolicy {
    /// Accept the payment; the excess stays unallocated on the receipt.
    #[default]
    Absorb,
    /// Refuse any payment larger than the amount due. The amount due is
    /// penalty + EMI, or the receivable's total when that is larger.
    Reject,
}

impl OverpaymentPolicy {
    pub fn check(&self, amount: Decimal, receivable: &Receivable) -> Result<()> {
        // The sufficiency check requires the total, so never cap below it
        let ceiling = receivable.allocatable().max(receivable.total_amount);
        match self {
            OverpaymentPolicy::Absorb => Ok(()),
            OverpaymentPolicy::Reject if amount > ceiling => Err(EmiError::InvalidInput(format!(
                "Payment amount exceeds the allocatable amount of {:.2}",
                ceiling
            ))),
            OverpaymentPolicy::Reject => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use chrono::NaiveDateTime;
    use rust_decimal_macros::dec;

    #[test]
    fn test_absorb_accepts_any_amount() {
        let r = Receivable::new("12345", dec!(5000.00), dec!(200.00), NaiveDateTime::default());
        assert!(OverpaymentPolicy::Absorb.check(dec!(99999.00), &r).is_ok());
    }

    #[test]
    fn test_reject_refuses_excess() {
        let r = Receivable::new("12345", dec!(5000.00), dec!(200.00), NaiveDateTime::default());
        assert!(OverpaymentPolicy::Reject.check(dec!(5200.00), &r).is_ok());

        let err = OverpaymentPolicy::Reject.check(dec!(5200.01), &r).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert!(err.to_string().contains("5200.00"));
    }

    #[test]
    fn test_reject_allows_paying_an_inflated_total() {
        let mut r = Receivable::new("12345", dec!(5000.00), dec!(200.00), NaiveDateTime::default());
        r.total_amount = dec!(5300.00);

        assert!(OverpaymentPolicy::Reject.check(dec!(5300.00), &r).is_ok());
        let err = OverpaymentPolicy::Reject.check(dec!(5300.01), &r).unwrap_err();
        assert!(err.to_string().contains("5300.00"));
    }
}

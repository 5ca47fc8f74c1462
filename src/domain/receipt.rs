use super::ports::ReceiptNumberSource;
use crate::error::EmiError;
use chrono::{Local, NaiveDateTime};
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const RECEIPT_PREFIX: &str = "RCP";
const RECEIPT_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMode {
    Cash,
    Cheque,
    Online,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "CASH",
            PaymentMode::Cheque => "CHEQUE",
            PaymentMode::Online => "ONLINE",
        }
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMode {
    type Err = EmiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CASH" => Ok(PaymentMode::Cash),
            "CHEQUE" => Ok(PaymentMode::Cheque),
            "ONLINE" => Ok(PaymentMode::Online),
            _ => Err(EmiError::InvalidInput(
                "Invalid payment mode. Please use CASH, CHEQUE, or ONLINE.".to_string(),
            )),
        }
    }
}

/// Record of a completed payment.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ReceiptPayment {
    pub loan_account_no: String,
    pub paid_amount: Decimal,
    pub payment_mode: PaymentMode,
    pub receipt_no: String,
    pub payment_date: NaiveDateTime,
}

/// Builds a receipt number for the given instant and suffix.
///
/// The suffix is reduced modulo 1000 and zero-padded to three digits.
pub fn format_receipt_no(at: NaiveDateTime, suffix: u16) -> String {
    format!(
        "{}{}{:03}",
        RECEIPT_PREFIX,
        at.format(RECEIPT_TIMESTAMP_FORMAT),
        suffix % 1000
    )
}

/// Checks the shape `RCP` + 14 timestamp digits + 3 suffix digits.
pub fn is_well_formed_receipt_no(receipt_no: &str) -> bool {
    match receipt_no.strip_prefix(RECEIPT_PREFIX) {
        Some(rest) => {
            rest.len() == 17
                && rest.bytes().all(|b| b.is_ascii_digit())
                && NaiveDateTime::parse_from_str(&rest[..14], RECEIPT_TIMESTAMP_FORMAT).is_ok()
        }
        None => false,
    }
}

/// Local-clock timestamp plus a pseudorandom suffix.
///
/// Two calls within the same second collide with probability 1/1000; callers
/// rely on the store's uniqueness check, not on this generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomReceiptNumbers;

impl RandomReceiptNumbers {
    pub fn new() -> Self {
        Self
    }
}

impl ReceiptNumberSource for RandomReceiptNumbers {
    fn next_receipt_no(&self) -> String {
        let suffix = rand::thread_rng().gen_range(0..1000);
        format_receipt_no(Local::now().naive_local(), suffix)
    }
}

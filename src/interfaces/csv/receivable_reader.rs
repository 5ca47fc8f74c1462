use crate::domain::receivable::Receivable;
use crate::error::{EmiError, Result};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Read;

/// One row of a receivables CSV file.
///
/// `emi_amount` and `penalty` may be left empty. `created_date` is optional and
/// uses the `YYYY-MM-DDTHH:MM:SS` form.
#[derive(Debug, Deserialize)]
struct ReceivableRecord {
    loan_account_no: String,
    emi_amount: Option<Decimal>,
    penalty: Option<Decimal>,
    total_amount: Decimal,
    created_date: Option<NaiveDateTime>,
}

impl ReceivableRecord {
    fn into_receivable(self, loaded_at: NaiveDateTime) -> Receivable {
        Receivable {
            loan_account_no: self.loan_account_no,
            emi_amount: self.emi_amount,
            penalty: self.penalty,
            total_amount: self.total_amount,
            created_date: self.created_date.unwrap_or(loaded_at),
        }
    }
}

/// Reads receivable snapshots from a CSV source.
///
/// This reader wraps `csv::Reader` and provides an iterator over `Result<Receivable>`.
/// It handles whitespace trimming and flexible record lengths automatically.
pub struct ReceivableReader<R: Read> {
    reader: csv::Reader<R>,
    loaded_at: NaiveDateTime,
}

impl<R: Read> ReceivableReader<R> {
    /// Creates a new `ReceivableReader` from any `Read` source.
    ///
    /// Rows without a `created_date` are stamped with `loaded_at`.
    pub fn new(source: R, loaded_at: NaiveDateTime) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader, loaded_at }
    }

    /// Returns an iterator that lazily reads and deserializes receivables.
    pub fn receivables(self) -> impl Iterator<Item = Result<Receivable>> {
        let loaded_at = self.loaded_at;
        self.reader.into_deserialize().map(move |result| {
            result
                .map(|record: ReceivableRecord| record.into_receivable(loaded_at))
                .map_err(EmiError::from)
        })
    }
}

//! Line-oriented interactive menu over a [`PaymentService`].
//!
//! Errors from the service are printed and the menu continues; only I/O
//! failures on the console streams end the session early.

use crate::application::service::{PaymentOutcome, PaymentService};
use crate::domain::receivable::Receivable;
use crate::error::{EmiError, ErrorKind, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use std::io::{BufRead, Write};
use std::str::FromStr;

/// Formats an amount with exactly two decimals, half-up, `0.00` when missing.
pub fn format_amount(amount: Option<Decimal>) -> String {
    let mut amount = amount
        .unwrap_or(Decimal::ZERO)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    amount.rescale(2);
    amount.to_string()
}

enum MenuChoice {
    MakePayment,
    CheckPendingEmi,
    Exit,
}

impl FromStr for MenuChoice {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(MenuChoice::MakePayment),
            "2" => Ok(MenuChoice::CheckPendingEmi),
            "3" => Ok(MenuChoice::Exit),
            _ => Err(()),
        }
    }
}

pub struct Console<'a, R: BufRead, W: Write> {
    service: &'a PaymentService,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> Console<'a, R, W> {
    pub fn new(service: &'a PaymentService, input: R, output: W) -> Self {
        Self {
            service,
            input,
            output,
        }
    }

    /// Runs the menu until the user exits or input ends.
    pub async fn run(&mut self) -> Result<()> {
        writeln!(self.output, "=== EMI PAYMENT SYSTEM ===")?;
        loop {
            writeln!(self.output)?;
            writeln!(self.output, "1. Make Payment")?;
            writeln!(self.output, "2. Check Pending EMI")?;
            writeln!(self.output, "3. Exit")?;

            let Some(line) = self.prompt("Choose an option (1-3): ")? else {
                break;
            };

            match line.parse::<MenuChoice>() {
                Ok(MenuChoice::MakePayment) => self.make_payment().await?,
                Ok(MenuChoice::CheckPendingEmi) => self.check_pending_emi().await?,
                Ok(MenuChoice::Exit) => break,
                Err(()) => writeln!(self.output, "Invalid option. Please try again.")?,
            }
        }
        writeln!(self.output, "Thank you for using EMI Payment System!")?;
        self.output.flush()?;
        Ok(())
    }

    /// Prints `message` and reads one trimmed line. `None` on end of input.
    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    async fn make_payment(&mut self) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "=== PAYMENT PROCESSING ===")?;
        match self.payment_flow().await {
            Ok(()) => Ok(()),
            Err(e) => self.report(e, "Payment Error"),
        }
    }

    async fn payment_flow(&mut self) -> Result<()> {
        let Some(loan_account_no) = self.prompt("Enter Loan Account Number: ")? else {
            return Ok(());
        };
        let receivable = self
            .service
            .get_pending_emi_details(&loan_account_no)
            .await?;
        self.display_receivable(&receivable)?;

        let Some(amount) = self.prompt("Enter Payment Amount: ")? else {
            return Ok(());
        };
        let amount = if amount.is_empty() {
            None
        } else {
            Some(Decimal::from_str(&amount).map_err(|_| {
                EmiError::InvalidInput(format!("Invalid payment amount: {}", amount))
            })?)
        };

        let Some(mode) = self.prompt("Enter Payment Mode (CASH/CHEQUE/ONLINE): ")? else {
            return Ok(());
        };

        let outcome = self
            .service
            .process_payment(&loan_account_no, amount, &mode)
            .await?;
        self.display_payment(&outcome)
    }

    async fn check_pending_emi(&mut self) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "=== PENDING EMI CHECK ===")?;
        let Some(loan_account_no) = self.prompt("Enter Loan Account Number: ")? else {
            return Ok(());
        };

        let service = self.service;
        let lookup = async {
            let receivable = service.get_pending_emi_details(&loan_account_no).await?;
            let outstanding = service.total_pending_amount(&loan_account_no).await?;
            Ok::<_, EmiError>((receivable, outstanding))
        };

        match lookup.await {
            Ok((receivable, outstanding)) => {
                self.display_receivable(&receivable)?;
                if outstanding != receivable.total_amount {
                    writeln!(
                        self.output,
                        "Outstanding Across All Dues: {}",
                        format_amount(Some(outstanding))
                    )?;
                }
                Ok(())
            }
            Err(e) => self.report(e, "Error"),
        }
    }

    /// Prints a service error; I/O errors are returned to end the session.
    fn report(&mut self, err: EmiError, label: &str) -> Result<()> {
        match err.kind() {
            ErrorKind::InvalidInput | ErrorKind::NotFound => {
                writeln!(self.output, "{}: {}", label, err)?;
            }
            ErrorKind::StorageFailure => {
                writeln!(self.output, "An unexpected error occurred: {}", err)?;
            }
            ErrorKind::Io => return Err(err),
        }
        Ok(())
    }

    fn display_receivable(&mut self, receivable: &Receivable) -> Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "=== PENDING EMI DETAILS ===")?;
        writeln!(
            self.output,
            "Loan Account Number: {}",
            receivable.loan_account_no
        )?;
        writeln!(
            self.output,
            "Pending EMI: {}",
            format_amount(receivable.emi_amount)
        )?;
        writeln!(
            self.output,
            "Penalty Charges: {}",
            format_amount(receivable.penalty)
        )?;
        writeln!(
            self.output,
            "Total Amount: {}",
            format_amount(Some(receivable.total_amount))
        )?;
        Ok(())
    }

    fn display_payment(&mut self, outcome: &PaymentOutcome) -> Result<()> {
        let receipt = &outcome.receipt;
        writeln!(self.output)?;
        writeln!(self.output, "=== PAYMENT SUCCESSFUL ===")?;
        writeln!(self.output, "Receipt No: {}", receipt.receipt_no)?;
        writeln!(
            self.output,
            "Amount Paid: {}",
            format_amount(Some(receipt.paid_amount))
        )?;
        writeln!(self.output, "Payment Mode: {}", receipt.payment_mode)?;
        writeln!(
            self.output,
            "Payment Date: {}",
            receipt.payment_date.format("%Y-%m-%d %H:%M:%S")
        )?;

        writeln!(self.output)?;
        writeln!(self.output, "=== ALLOCATION DETAILS ===")?;
        writeln!(
            self.output,
            "Amount allocated to Penalty: {}",
            format_amount(Some(outcome.allocation.allocated_penalty))
        )?;
        writeln!(
            self.output,
            "Amount allocated to EMI: {}",
            format_amount(Some(outcome.allocation.allocated_emi))
        )?;
        Ok(())
    }
}

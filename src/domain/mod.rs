//! Domain types and rules for EMI payments: receivables, the allocation
//! waterfall, receipts, input validation, and the storage ports the
//! application layer depends on.

pub mod allocation;
pub mod ports;
pub mod receipt;
pub mod receivable;
pub mod validation;

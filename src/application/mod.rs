//! Application layer containing the payment workflow orchestration.
//!
//! This module defines the `PaymentService` which acts as the primary entry point
//! for pending-dues lookups, allocation previews and payment processing. Stores are
//! injected at construction, and payments on the same loan account are serialized
//! through per-account locks so the service can be shared across `tokio` tasks.

pub mod locks;
pub mod policy;
pub mod service;

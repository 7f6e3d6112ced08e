//! Core Kernel - Foundational types for the claims system
//!
//! This crate provides the building blocks shared by every other crate:
//! - Typed integer identifiers for claims and invoices
//! - Non-negative two-place decimal amounts
//! - Port error and marker traits for the ports-and-adapters layout

pub mod amount;
pub mod identifiers;
pub mod error;
pub mod ports;

pub use amount::{Amount, AmountError, AMOUNT_SCALE};
pub use identifiers::{ClaimId, InvoiceId};
pub use error::CoreError;
pub use ports::{
    PortError, DomainPort, AdapterHealth, HealthCheckResult, HealthCheckable,
};

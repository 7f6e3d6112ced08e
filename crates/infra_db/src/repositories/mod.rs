//! Repository implementations for domain entities
//!
//! Repositories encapsulate SQL queries and map between database rows and
//! domain types. Writes to versioned tables use optimistic concurrency
//! control.

pub mod claims;

pub use claims::{ClaimRow, ClaimsRepository, InvoiceRow};

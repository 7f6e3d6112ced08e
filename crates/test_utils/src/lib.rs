//! Test Utilities Crate
//!
//! Shared test infrastructure, fixtures, and helpers for the claims test
//! suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built actors, timestamps and uploads
//! - `builders`: Builder patterns for submissions, claims and multipart bodies
//! - `assertions`: Assertion helpers for claim state
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;

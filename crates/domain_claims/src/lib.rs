//! Lecturer Claims Domain
//!
//! This crate implements the claim workflow for academic staff: lecturers
//! submit hours-worked claims with supporting documents, managers and
//! coordinators review them, and HR generates invoices for approved claims.
//!
//! # Claim Lifecycle
//!
//! ```text
//! Pending -> Approved -> Invoice Generated -> Paid
//!         -> Rejected
//! ```
//!
//! Every operation goes through [`ClaimWorkflow`], which gates it on the
//! caller's [`Role`]s and persists through the [`ClaimStore`] port.

pub mod access;
pub mod attachment;
pub mod claim;
pub mod error;
pub mod invoice;
pub mod ports;
pub mod submission;
pub mod workflow;

pub use access::{allowed, Actor, Operation, Principal, Role};
pub use attachment::{Attachment, AttachmentError, AttachmentPolicy, MAX_ATTACHMENT_BYTES};
pub use claim::{Claim, ClaimState, ClaimStatus, NewClaim};
pub use error::ClaimError;
pub use invoice::{Invoice, NewInvoice};
pub use ports::{AttachmentStorage, ClaimQuery, ClaimStore};
pub use submission::{ClaimEdit, ClaimFields, ClaimSubmission, FieldError, Upload};
pub use workflow::{ClaimWorkflow, Clock};

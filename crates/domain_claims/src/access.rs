//! Role-based access to workflow operations
//!
//! Authorization is a single capability table, [`allowed`], consulted before
//! any store access. Callers identify themselves through [`Principal`], which
//! the HTTP layer implements for its token claims.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles a user can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Submits and maintains their own claims
    Lecturer,
    /// Reviews claims
    Manager,
    /// Reviews claims
    Coordinator,
    /// Generates invoices for approved claims
    #[serde(rename = "HR")]
    Hr,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Lecturer, Role::Manager, Role::Coordinator, Role::Hr];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Lecturer => "Lecturer",
            Role::Manager => "Manager",
            Role::Coordinator => "Coordinator",
            Role::Hr => "HR",
        }
    }

    /// Managers and coordinators
    pub fn is_reviewer(&self) -> bool {
        matches!(self, Role::Manager | Role::Coordinator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown role: {s}"))
    }
}

/// Workflow operations subject to authorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Submit,
    ListOwn,
    Edit,
    Delete,
    ViewDetails,
    ListPending,
    ListHistory,
    Approve,
    Reject,
    ListApprovedUninvoiced,
    GenerateInvoice,
    ListGeneratedInvoices,
    ViewInvoice,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Submit => "submit claims",
            Operation::ListOwn => "list own claims",
            Operation::Edit => "edit claims",
            Operation::Delete => "delete claims",
            Operation::ViewDetails => "view claim details",
            Operation::ListPending => "list pending claims",
            Operation::ListHistory => "list claim history",
            Operation::Approve => "approve claims",
            Operation::Reject => "reject claims",
            Operation::ListApprovedUninvoiced => "list approved claims",
            Operation::GenerateInvoice => "generate invoices",
            Operation::ListGeneratedInvoices => "list generated invoices",
            Operation::ViewInvoice => "view invoices",
        };
        f.write_str(name)
    }
}

/// Whether `role` may perform `operation`
pub fn allowed(role: Role, operation: Operation) -> bool {
    use Operation::*;
    match role {
        Role::Lecturer => matches!(operation, Submit | ListOwn | Edit | Delete | ViewDetails),
        Role::Manager | Role::Coordinator => matches!(
            operation,
            ListPending | ListHistory | Approve | Reject | ViewDetails
        ),
        Role::Hr => matches!(
            operation,
            ListApprovedUninvoiced | GenerateInvoice | ListGeneratedInvoices | ViewInvoice | ViewDetails
        ),
    }
}

/// The authenticated caller of a workflow operation
pub trait Principal: Send + Sync {
    /// Stable identity string (the user's email)
    fn identity(&self) -> &str;

    fn has_role(&self, role: Role) -> bool;

    /// True if any held role grants `operation`
    fn may(&self, operation: Operation) -> bool {
        Role::ALL
            .into_iter()
            .any(|role| self.has_role(role) && allowed(role, operation))
    }
}

/// A plain in-process principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    identity: String,
    roles: Vec<Role>,
}

impl Actor {
    pub fn new(identity: impl Into<String>, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            identity: identity.into(),
            roles: roles.into_iter().collect(),
        }
    }

    pub fn lecturer(identity: impl Into<String>) -> Self {
        Self::new(identity, [Role::Lecturer])
    }

    pub fn manager(identity: impl Into<String>) -> Self {
        Self::new(identity, [Role::Manager])
    }

    pub fn coordinator(identity: impl Into<String>) -> Self {
        Self::new(identity, [Role::Coordinator])
    }

    pub fn hr(identity: impl Into<String>) -> Self {
        Self::new(identity, [Role::Hr])
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }
}

impl Principal for Actor {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

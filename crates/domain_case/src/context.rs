//! Request context
//!
//! Every handler call receives the acting user, their role and the
//! branches they may act on. The context is built at the edge (from a
//! verified token) and passed explicitly.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use core_kernel::{BranchId, OperationMetadata, UserId};

use crate::error::CaseError;

/// Staff roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Organisation-wide administrator
    Admin,
    /// Runs one or more branches
    Manager,
    /// Front-desk staff
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Staff => "staff",
        }
    }
}

impl FromStr for Role {
    type Err = CaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "staff" => Ok(Role::Staff),
            other => Err(CaseError::validation_field(format!("Unknown role: {}", other), "role")),
        }
    }
}

/// Branches an actor may access
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "branches", rename_all = "snake_case")]
pub enum BranchScope {
    All,
    Only(Vec<BranchId>),
}

impl BranchScope {
    pub fn allows(&self, branch: BranchId) -> bool {
        match self {
            BranchScope::All => true,
            BranchScope::Only(branches) => branches.contains(&branch),
        }
    }
}

/// Who is acting, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub actor: UserId,
    pub role: Role,
    pub scope: BranchScope,
    pub metadata: OperationMetadata,
}

impl RequestContext {
    pub fn new(actor: UserId, role: Role, scope: BranchScope) -> Self {
        Self {
            actor,
            role,
            scope,
            metadata: OperationMetadata::default(),
        }
    }

    /// Context for an administrator with access to every branch
    pub fn admin(actor: UserId) -> Self {
        Self::new(actor, Role::Admin, BranchScope::All)
    }

    /// Context for staff limited to a single branch
    pub fn staff(actor: UserId, branch: BranchId) -> Self {
        Self::new(actor, Role::Staff, BranchScope::Only(vec![branch]))
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.metadata.correlation_id = Some(correlation_id.into());
        self
    }

    pub fn can_access(&self, branch: BranchId) -> bool {
        self.role == Role::Admin || self.scope.allows(branch)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins and managers may change branch settings
    pub fn can_manage_settings(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Manager)
    }
}

//! FILENAME: container-scope/src/container.rs
//! Container records and the external capabilities the resolver consumes.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ============================================================================
// IDENTIFIERS
// ============================================================================

/// Opaque identifier of a tenant boundary.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(String);

impl ContainerId {
    pub fn new(id: impl Into<String>) -> Self {
        ContainerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContainerId {
    fn from(value: &str) -> Self {
        ContainerId::new(value)
    }
}

impl From<String> for ContainerId {
    fn from(value: String) -> Self {
        ContainerId(value)
    }
}

// ============================================================================
// RECORDS
// ============================================================================

/// Kind of a tenant boundary. Workbooks are lightweight, usually ephemeral
/// containers and never take part in scope enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerKind {
    Normal,
    Workbook,
}

/// A live container as reported by the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    pub id: ContainerId,
    pub kind: ContainerKind,
    /// Project the container lives under. A project is its own project.
    pub project: ContainerId,
}

impl ContainerRecord {
    pub fn new(id: impl Into<ContainerId>, kind: ContainerKind, project: impl Into<ContainerId>) -> Self {
        ContainerRecord {
            id: id.into(),
            kind,
            project: project.into(),
        }
    }

    pub fn is_workbook(&self) -> bool {
        self.kind == ContainerKind::Workbook
    }
}

// ============================================================================
// PRINCIPALS AND PERMISSIONS
// ============================================================================

/// The requesting user together with any contextual roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    #[serde(default)]
    pub roles: BTreeSet<String>,
}

impl Principal {
    pub fn new(user_id: impl Into<String>) -> Self {
        Principal {
            user_id: user_id.into(),
            roles: BTreeSet::new(),
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }
}

/// Permission class a scope is being computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PermissionClass {
    #[default]
    Read,
    Insert,
    Update,
    Delete,
    Admin,
}

// ============================================================================
// COLLABORATORS
// ============================================================================

/// Directory of live containers.
pub trait ContainerDirectory {
    /// Looks up a container; `None` when it does not exist (e.g. deleted).
    fn resolve(&self, id: &ContainerId) -> Option<ContainerRecord>;

    /// Direct children of a container.
    fn children(&self, id: &ContainerId) -> Vec<ContainerRecord>;
}

/// Externally supplied permission predicate.
pub trait PermissionCheck {
    fn can_access(&self, container: &ContainerRecord, principal: &Principal, permission: PermissionClass) -> bool;
}

impl<F> PermissionCheck for F
where
    F: Fn(&ContainerRecord, &Principal, PermissionClass) -> bool,
{
    fn can_access(&self, container: &ContainerRecord, principal: &Principal, permission: PermissionClass) -> bool {
        self(container, principal, permission)
    }
}

//! FILENAME: container-scope/src/lib.rs
//! Container scope subsystem.
//!
//! Computes which tenant boundaries ("containers") a request may read from.
//! The crate owns no policy: container lookup and permission checks are
//! supplied by the caller through the `ContainerDirectory` and
//! `PermissionCheck` traits.
//!
//! Layers:
//! - `container`: Identifiers, records, principals and collaborator traits
//! - `resolver`: Scope requests and the resolution algorithm

pub mod container;
pub mod resolver;


pub use container::*;
pub use resolver::{
    resolve_scope, ContainerScope, ScopeContext, ScopeExclusions, ScopeRequest, ScopeRule,
};

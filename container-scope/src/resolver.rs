//! FILENAME: container-scope/src/resolver.rs
//! Scope Resolver - turns a scope request into the set of readable containers.
//!
//! Algorithm:
//! 1. Collect candidates: the explicit list as given, or an enumeration of
//!    the project (or current container) and all of its descendants
//! 2. Drop candidates that do not resolve to a live container
//! 3. Drop workbook containers
//! 4. Drop containers the permission predicate rejects
//!
//! Nothing in here fails: every exclusion is counted and logged, and the
//! caller always receives a (possibly empty) scope.

use std::collections::{BTreeSet, VecDeque};

use log::{debug, info};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::container::{
    ContainerDirectory, ContainerId, ContainerRecord, PermissionCheck, PermissionClass, Principal,
};

// ============================================================================
// REQUEST
// ============================================================================

/// How the candidate containers are chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScopeRequest {
    /// Exactly these containers, minus the ones that fail the checks.
    ExplicitList(Vec<ContainerId>),
    /// Every container under the current container's project.
    AllInProject,
    /// The current container and everything below it.
    CurrentAndSubfolders,
}

impl ScopeRequest {
    /// Explicit list when one was supplied, whole-project enumeration otherwise.
    pub fn from_explicit(ids: Option<Vec<ContainerId>>) -> Self {
        match ids {
            Some(ids) => ScopeRequest::ExplicitList(ids),
            None => ScopeRequest::AllInProject,
        }
    }

    pub fn rule(&self) -> ScopeRule {
        match self {
            ScopeRequest::ExplicitList(_) => ScopeRule::ExplicitList,
            ScopeRequest::AllInProject => ScopeRule::AllInProject,
            ScopeRequest::CurrentAndSubfolders => ScopeRule::CurrentAndSubfolders,
        }
    }
}

/// Who is asking, from where, and for what.
#[derive(Debug, Clone, Copy)]
pub struct ScopeContext<'a> {
    pub current: &'a ContainerId,
    pub principal: &'a Principal,
    pub permission: PermissionClass,
}

// ============================================================================
// RESULT
// ============================================================================

/// The rule that produced a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeRule {
    ExplicitList,
    AllInProject,
    CurrentAndSubfolders,
}

/// Counts of candidates dropped, by cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeExclusions {
    pub unresolved: usize,
    pub workbook: usize,
    pub denied: usize,
}

impl ScopeExclusions {
    pub fn total(&self) -> usize {
        self.unresolved + self.workbook + self.denied
    }
}

/// The containers a request may see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerScope {
    pub rule: ScopeRule,
    pub containers: BTreeSet<ContainerId>,
    pub excluded: ScopeExclusions,
}

impl ContainerScope {
    fn empty(rule: ScopeRule) -> Self {
        ContainerScope {
            rule,
            containers: BTreeSet::new(),
            excluded: ScopeExclusions::default(),
        }
    }

    pub fn contains(&self, id: &ContainerId) -> bool {
        self.containers.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContainerId> {
        self.containers.iter()
    }

    /// Applies workbook exclusion and the permission predicate to one live record.
    fn admit<P>(&mut self, record: &ContainerRecord, permissions: &P, ctx: &ScopeContext<'_>)
    where
        P: PermissionCheck + ?Sized,
    {
        if record.is_workbook() {
            debug!("scope: excluding workbook container {}", record.id);
            self.excluded.workbook += 1;
            return;
        }
        if !permissions.can_access(record, ctx.principal, ctx.permission) {
            debug!(
                "scope: {:?} denied on container {} for user {}",
                ctx.permission, record.id, ctx.principal.user_id
            );
            self.excluded.denied += 1;
            return;
        }
        self.containers.insert(record.id.clone());
    }
}

// ============================================================================
// RESOLUTION
// ============================================================================

/// Resolves a scope request into the set of containers the principal may read.
pub fn resolve_scope<D, P>(
    directory: &D,
    permissions: &P,
    ctx: &ScopeContext<'_>,
    request: &ScopeRequest,
) -> ContainerScope
where
    D: ContainerDirectory + ?Sized,
    P: PermissionCheck + ?Sized,
{
    let scope = match request {
        ScopeRequest::ExplicitList(ids) => resolve_explicit(directory, permissions, ctx, ids),
        ScopeRequest::AllInProject => {
            let root = directory.resolve(ctx.current).map(|current| current.project);
            resolve_subtree(directory, permissions, ctx, root.as_ref(), ScopeRule::AllInProject)
        }
        ScopeRequest::CurrentAndSubfolders => resolve_subtree(
            directory,
            permissions,
            ctx,
            Some(ctx.current),
            ScopeRule::CurrentAndSubfolders,
        ),
    };

    info!(
        "scope: {:?} for user {} from {} -> {} container(s), {} excluded",
        scope.rule,
        ctx.principal.user_id,
        ctx.current,
        scope.len(),
        scope.excluded.total()
    );
    scope
}

fn resolve_explicit<D, P>(
    directory: &D,
    permissions: &P,
    ctx: &ScopeContext<'_>,
    ids: &[ContainerId],
) -> ContainerScope
where
    D: ContainerDirectory + ?Sized,
    P: PermissionCheck + ?Sized,
{
    let mut scope = ContainerScope::empty(ScopeRule::ExplicitList);
    let mut seen: FxHashSet<&ContainerId> = FxHashSet::default();

    for id in ids {
        if !seen.insert(id) {
            continue;
        }
        match directory.resolve(id) {
            Some(record) => scope.admit(&record, permissions, ctx),
            None => {
                debug!("scope: container {} does not resolve", id);
                scope.excluded.unresolved += 1;
            }
        }
    }
    scope
}

/// Breadth-first walk from `root`. Workbook subtrees are not entered; denied
/// containers are still walked since access to a child does not depend on
/// access to its parent.
fn resolve_subtree<D, P>(
    directory: &D,
    permissions: &P,
    ctx: &ScopeContext<'_>,
    root: Option<&ContainerId>,
    rule: ScopeRule,
) -> ContainerScope
where
    D: ContainerDirectory + ?Sized,
    P: PermissionCheck + ?Sized,
{
    let mut scope = ContainerScope::empty(rule);

    let Some(root) = root.and_then(|id| directory.resolve(id)) else {
        debug!("scope: starting container for {} does not resolve", ctx.current);
        scope.excluded.unresolved += 1;
        return scope;
    };

    let mut visited: FxHashSet<ContainerId> = FxHashSet::default();
    let mut queue = VecDeque::from([root]);

    while let Some(record) = queue.pop_front() {
        if !visited.insert(record.id.clone()) {
            continue;
        }
        scope.admit(&record, permissions, ctx);
        if record.is_workbook() {
            continue;
        }
        queue.extend(
            directory
                .children(&record.id)
                .into_iter()
                .filter(|child| !visited.contains(&child.id)),
        );
    }
    scope
}

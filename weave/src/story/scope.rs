use std::collections::BTreeMap;
use std::ops::Range;

use runtime::ContainerId;

use crate::story::ScopeKind;
use crate::weave::resolve::{NamedContent, ScopeLookup};
use crate::weave::{WeaveArena, WeaveId, WeavePointLocation};

/// Handle to a [`Scope`] inside a [`ScopeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

/// A compiled story, knot or stitch.
#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    /// `None` for the story itself.
    pub name: Option<String>,
    pub span: Range<usize>,
    pub parent: Option<ScopeId>,
    /// The outermost block of the scope's content.
    pub weave: WeaveId,
    /// The emitted container of that block.
    pub container: ContainerId,
    sub_scopes: BTreeMap<String, ScopeId>,
}

impl Scope {
    /// "knot 'forest'", "the story", and so on, for messages.
    pub fn describe(&self) -> String {
        match &self.name {
            Some(name) => format!("{} '{}'", self.kind.to_string().to_lowercase(), name),
            None => "the story".to_string(),
        }
    }
}

/// Something a dotted divert address can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Scope(ScopeId),
    WeavePoint(WeavePointLocation),
}

/// Every scope of one compile, in creation order (story first).
#[derive(Debug, Default)]
pub struct ScopeTable {
    scopes: Vec<Scope>,
}

impl ScopeTable {
    pub fn add(
        &mut self,
        kind: ScopeKind,
        name: Option<String>,
        span: Range<usize>,
        parent: Option<ScopeId>,
        weave: WeaveId,
        container: ContainerId,
    ) -> ScopeId {
        let id = ScopeId(self.scopes.len());

        if let (Some(parent), Some(name)) = (parent, &name) {
            if let Some(parent) = self.scopes.get_mut(parent.0) {
                parent.sub_scopes.entry(name.clone()).or_insert(id);
            }
        }

        self.scopes.push(Scope {
            kind,
            name,
            span,
            parent,
            weave,
            container,
            sub_scopes: BTreeMap::new(),
        });
        id
    }

    pub fn get(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(i, scope)| (ScopeId(i), scope))
    }

    pub fn sub_scope(&self, id: ScopeId, name: &str) -> Option<ScopeId> {
        self.get(id)?.sub_scopes.get(name).copied()
    }

    /// `id` followed by each enclosing scope, ending with the story.
    pub fn ancestry(&self, id: ScopeId) -> Vec<ScopeId> {
        let mut out = Vec::new();
        let mut current = Some(id);
        while let Some(scope_id) = current {
            let Some(scope) = self.get(scope_id) else {
                break;
            };
            out.push(scope_id);
            current = scope.parent;
        }
        out
    }

    /// Resolve an author-written address as seen from `from`.
    ///
    /// The first component is searched for in `from` and then each enclosing
    /// scope: labels first, then sub-scopes, then the scope's own name. Each
    /// further component must be a sub-scope or a label of the scope named
    /// by the previous one.
    pub fn resolve_target(
        &self,
        arena: &WeaveArena,
        from: ScopeId,
        target: &str,
    ) -> Option<Resolved> {
        let mut parts = target.split('.');
        let first = parts.next().filter(|part| !part.is_empty())?;

        let mut current = self
            .ancestry(from)
            .into_iter()
            .find_map(|scope| self.lookup_at_level(arena, scope, first))?;

        for part in parts {
            let Resolved::Scope(scope) = current else {
                return None;
            };
            current = self.lookup_child(arena, scope, part)?;
        }

        Some(current)
    }

    /// The container a resolved address points at.
    pub fn container_of(&self, arena: &WeaveArena, resolved: Resolved) -> Option<ContainerId> {
        match resolved {
            Resolved::Scope(scope) => Some(self.get(scope)?.container),
            Resolved::WeavePoint(location) => arena
                .weave_point_runtime(location)
                .ok()
                .map(|runtime| runtime.container),
        }
    }

    fn lookup_at_level(&self, arena: &WeaveArena, id: ScopeId, name: &str) -> Option<Resolved> {
        if let Some(found) = self.lookup_child(arena, id, name) {
            return Some(found);
        }
        let scope = self.get(id)?;
        (scope.name.as_deref() == Some(name)).then_some(Resolved::Scope(id))
    }

    fn lookup_child(&self, arena: &WeaveArena, id: ScopeId, name: &str) -> Option<Resolved> {
        let scope = self.get(id)?;
        if let Ok(Some(location)) = arena.weave_point_named(scope.weave, name) {
            return Some(Resolved::WeavePoint(location));
        }
        scope.sub_scopes.get(name).map(|sub| Resolved::Scope(*sub))
    }
}

/// A scope as seen by the naming-collision check.
pub struct ScopeView<'a> {
    pub table: &'a ScopeTable,
    pub arena: &'a WeaveArena,
    pub scope: ScopeId,
}

impl ScopeLookup for ScopeView<'_> {
    /// The scope itself, one of its labels, or one of its direct
    /// sub-scopes. Does not search inside sub-scopes.
    fn content_with_name_at_level(&self, name: &str) -> Option<NamedContent> {
        let scope = self.table.get(self.scope)?;

        if scope.name.as_deref() == Some(name) {
            return Some(NamedContent {
                kind: scope.kind.to_string(),
                span: scope.span.clone(),
                weave_point: None,
            });
        }

        if let Ok(Some(location)) = self.arena.weave_point_named(scope.weave, name) {
            if let Ok(point) = self.arena.weave_point(location) {
                return Some(NamedContent {
                    kind: point.kind().to_string(),
                    span: point.span(),
                    weave_point: Some(location),
                });
            }
        }

        let sub = self.table.get(*scope.sub_scopes.get(name)?)?;
        Some(NamedContent {
            kind: sub.kind.to_string(),
            span: sub.span.clone(),
            weave_point: None,
        })
    }
}

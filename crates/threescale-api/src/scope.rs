use std::fmt;

use crate::entity::EntityId;
use crate::kind::ResourceKind;

/// Ancestor ids a scoped manager is bound to, outermost first.
///
/// `accounts/3/applications/9/keys` is the scope
/// `[(Account, 3), (Application, 9)]`. Scopes hold ids only, never
/// resources, so a child manager never keeps its parent alive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scope {
    entries: Vec<(ResourceKind, EntityId)>,
}

impl Scope {
    /// The empty scope used by top-level managers.
    pub fn root() -> Self {
        Self::default()
    }

    /// Extend the scope with one more ancestor.
    pub fn with(mut self, kind: ResourceKind, id: impl Into<EntityId>) -> Self {
        self.entries.push((kind, id.into()));
        self
    }

    pub fn is_root(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(ResourceKind, EntityId)] {
        &self.entries
    }

    /// Id of the innermost ancestor of the given kind.
    pub fn id_of(&self, kind: ResourceKind) -> Option<&EntityId> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| *k == kind)
            .map(|(_, id)| id)
    }

    /// Id of the innermost ancestor whose kind is any of `kinds`.
    pub fn last_of(&self, kinds: &[ResourceKind]) -> Option<&EntityId> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| kinds.contains(k))
            .map(|(_, id)| id)
    }

    /// Split at the innermost ancestor of `kind`: the scope that ancestor
    /// lives in, and its id.
    pub fn split_at(&self, kind: ResourceKind) -> Option<(Scope, EntityId)> {
        let pos = self.entries.iter().rposition(|(k, _)| *k == kind)?;
        let (outer, rest) = self.entries.split_at(pos);
        let (_, id) = rest.first()?;
        Some((
            Scope {
                entries: outer.to_vec(),
            },
            id.clone(),
        ))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("/");
        }
        for (kind, id) in &self.entries {
            write!(f, "/{kind}/{}", id.path_segment())?;
        }
        Ok(())
    }
}

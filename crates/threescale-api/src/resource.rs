use std::cell::{Ref, RefCell};
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::entity::{Entity, EntityId};
use crate::error::Error;
use crate::kind::ResourceKind;
use crate::manager::{Manager, NAME_FIELDS};
use crate::resources::Kind;
use crate::scope::Scope;
use crate::transport::Transport;

/// Handle to one remote entity.
///
/// Holds an optional id, an optional cached entity and the manager that
/// produced it. A handle built with [`Manager::prepare`] fetches on first
/// attribute access and caches the result; [`read`](Self::read) forces a
/// re-fetch.
///
/// The cache is a `RefCell`, so a handle is `Send` but not `Sync`: moving it
/// to another thread is fine, sharing one handle between threads is not.
pub struct Resource {
    manager: Manager,
    id: Option<EntityId>,
    entity: RefCell<Option<Entity>>,
}

impl Resource {
    pub(crate) fn loaded(manager: Manager, id: Option<EntityId>, entity: Entity) -> Self {
        Self {
            manager,
            id,
            entity: RefCell::new(Some(entity)),
        }
    }

    pub(crate) fn unfetched(manager: Manager, id: EntityId) -> Self {
        Self {
            manager,
            id: Some(id),
            entity: RefCell::new(None),
        }
    }

    // ── Identity ─────────────────────────────────────────────────────

    pub fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }

    pub fn kind(&self) -> ResourceKind {
        self.manager.kind()
    }

    /// The (untyped) manager that produced this handle.
    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        self.manager.transport()
    }

    // ── Attributes ───────────────────────────────────────────────────

    /// The entity, fetched on first access.
    pub fn entity(&self) -> Result<Ref<'_, Entity>, Error> {
        if !self.is_loaded() {
            let fetched = self.manager.fetch_entity(self.id.as_ref())?;
            debug!(resource = %self.kind(), id = ?self.id, "lazy fetch");
            *self.entity.borrow_mut() = Some(fetched);
        }
        Ref::filter_map(self.entity.borrow(), Option::as_ref).map_err(|_| Error::MissingId {
            kind: self.kind(),
        })
    }

    /// The entity if it has already been fetched; never touches the network.
    pub fn cached(&self) -> Option<Ref<'_, Entity>> {
        Ref::filter_map(self.entity.borrow(), Option::as_ref).ok()
    }

    pub fn is_loaded(&self) -> bool {
        self.entity.borrow().is_some()
    }

    pub fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        Ok(self.entity()?.get(key).cloned())
    }

    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, Error> {
        self.entity()?.get_as(key)
    }

    /// First name-like attribute the entity carries.
    pub fn name(&self) -> Result<Option<String>, Error> {
        let entity = self.entity()?;
        Ok(NAME_FIELDS
            .iter()
            .find_map(|field| entity.str(field))
            .map(str::to_owned))
    }

    /// Typed view of the whole entity.
    pub fn view<T: DeserializeOwned>(&self) -> Result<T, Error> {
        self.entity()?.view()
    }

    /// Owned copy of the entity.
    pub fn to_entity(&self) -> Result<Entity, Error> {
        Ok(self.entity()?.clone())
    }

    /// Write an attribute into the cached entity. Nothing is sent until
    /// [`update`](Self::update).
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<(), Error> {
        self.ensure_loaded()?;
        if let Some(entity) = self.entity.get_mut() {
            entity.set(key, value);
        }
        Ok(())
    }

    fn ensure_loaded(&mut self) -> Result<(), Error> {
        if self.entity.get_mut().is_none() {
            let fetched = self.manager.fetch_entity(self.id.as_ref())?;
            *self.entity.get_mut() = Some(fetched);
        }
        Ok(())
    }

    // ── Delegated operations ─────────────────────────────────────────

    /// Send the cached attributes back through the manager.
    pub fn update(&self) -> Result<Resource, Error> {
        let entity = self.to_entity()?;
        self.manager.update(&entity, self.id.as_ref())
    }

    /// Delete the remote entity. `Ok(false)` when this handle has no id.
    ///
    /// The handle stays usable; its cache still holds the last known state.
    pub fn delete(&self) -> Result<bool, Error> {
        match &self.id {
            Some(id) => self.manager.delete(id, None),
            None => Ok(false),
        }
    }

    /// Re-fetch the entity, replacing the cache.
    pub fn read(&mut self) -> Result<&Entity, Error> {
        let fetched = self.manager.fetch_entity(self.id.as_ref())?;
        Ok(&*self.entity.get_mut().insert(fetched))
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Scope for managers of this resource's children.
    pub fn child_scope(&self) -> Result<Scope, Error> {
        let id = self.id.clone().ok_or(Error::MissingId { kind: self.kind() })?;
        Ok(self.manager.scope().clone().with(self.kind(), id))
    }

    /// Manager of kind `C` scoped to this resource.
    pub fn manager_instance<C: Kind>(&self) -> Result<Manager<C>, Error> {
        Manager::<C>::new(Arc::clone(self.transport()), self.child_scope()?)
    }

    /// Unfetched handle to the nearest ancestor of `kind`.
    pub fn parent(&self, kind: ResourceKind) -> Result<Resource, Error> {
        let (outer, id) = self
            .manager
            .scope()
            .split_at(kind)
            .ok_or(Error::MissingScope {
                kind: self.kind(),
                parent: kind,
            })?;
        Ok(Manager::for_kind(Arc::clone(self.transport()), kind, outer)?.prepare(id))
    }
}

impl Clone for Resource {
    fn clone(&self) -> Self {
        Self {
            manager: self.manager.clone(),
            id: self.id.clone(),
            entity: RefCell::new(self.entity.borrow().clone()),
        }
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Resource");
        s.field("kind", &self.kind()).field("id", &self.id);
        match self.entity.try_borrow() {
            Ok(entity) => s.field("entity", &*entity),
            Err(_) => s.field("entity", &"<borrowed>"),
        };
        s.finish()
    }
}

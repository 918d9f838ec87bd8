// Generic resource manager
//
// One `Manager` serves every resource kind: the kind registry supplies the
// envelope keys, path template and read strategy, and the type parameter
// only decides which handle type results are wrapped in.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::entity::{Entity, EntityId};
use crate::envelope::{self, Extracted};
use crate::error::Error;
use crate::kind::{ReadStrategy, ResourceKind};
use crate::resource::Resource;
use crate::resources::{Kind, RootKind};
use crate::scope::Scope;
use crate::transport::{Body, Params, Request, Transport, TransportExt};

/// Name-like attributes matched by [`Manager::read_by_name`], highest
/// priority first.
pub const NAME_FIELDS: [&str; 6] = [
    "system_name",
    "name",
    "org_name",
    "friendly_name",
    "username",
    "pattern",
];

#[derive(Clone)]
struct ManagerCore {
    transport: Arc<dyn Transport>,
    kind: ResourceKind,
    entity_key: String,
    collection_key: String,
    base_path: String,
    scope: Scope,
    defaults: Entity,
}

/// CRUD operations for one resource kind within one scope.
///
/// Holds configuration only and is cheap to clone. `R` is the handle type
/// results are wrapped in; `Manager<Resource>` is the untyped form every
/// handle keeps a reference to.
pub struct Manager<R = Resource> {
    core: Arc<ManagerCore>,
    _handle: PhantomData<fn() -> R>,
}

impl<R> Clone for Manager<R> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
            _handle: PhantomData,
        }
    }
}

impl<R> fmt::Debug for Manager<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Manager")
            .field("kind", &self.core.kind)
            .field("base_path", &self.core.base_path)
            .field("entity_key", &self.core.entity_key)
            .field("collection_key", &self.core.collection_key)
            .finish_non_exhaustive()
    }
}

// ── Construction ────────────────────────────────────────────────────

impl Manager<Resource> {
    /// Untyped manager for `kind` within `scope`.
    pub fn for_kind(
        transport: Arc<dyn Transport>,
        kind: ResourceKind,
        scope: Scope,
    ) -> Result<Self, Error> {
        let base_path = kind.base_path(&scope)?;
        Ok(Self::from_core(ManagerCore {
            transport,
            kind,
            entity_key: kind.entity_key().to_owned(),
            collection_key: kind.collection_key().to_owned(),
            base_path,
            scope,
            defaults: Entity::new(),
        }))
    }

    /// Manager for an endpoint outside the registry's path layout.
    ///
    /// The collection key defaults to `entity_key + "s"`.
    pub fn custom(
        transport: Arc<dyn Transport>,
        kind: ResourceKind,
        entity_key: &str,
        collection_key: Option<&str>,
        base_path: impl Into<String>,
    ) -> Self {
        Self::from_core(ManagerCore {
            transport,
            kind,
            entity_key: entity_key.to_owned(),
            collection_key: collection_key
                .map_or_else(|| format!("{entity_key}s"), str::to_owned),
            base_path: base_path.into(),
            scope: Scope::root(),
            defaults: Entity::new(),
        })
    }
}

impl<R: Kind> Manager<R> {
    /// Typed manager for `R` within `scope`.
    pub fn new(transport: Arc<dyn Transport>, scope: Scope) -> Result<Self, Error> {
        Manager::<Resource>::for_kind(transport, R::KIND, scope).map(|m| m.retype())
    }
}

impl<R: RootKind> Manager<R> {
    /// Typed manager for a kind that needs no ancestor ids.
    pub fn root(transport: Arc<dyn Transport>) -> Self {
        Self::from_core(ManagerCore {
            transport,
            kind: R::KIND,
            entity_key: R::KIND.entity_key().to_owned(),
            collection_key: R::KIND.collection_key().to_owned(),
            base_path: R::KIND.literal_path(),
            scope: Scope::root(),
            defaults: Entity::new(),
        })
    }
}

impl<R> Manager<R> {
    fn from_core(core: ManagerCore) -> Self {
        Self {
            core: Arc::new(core),
            _handle: PhantomData,
        }
    }

    pub(crate) fn retype<S>(&self) -> Manager<S> {
        Manager {
            core: Arc::clone(&self.core),
            _handle: PhantomData,
        }
    }

    /// The same manager, producing untyped [`Resource`] handles.
    pub fn untyped(&self) -> Manager<Resource> {
        self.retype()
    }

    /// Attributes merged into every create and update body where the caller
    /// left them unset.
    pub fn with_defaults(mut self, defaults: Entity) -> Self {
        Arc::make_mut(&mut self.core).defaults = defaults;
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn kind(&self) -> ResourceKind {
        self.core.kind
    }

    pub fn entity_key(&self) -> &str {
        &self.core.entity_key
    }

    pub fn collection_key(&self) -> &str {
        &self.core.collection_key
    }

    pub fn base_path(&self) -> &str {
        &self.core.base_path
    }

    pub fn scope(&self) -> &Scope {
        &self.core.scope
    }

    pub fn defaults(&self) -> &Entity {
        &self.core.defaults
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.core.transport
    }

    pub(crate) fn entity_path(&self, id: &EntityId) -> String {
        format!("{}/{}", self.core.base_path, id.path_segment())
    }

    // ── Extraction ───────────────────────────────────────────────────

    /// Single entity from a body, `None` when the body is empty.
    pub(crate) fn extract_entity(&self, body: Option<Value>) -> Result<Option<Entity>, Error> {
        if let Some(raw) = &body {
            envelope::check_response(raw)?;
        }
        match envelope::extract(body, &self.core.entity_key, None)? {
            Extracted::Single(value) => {
                envelope::check_response(&value)?;
                Entity::from_value(value).map(Some)
            }
            Extracted::Empty => Ok(None),
            Extracted::Collection(_) => Err(Error::UnrecognizedResponse {
                message: format!("expected one {}, got a sequence", self.core.kind),
            }),
        }
    }

    pub(crate) fn expect_entity(&self, body: Option<Value>) -> Result<Entity, Error> {
        self.extract_entity(body)?
            .ok_or_else(|| Error::UnrecognizedResponse {
                message: format!("empty response where a {} was expected", self.core.kind),
            })
    }

    pub(crate) fn extract_entities(&self, body: Option<Value>) -> Result<Vec<Entity>, Error> {
        if let Some(raw) = &body {
            envelope::check_response(raw)?;
        }
        match envelope::extract(body, &self.core.entity_key, Some(&self.core.collection_key))? {
            Extracted::Collection(items) => items.into_iter().map(Entity::from_value).collect(),
            Extracted::Single(value) => Ok(vec![Entity::from_value(value)?]),
            Extracted::Empty => Ok(Vec::new()),
        }
    }

    pub(crate) fn list_entities_at(
        &self,
        path: &str,
        params: Option<&Params>,
    ) -> Result<Vec<Entity>, Error> {
        let body = self.core.transport.get(path, params)?;
        let entities = self.extract_entities(body)?;
        debug!(resource = %self.core.kind, count = entities.len(), "listed");
        Ok(entities)
    }

    fn list_entities(&self, params: Option<&Params>) -> Result<Vec<Entity>, Error> {
        self.list_entities_at(&self.core.base_path, params)
    }

    /// Read one entity according to the kind's read strategy.
    pub(crate) fn fetch_entity(&self, id: Option<&EntityId>) -> Result<Entity, Error> {
        let kind = self.core.kind;
        let entity = match (kind.read_strategy(), id) {
            (ReadStrategy::Singleton, _) => {
                let body = self.core.transport.get(&self.core.base_path, None)?;
                self.expect_entity(body)?
            }
            (ReadStrategy::Touch, _) => {
                let empty = Body::Structured(json!({}));
                let body = self
                    .core
                    .transport
                    .patch(&self.core.base_path, Some(&empty), None)?;
                self.expect_entity(body)?
            }
            (ReadStrategy::ById, Some(id)) => {
                let body = self.core.transport.get(&self.entity_path(id), None)?;
                self.expect_entity(body)?
            }
            (ReadStrategy::Scan, Some(id)) => {
                let field = kind.id_field();
                self.list_entities(None)?
                    .into_iter()
                    .find(|e| id.matches(&e[field]))
                    .ok_or_else(|| Error::Missing {
                        kind,
                        key: id.to_string(),
                    })?
            }
            (ReadStrategy::ById | ReadStrategy::Scan, None) => {
                return Err(Error::MissingId { kind });
            }
        };
        debug!(resource = %kind, entity = %entity, "read");
        Ok(entity)
    }
}

// ── Operations ──────────────────────────────────────────────────────

impl<R: From<Resource>> Manager<R> {
    pub(crate) fn instance(&self, entity: Entity) -> R {
        let id = entity.id_at(self.core.kind.id_field());
        R::from(Resource::loaded(self.untyped(), id, entity))
    }

    pub(crate) fn instance_from(&self, body: Option<Value>) -> Result<R, Error> {
        self.expect_entity(body).map(|entity| self.instance(entity))
    }

    /// Every entity in scope.
    pub fn list(&self, params: Option<&Params>) -> Result<Vec<R>, Error> {
        info!(resource = %self.core.kind, path = %self.core.base_path, "list");
        Ok(self
            .list_entities(params)?
            .into_iter()
            .map(|entity| self.instance(entity))
            .collect())
    }

    /// First listed entity matching `predicate`.
    pub fn find<F>(&self, params: Option<&Params>, predicate: F) -> Result<Option<R>, Error>
    where
        F: Fn(&Entity) -> bool,
    {
        info!(resource = %self.core.kind, "find");
        Ok(self
            .list_entities(params)?
            .into_iter()
            .find(|entity| predicate(entity))
            .map(|entity| self.instance(entity)))
    }

    /// Every listed entity matching `predicate`.
    pub fn select<F>(&self, params: Option<&Params>, predicate: F) -> Result<Vec<R>, Error>
    where
        F: Fn(&Entity) -> bool,
    {
        info!(resource = %self.core.kind, "select");
        Ok(self
            .list_entities(params)?
            .into_iter()
            .filter(|entity| predicate(entity))
            .map(|entity| self.instance(entity))
            .collect())
    }

    /// Entity whose name-like attribute equals `name`.
    ///
    /// Fields are tried in [`NAME_FIELDS`] order; an entity matching on a
    /// higher-priority field wins over one listed earlier that only matches
    /// on a lower one.
    pub fn read_by_name(&self, name: &str) -> Result<Option<R>, Error> {
        info!(resource = %self.core.kind, name, "read by name");
        let mut entities = self.list_entities(None)?;
        let position = NAME_FIELDS.iter().find_map(|field| {
            entities
                .iter()
                .position(|entity| entity.str(field) == Some(name))
        });
        Ok(position.map(|idx| self.instance(entities.swap_remove(idx))))
    }

    /// Fetch one entity now. A 404 surfaces here.
    pub fn read(&self, id: impl Into<EntityId>) -> Result<R, Error> {
        let id = id.into();
        info!(resource = %self.core.kind, %id, "read");
        let entity = self.fetch_entity(Some(&id))?;
        Ok(R::from(Resource::loaded(self.untyped(), Some(id), entity)))
    }

    /// Handle bound to `id` without fetching; the first attribute access
    /// issues the read.
    pub fn prepare(&self, id: impl Into<EntityId>) -> R {
        R::from(Resource::unfetched(self.untyped(), id.into()))
    }

    /// Read the single entity of a singleton kind.
    pub fn fetch(&self) -> Result<R, Error> {
        info!(resource = %self.core.kind, path = %self.core.base_path, "fetch");
        let entity = self.fetch_entity(None)?;
        Ok(self.instance(entity))
    }

    pub fn create(&self, attributes: &Entity) -> Result<R, Error> {
        let kind = self.core.kind;
        let mut attributes = attributes.clone();
        attributes.merge_missing(&self.core.defaults);
        let path = kind
            .create_path()
            .map_or_else(|| self.core.base_path.clone(), str::to_owned);
        info!(resource = %kind, %path, "create");

        let lookup = kind
            .create_lookup()
            .map(|field| attributes.id_at(field));
        let body = Body::Structured(attributes.into_value());
        let response = self.core.transport.post(&path, Some(&body), None)?;

        // The response describes the parent; find the new entity by listing.
        // A server-generated key is the newest (last listed) entry.
        if let Some(key) = lookup {
            self.extract_entity(response)?;
            let field = kind.id_field();
            let entities = self.list_entities(None)?;
            let entity = match &key {
                Some(key) => entities.into_iter().find(|e| key.matches(&e[field])),
                None => entities.into_iter().next_back(),
            };
            let entity = entity.ok_or_else(|| Error::Missing {
                kind,
                key: key.map_or_else(|| "<generated>".to_owned(), |k| k.to_string()),
            })?;
            return Ok(self.instance(entity));
        }

        let created = self.instance_from(response)?;
        debug!(resource = %kind, "created");
        Ok(created)
    }

    /// Update an entity; `id` defaults to the kind's id attribute in
    /// `attributes`. Singleton kinds take no id.
    pub fn update(&self, attributes: &Entity, id: Option<&EntityId>) -> Result<R, Error> {
        let kind = self.core.kind;
        let path = if kind.is_singleton() {
            self.core.base_path.clone()
        } else {
            let id = id
                .cloned()
                .or_else(|| attributes.id_at(kind.id_field()))
                .ok_or(Error::MissingId { kind })?;
            self.entity_path(&id)
        };
        info!(resource = %kind, %path, "update");

        let mut attributes = attributes.clone();
        attributes.merge_missing(&self.core.defaults);
        let body = Body::Structured(attributes.into_value());
        let response = self.core.transport.send(Request {
            method: kind.update_method(),
            path: &path,
            body: Some(&body),
            params: None,
        })?;
        self.instance_from(response)
    }

    /// Delete an entity. `Ok(true)` on any successful completion.
    pub fn delete(&self, id: impl Into<EntityId>, params: Option<&Params>) -> Result<bool, Error> {
        let id = id.into();
        info!(resource = %self.core.kind, %id, "delete");
        self.core.transport.delete(&self.entity_path(&id), params)?;
        Ok(true)
    }

    /// Index get: numeric keys read by id, anything else by name.
    pub fn lookup(&self, key: impl Into<EntityId>) -> Result<R, Error> {
        match key.into() {
            id @ EntityId::Numeric(_) => self.read(id),
            EntityId::Name(name) => self.read_by_name(&name)?.ok_or(Error::Missing {
                kind: self.core.kind,
                key: name,
            }),
        }
    }

    /// Index set: resolve `key` to an id as [`lookup`](Self::lookup) does,
    /// then update.
    pub fn assign(&self, key: impl Into<EntityId>, attributes: &Entity) -> Result<R, Error> {
        let kind = self.core.kind;
        let id = match key.into() {
            id @ EntityId::Numeric(_) => id,
            EntityId::Name(name) => self
                .untyped()
                .read_by_name(&name)?
                .and_then(|resource| resource.id().cloned())
                .ok_or(Error::Missing { kind, key: name })?,
        };
        self.update(attributes, Some(&id))
    }

    /// `PUT {base}/{id}/{action}`, wrapping the response as this kind.
    /// State transitions and default flags go through here.
    pub(crate) fn put_action(
        &self,
        id: &EntityId,
        action: &str,
        body: Option<&Entity>,
    ) -> Result<R, Error> {
        let path = format!("{}/{action}", self.entity_path(id));
        info!(resource = %self.core.kind, %path, "member action");
        let body = body.map(|entity| Body::Structured(entity.clone().into_value()));
        let response = self.core.transport.put(&path, body.as_ref(), None)?;
        self.instance_from(response)
    }
}

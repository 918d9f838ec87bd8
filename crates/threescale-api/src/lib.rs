//! Blocking Rust client for the 3scale account management REST API.
//!
//! The crate is a small generic resource layer plus thin typed handles:
//!
//! - **[`Transport`]**: the only seam to the network. [`HttpTransport`]
//!   appends the format suffix, injects the `Authorization` header computed
//!   from [`Credentials`], and classifies statuses into typed errors.
//!
//! - **[`envelope`]**: unwraps `{"services": [{"service": {...}}]}` and its
//!   degraded variants into plain attribute mappings ([`Entity`]).
//!
//! - **[`Manager`]**: CRUD for one [`ResourceKind`] within one [`Scope`].
//!   Per-kind quirks (envelope keys, paths, update verb, read strategy) come
//!   from the kind registry rather than per-kind subclasses.
//!
//! - **[`Resource`]**: lazily-fetched handle to one entity, bound back to
//!   its manager for `update` / `delete` and able to spawn child managers.
//!   Typed handles ([`Service`], [`Account`], ...) deref to it and add the
//!   kind's own verbs through the [`Stateful`], [`UserLifecycle`] and
//!   [`DefaultSettable`] capability traits.
//!
//! - **[`Client`]**: root object holding one memoized manager per
//!   top-level family, plus [`Analytics`].
//!
//! `Manager::read` is eager: a 404 surfaces from the call itself.
//! `Manager::prepare` builds an unfetched handle and defers the request (and
//! any 404) to the first attribute access.

pub mod analytics;
pub mod auth;
pub mod capability;
pub mod client;
pub mod codec;
pub mod entity;
pub mod envelope;
pub mod error;
pub mod kind;
pub mod manager;
pub mod resource;
pub mod resources;
pub mod scope;
pub mod transport;

// ── Primary re-exports ──────────────────────────────────────────────
pub use analytics::{
    Analytics, Granularity, Period, Usage, UsageQuery, UsageTarget, UsageTime,
};
pub use auth::Credentials;
pub use capability::{
    AccountTransition, ApplicationTransition, DefaultSettable, Stateful, UserLifecycle,
    UserTransition,
};
pub use client::{Client, ClientConfig};
pub use codec::{Codec, JsonCodec};
pub use entity::{Entity, EntityId};
pub use envelope::Extracted;
pub use error::{Error, RawResponse};
pub use kind::{ReadStrategy, ResourceKind};
pub use manager::{Manager, NAME_FIELDS};
pub use resource::Resource;
pub use resources::proxy::Environment;
pub use resources::{
    Account, AccountPlan, AccountUser, ActiveDoc, Application, ApplicationKey, ApplicationPlan,
    ApplicationPlanLimit, Kind, MappingRule, Method, Metric, Provider, Proxy, RootKind, Service,
    ServicePlan, Settings, Webhook,
};
pub use scope::Scope;
pub use transport::{
    Body, HttpTransport, Params, Request, TlsMode, Transport, TransportConfig, TransportExt, params,
};

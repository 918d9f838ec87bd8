// Resource-kind registry
//
// Every per-resource quirk of the management API (envelope keys, path
// layout, update verb, how a single entity is read back) lives in this one
// table, keyed by `ResourceKind`. The generic manager consults it instead of
// being subclassed per resource.

use reqwest::Method;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::error::Error;
use crate::scope::Scope;

/// Path prefix shared by every management endpoint.
pub const API_PREFIX: &str = "/admin/api";

/// Every resource family the management API exposes.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[strum(serialize_all = "snake_case")]
pub enum ResourceKind {
    Service,
    Proxy,
    Metric,
    Method,
    MappingRule,
    ApplicationPlan,
    ApplicationPlanLimit,
    ServicePlan,
    AccountPlan,
    Account,
    AccountUser,
    Application,
    ApplicationKey,
    Provider,
    ActiveDoc,
    Webhook,
    Settings,
}

/// How a manager reads back one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStrategy {
    /// `GET {base}/{id}`.
    ById,
    /// No per-id endpoint: list and match the kind's id field client-side.
    Scan,
    /// One entity per scope: `GET {base}`.
    Singleton,
    /// One entity per scope, only readable through an empty `PATCH {base}`.
    Touch,
}

/// One segment of a base-path template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Lit(&'static str),
    /// Replaced by the id of the named ancestor in the manager's scope.
    Id(ResourceKind),
}

use Segment::{Id, Lit};

impl ResourceKind {
    /// Key wrapping a single entity: `{ "service": {...} }`.
    pub fn entity_key(self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Proxy => "proxy",
            Self::Metric => "metric",
            Self::Method => "method",
            Self::MappingRule => "mapping_rule",
            Self::ApplicationPlan => "application_plan",
            Self::ApplicationPlanLimit => "limit",
            Self::ServicePlan => "service_plan",
            Self::AccountPlan => "account_plan",
            Self::Account => "account",
            Self::AccountUser | Self::Provider => "user",
            Self::Application => "application",
            Self::ApplicationKey => "key",
            Self::ActiveDoc => "api_doc",
            Self::Webhook => "webhook",
            Self::Settings => "settings",
        }
    }

    /// Key wrapping a list of entities: `{ "services": [...] }`.
    ///
    /// Plans of every flavour share the `plans` collection, which is why this
    /// is not simply `entity_key + "s"`.
    pub fn collection_key(self) -> &'static str {
        match self {
            Self::Service => "services",
            Self::Proxy => "proxies",
            Self::Metric => "metrics",
            Self::Method => "methods",
            Self::MappingRule => "mapping_rules",
            Self::ApplicationPlan | Self::ServicePlan | Self::AccountPlan => "plans",
            Self::ApplicationPlanLimit => "limits",
            Self::Account => "accounts",
            Self::AccountUser | Self::Provider => "users",
            Self::Application => "applications",
            Self::ApplicationKey => "keys",
            Self::ActiveDoc => "api_docs",
            Self::Webhook => "webhooks",
            Self::Settings => "settings",
        }
    }

    /// Base path below [`API_PREFIX`], with ancestor id placeholders.
    pub fn path_template(self) -> &'static [Segment] {
        match self {
            Self::Service => &[Lit("services")],
            Self::Proxy => &[Lit("services"), Id(Self::Service), Lit("proxy")],
            Self::Metric => &[Lit("services"), Id(Self::Service), Lit("metrics")],
            Self::Method => &[
                Lit("services"),
                Id(Self::Service),
                Lit("metrics"),
                Id(Self::Metric),
                Lit("methods"),
            ],
            Self::MappingRule => &[
                Lit("services"),
                Id(Self::Service),
                Lit("proxy"),
                Lit("mapping_rules"),
            ],
            Self::ApplicationPlan => &[
                Lit("services"),
                Id(Self::Service),
                Lit("application_plans"),
            ],
            Self::ApplicationPlanLimit => &[
                Lit("application_plans"),
                Id(Self::ApplicationPlan),
                Lit("metrics"),
                Id(Self::Metric),
                Lit("limits"),
            ],
            Self::ServicePlan => &[Lit("services"), Id(Self::Service), Lit("service_plans")],
            Self::AccountPlan => &[Lit("account_plans")],
            Self::Account => &[Lit("accounts")],
            Self::AccountUser => &[Lit("accounts"), Id(Self::Account), Lit("users")],
            Self::Application => &[Lit("accounts"), Id(Self::Account), Lit("applications")],
            Self::ApplicationKey => &[
                Lit("accounts"),
                Id(Self::Account),
                Lit("applications"),
                Id(Self::Application),
                Lit("keys"),
            ],
            Self::Provider => &[Lit("users")],
            Self::ActiveDoc => &[Lit("active_docs")],
            Self::Webhook => &[Lit("webhooks")],
            Self::Settings => &[Lit("settings")],
        }
    }

    /// `true` when the base path needs no ancestor ids.
    pub fn is_root(self) -> bool {
        self.path_template()
            .iter()
            .all(|segment| matches!(segment, Lit(_)))
    }

    /// Base path with ancestor placeholders dropped. Equal to
    /// [`base_path`](Self::base_path) for root kinds.
    pub fn literal_path(self) -> String {
        let mut path = String::from(API_PREFIX);
        for segment in self.path_template() {
            if let Lit(literal) = segment {
                path.push('/');
                path.push_str(literal);
            }
        }
        path
    }

    /// Render the full base path for this kind within `scope`.
    ///
    /// A `metric` placeholder accepts a method as well: methods are metrics
    /// on the remote side, and plan limits hang off either.
    pub fn base_path(self, scope: &Scope) -> Result<String, Error> {
        let mut path = String::from(API_PREFIX);
        for segment in self.path_template() {
            path.push('/');
            match *segment {
                Lit(literal) => path.push_str(literal),
                Id(Self::Metric) => {
                    let id = scope
                        .last_of(&[Self::Method, Self::Metric])
                        .ok_or(Error::MissingScope {
                            kind: self,
                            parent: Self::Metric,
                        })?;
                    path.push_str(&id.path_segment());
                }
                Id(parent) => {
                    let id = scope.id_of(parent).ok_or(Error::MissingScope {
                        kind: self,
                        parent,
                    })?;
                    path.push_str(&id.path_segment());
                }
            }
        }
        Ok(path)
    }

    /// Attribute holding the identifier used in per-entity URLs.
    pub fn id_field(self) -> &'static str {
        match self {
            Self::ApplicationKey => "value",
            _ => "id",
        }
    }

    /// Verb used by `update`.
    pub fn update_method(self) -> Method {
        match self {
            Self::Proxy | Self::Webhook | Self::Settings => Method::PATCH,
            _ => Method::PUT,
        }
    }

    pub fn read_strategy(self) -> ReadStrategy {
        match self {
            Self::ApplicationKey | Self::ActiveDoc => ReadStrategy::Scan,
            Self::Proxy | Self::Settings => ReadStrategy::Singleton,
            Self::Webhook => ReadStrategy::Touch,
            _ => ReadStrategy::ById,
        }
    }

    /// `true` for kinds with exactly one entity per scope (no id in paths).
    pub fn is_singleton(self) -> bool {
        matches!(
            self.read_strategy(),
            ReadStrategy::Singleton | ReadStrategy::Touch
        )
    }

    /// Path used by `create` when it differs from the base path.
    pub fn create_path(self) -> Option<&'static str> {
        match self {
            Self::Account => Some("/admin/api/signup"),
            _ => None,
        }
    }

    /// Attribute of the create request that identifies the new entity.
    ///
    /// Set for kinds whose create endpoint answers with the parent entity;
    /// the created entity is then found by listing and matching this
    /// attribute against [`id_field`](Self::id_field).
    pub fn create_lookup(self) -> Option<&'static str> {
        match self {
            Self::ApplicationKey => Some("key"),
            _ => None,
        }
    }

    /// Provider-wide listing that ignores the manager's scope.
    pub fn list_all_path(self) -> Option<&'static str> {
        match self {
            Self::ApplicationPlan => Some("/admin/api/application_plans"),
            Self::ServicePlan => Some("/admin/api/service_plans"),
            Self::AccountPlan => Some("/admin/api/account_plans"),
            Self::Application => Some("/admin/api/applications"),
            _ => None,
        }
    }
}

use serde::Deserialize;

use super::{ApplicationPlan, MappingRule, Metric, Proxy, ServicePlan};
use crate::entity::Entity;
use crate::error::Error;
use crate::manager::Manager;

typed_resource!(
    /// An API product: the root of metrics, plans, mapping rules and its
    /// gateway proxy.
    Service => Service, root
);

/// Typed view of a service entity.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceView {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub system_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub backend_version: Option<String>,
    #[serde(default)]
    pub deployment_option: Option<String>,
}

impl Service {
    /// This service's gateway configuration.
    pub fn proxy(&self) -> Result<Manager<Proxy>, Error> {
        self.manager_instance()
    }

    pub fn metrics(&self) -> Result<Manager<Metric>, Error> {
        self.manager_instance()
    }

    /// Mapping rules; create and update bodies default `metric_id` to
    /// `metric` when one is given.
    pub fn mapping_rules(&self, metric: Option<&Metric>) -> Result<Manager<MappingRule>, Error> {
        let manager = self.manager_instance::<MappingRule>()?;
        Ok(match metric.and_then(|m| m.id().cloned()) {
            Some(id) => manager.with_defaults(Entity::new().with("metric_id", id)),
            None => manager,
        })
    }

    pub fn application_plans(&self) -> Result<Manager<ApplicationPlan>, Error> {
        self.manager_instance()
    }

    pub fn service_plans(&self) -> Result<Manager<ServicePlan>, Error> {
        self.manager_instance()
    }

    /// The built-in `hits` metric every service carries.
    pub fn hits_metric(&self) -> Result<Option<Metric>, Error> {
        self.metrics()?.read_by_name("hits")
    }
}

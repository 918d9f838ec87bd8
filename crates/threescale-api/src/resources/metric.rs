use serde::Deserialize;

use super::plans::limits_manager;
use super::{ApplicationPlan, ApplicationPlanLimit, Kind, Service};
use crate::error::Error;
use crate::manager::Manager;

typed_resource!(
    /// A counter usage is reported against.
    Metric => Metric
);

typed_resource!(
    /// A sub-metric of one metric, usually one API method.
    Method => Method
);

/// Typed view shared by metrics and methods.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricView {
    pub id: u64,
    pub system_name: String,
    pub friendly_name: String,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Metric {
    pub fn methods(&self) -> Result<Manager<Method>, Error> {
        self.manager_instance()
    }

    /// Limits `plan` puts on this metric.
    pub fn application_plan_limits(
        &self,
        plan: &ApplicationPlan,
    ) -> Result<Manager<ApplicationPlanLimit>, Error> {
        limits_manager(plan, self)
    }

    pub fn service(&self) -> Result<Service, Error> {
        self.parent(Service::KIND).map(Service::from)
    }
}

impl Method {
    /// Limits `plan` puts on this method.
    pub fn application_plan_limits(
        &self,
        plan: &ApplicationPlan,
    ) -> Result<Manager<ApplicationPlanLimit>, Error> {
        limits_manager(plan, self)
    }

    /// Unfetched handle to the parent metric.
    pub fn metric(&self) -> Result<Metric, Error> {
        self.parent(Metric::KIND).map(Metric::from)
    }
}

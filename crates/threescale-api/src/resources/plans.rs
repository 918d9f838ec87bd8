use std::sync::Arc;

use serde::Deserialize;

use super::{Kind, Metric, Service};
use crate::capability::DefaultSettable;
use crate::error::Error;
use crate::kind::ResourceKind;
use crate::manager::Manager;
use crate::resource::Resource;

typed_resource!(
    /// A plan applications subscribe to; carries per-metric limits.
    ApplicationPlan => ApplicationPlan
);

typed_resource!(
    /// A plan services are offered under.
    ServicePlan => ServicePlan
);

typed_resource!(
    /// A plan developer accounts sign up for.
    AccountPlan => AccountPlan, root
);

typed_resource!(
    /// A usage limit of one application plan on one metric or method.
    ApplicationPlanLimit => ApplicationPlanLimit
);

/// Typed view shared by every plan flavour.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanView {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub system_name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub setup_fee: Option<f64>,
    #[serde(default)]
    pub cost_per_month: Option<f64>,
}

/// Typed view of a limit.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitView {
    pub id: u64,
    pub period: String,
    pub value: i64,
    #[serde(default)]
    pub metric_id: Option<u64>,
    #[serde(default)]
    pub plan_id: Option<u64>,
}

impl DefaultSettable for ApplicationPlan {}
impl DefaultSettable for ServicePlan {}
impl DefaultSettable for AccountPlan {}

impl ApplicationPlan {
    /// Limits this plan puts on `metric` (a metric or a method).
    pub fn limits(&self, metric: &Metric) -> Result<Manager<ApplicationPlanLimit>, Error> {
        limits_manager(self, metric)
    }

    pub fn service(&self) -> Result<Service, Error> {
        self.parent(Service::KIND).map(Service::from)
    }
}

impl ServicePlan {
    pub fn service(&self) -> Result<Service, Error> {
        self.parent(Service::KIND).map(Service::from)
    }
}

/// Limits manager for `plan` and `metric`; the metric handle may also be a
/// method, whose id then fills the metric slot of the path.
pub(crate) fn limits_manager(
    plan: &ApplicationPlan,
    metric: &Resource,
) -> Result<Manager<ApplicationPlanLimit>, Error> {
    let plan_id = plan.id().cloned().ok_or(Error::MissingId {
        kind: ApplicationPlan::KIND,
    })?;
    let scope = metric
        .child_scope()?
        .with(ResourceKind::ApplicationPlan, plan_id);
    Manager::<ApplicationPlanLimit>::new(Arc::clone(plan.transport()), scope)
}

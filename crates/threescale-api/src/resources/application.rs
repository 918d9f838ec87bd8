use serde::Deserialize;
use tracing::info;

use super::{Account, Kind};
use crate::capability::{ApplicationTransition, Stateful};
use crate::entity::EntityId;
use crate::error::Error;
use crate::manager::Manager;
use crate::transport::{Params, TransportExt, params};

typed_resource!(
    /// An application subscribed to one plan on behalf of an account.
    Application => Application
);

typed_resource!(
    /// One key of an application, addressed by its value.
    ApplicationKey => ApplicationKey
);

/// Typed view of an application entity.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationView {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub user_account_id: Option<u64>,
    #[serde(default)]
    pub plan_id: Option<u64>,
    #[serde(default)]
    pub service_id: Option<u64>,
    #[serde(default)]
    pub application_id: Option<String>,
    #[serde(default)]
    pub user_key: Option<String>,
}

impl Stateful for Application {
    type Transition = ApplicationTransition;
}

impl Application {
    pub fn accept(&self) -> Result<Self, Error> {
        self.set_state(ApplicationTransition::Accept)
    }

    pub fn suspend(&self) -> Result<Self, Error> {
        self.set_state(ApplicationTransition::Suspend)
    }

    pub fn resume(&self) -> Result<Self, Error> {
        self.set_state(ApplicationTransition::Resume)
    }

    pub fn keys(&self) -> Result<Manager<ApplicationKey>, Error> {
        self.manager_instance()
    }

    /// Unfetched handle to the owning account.
    pub fn account(&self) -> Result<Account, Error> {
        self.parent(Account::KIND).map(Account::from)
    }
}

impl Manager<Application> {
    /// Every application of the provider, optionally limited to one service.
    pub fn list_by_service(
        &self,
        service_id: Option<&EntityId>,
    ) -> Result<Vec<Application>, Error> {
        let Some(service_id) = service_id else {
            return self.list_all();
        };
        let filter = params([("service_id", service_id.to_string())]);
        let Some(path) = self.kind().list_all_path() else {
            return self.list(Some(&filter));
        };
        info!(resource = %self.kind(), path, %service_id, "list by service");
        Ok(self
            .list_entities_at(path, Some(&filter))?
            .into_iter()
            .map(|entity| self.instance(entity))
            .collect())
    }

    /// Look one application up by `application_id`, `user_key` or
    /// `app_id`.
    pub fn find_by_params(&self, params: &Params) -> Result<Application, Error> {
        let path = "/admin/api/applications/find";
        info!(resource = %self.kind(), path, "find by params");
        let body = self.transport().get(path, Some(params))?;
        self.instance_from(body)
    }
}

use serde::Deserialize;

use super::{Application, ApplicationPlan, Kind};
use crate::capability::{AccountTransition, Stateful, UserLifecycle, UserTransition};
use crate::entity::{Entity, EntityId};
use crate::error::Error;
use crate::manager::Manager;

typed_resource!(
    /// A developer account. Created through the signup endpoint.
    Account => Account, root
);

typed_resource!(
    /// A user belonging to one developer account.
    AccountUser => AccountUser
);

typed_resource!(
    /// A user of the provider (admin portal) account.
    Provider => Provider, root
);

/// Typed view of an account entity.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountView {
    pub id: u64,
    pub org_name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub credit_card_stored: Option<bool>,
}

impl Stateful for Account {
    type Transition = AccountTransition;
}

impl Account {
    pub fn approve(&self) -> Result<Self, Error> {
        self.set_state(AccountTransition::Approve)
    }

    pub fn reject(&self) -> Result<Self, Error> {
        self.set_state(AccountTransition::Reject)
    }

    pub fn make_pending(&self) -> Result<Self, Error> {
        self.set_state(AccountTransition::MakePending)
    }

    pub fn users(&self) -> Result<Manager<AccountUser>, Error> {
        self.manager_instance()
    }

    pub fn applications(&self) -> Result<Manager<Application>, Error> {
        self.manager_instance()
    }

    /// Move this account to another account plan.
    pub fn set_plan(&self, plan_id: impl Into<EntityId>) -> Result<Self, Error> {
        let id = self.id().ok_or(Error::MissingId { kind: Self::KIND })?;
        self.manager()
            .put_action(id, "change_plan", Some(&plan_body(plan_id.into())))
            .map(Self::from)
    }

    /// Subscribe a new application to `plan`.
    pub fn create_application(
        &self,
        plan: &ApplicationPlan,
        attributes: &Entity,
    ) -> Result<Application, Error> {
        let plan_id = plan.id().cloned().ok_or(Error::MissingId {
            kind: ApplicationPlan::KIND,
        })?;
        let mut attributes = attributes.clone();
        attributes.set("plan_id", plan_id);
        self.applications()?.create(&attributes)
    }
}

impl Manager<Account> {
    /// `PUT {base}/{id}/change_plan` with `{"plan_id": ...}`.
    pub fn set_plan(
        &self,
        id: impl Into<EntityId>,
        plan_id: impl Into<EntityId>,
    ) -> Result<Account, Error> {
        self.put_action(&id.into(), "change_plan", Some(&plan_body(plan_id.into())))
    }
}

fn plan_body(plan_id: EntityId) -> Entity {
    Entity::new().with("plan_id", plan_id)
}

impl Stateful for AccountUser {
    type Transition = UserTransition;
}

impl UserLifecycle for AccountUser {}

impl AccountUser {
    /// Unfetched handle to the owning account.
    pub fn account(&self) -> Result<Account, Error> {
        self.parent(Account::KIND).map(Account::from)
    }
}

impl Stateful for Provider {
    type Transition = UserTransition;
}

impl UserLifecycle for Provider {}

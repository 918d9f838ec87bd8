// Capability traits shared by several resource kinds
//
// State transitions and default plans are not universal: only the kinds
// that implement these traits expose them.

use strum::{AsRefStr, Display, EnumString};
use tracing::info;

use crate::entity::EntityId;
use crate::error::Error;
use crate::manager::Manager;
use crate::resource::Resource;
use crate::resources::Kind;

// ── Transitions ─────────────────────────────────────────────────────

/// Account approval transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum AccountTransition {
    Approve,
    Reject,
    MakePending,
}

/// Application lifecycle transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum ApplicationTransition {
    Accept,
    Suspend,
    Resume,
}

/// User lifecycle and role transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum UserTransition {
    Activate,
    Suspend,
    Unsuspend,
    Admin,
    Member,
}

/// Resources with a server-enforced state machine.
///
/// The transition set is closed per kind; whether a transition is legal
/// from the current state is up to the remote side, which answers with the
/// updated entity or an error.
pub trait Stateful: Kind {
    type Transition: AsRef<str> + Copy;

    /// `PUT {base}/{id}/{transition}` with no body.
    fn set_state(&self, transition: Self::Transition) -> Result<Self, Error> {
        let id = self.id().ok_or(Error::MissingId { kind: Self::KIND })?;
        self.manager()
            .put_action(id, transition.as_ref(), None)
            .map(Self::from)
    }
}

impl<R: Stateful> Manager<R> {
    /// Apply a transition to the entity `id`.
    pub fn set_state(
        &self,
        id: impl Into<EntityId>,
        transition: R::Transition,
    ) -> Result<R, Error> {
        self.put_action(&id.into(), transition.as_ref(), None)
    }
}

/// Named user transitions shared by account users and provider users.
pub trait UserLifecycle: Stateful<Transition = UserTransition> {
    fn activate(&self) -> Result<Self, Error> {
        self.set_state(UserTransition::Activate)
    }

    fn suspend(&self) -> Result<Self, Error> {
        self.set_state(UserTransition::Suspend)
    }

    fn resume(&self) -> Result<Self, Error> {
        self.set_state(UserTransition::Unsuspend)
    }

    fn as_admin(&self) -> Result<Self, Error> {
        self.set_state(UserTransition::Admin)
    }

    fn as_member(&self) -> Result<Self, Error> {
        self.set_state(UserTransition::Member)
    }
}

// ── Default plans ───────────────────────────────────────────────────

/// Plans one of which can be flagged as the default.
pub trait DefaultSettable: Kind {
    /// `PUT {base}/{id}/default`.
    fn set_default(&self) -> Result<Self, Error> {
        let id = self.id().ok_or(Error::MissingId { kind: Self::KIND })?;
        self.manager()
            .put_action(id, "default", None)
            .map(Self::from)
    }
}

impl<R: DefaultSettable> Manager<R> {
    /// Flag the entity `id` as the default.
    pub fn set_default(&self, id: impl Into<EntityId>) -> Result<R, Error> {
        self.put_action(&id.into(), "default", None)
    }

    /// The entity whose `default` attribute is true; the last one listed
    /// wins when several are.
    pub fn get_default(&self) -> Result<Option<R>, Error> {
        info!(resource = %self.kind(), "get default");
        let default = self
            .list_entities_at(self.base_path(), None)?
            .into_iter()
            .rev()
            .find(|entity| entity.is_true("default"));
        Ok(default.map(|entity| self.instance(entity)))
    }
}

impl<R: From<Resource>> Manager<R> {
    /// Provider-wide listing, ignoring this manager's scope. Falls back to
    /// [`list`](Self::list) for kinds without such an endpoint.
    pub fn list_all(&self) -> Result<Vec<R>, Error> {
        let Some(path) = self.kind().list_all_path() else {
            return self.list(None);
        };
        info!(resource = %self.kind(), path, "list all");
        Ok(self
            .list_entities_at(path, None)?
            .into_iter()
            .map(|entity| self.instance(entity))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transitions_render_as_path_segments() {
        assert_eq!(AccountTransition::MakePending.as_ref(), "make_pending");
        assert_eq!(ApplicationTransition::Resume.as_ref(), "resume");
        assert_eq!(UserTransition::Unsuspend.as_ref(), "unsuspend");
    }
}

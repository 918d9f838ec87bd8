use serde_json::json;
use strum::{AsRefStr, Display, EnumString};
use tracing::{debug, info};

use super::{Kind, Service};
use crate::entity::{Entity, EntityId};
use crate::envelope::{self, Extracted};
use crate::error::Error;
use crate::manager::Manager;
use crate::transport::{Body, TransportExt, params};

typed_resource!(
    /// Gateway configuration of one service. There is exactly one per
    /// service, so it has no id of its own.
    Proxy => Proxy
);

typed_resource!(
    /// A pattern routing requests to a metric.
    MappingRule => MappingRule
);

const CONFIG_KEY: &str = "proxy_config";
const CONFIGS_KEY: &str = "proxy_configs";

/// Gateway environment a proxy configuration is deployed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum Environment {
    #[default]
    Sandbox,
    Production,
}

impl Proxy {
    /// Unfetched handle to the owning service.
    pub fn service(&self) -> Result<Service, Error> {
        self.parent(Service::KIND).map(Service::from)
    }
}

impl MappingRule {
    pub fn service(&self) -> Result<Service, Error> {
        self.parent(Service::KIND).map(Service::from)
    }
}

// ── Proxy configurations ────────────────────────────────────────────

impl Manager<Proxy> {
    fn configs_path(&self, env: Environment) -> String {
        format!("{}/configs/{env}", self.base_path())
    }

    fn config_entity(body: Option<serde_json::Value>) -> Result<Entity, Error> {
        if let Some(raw) = &body {
            envelope::check_response(raw)?;
        }
        match envelope::extract(body, CONFIG_KEY, None)? {
            Extracted::Single(value) => Entity::from_value(value),
            Extracted::Empty => Err(Error::UnrecognizedResponse {
                message: "empty response where a proxy config was expected".into(),
            }),
            Extracted::Collection(_) => Err(Error::UnrecognizedResponse {
                message: "expected one proxy config, got a sequence".into(),
            }),
        }
    }

    /// Every configuration version deployed to `env`.
    pub fn config_list(&self, env: Environment) -> Result<Vec<Entity>, Error> {
        let path = self.configs_path(env);
        info!(resource = %self.kind(), %path, "list proxy configs");
        let body = self.transport().get(&path, None)?;
        let configs = match envelope::extract(body, CONFIG_KEY, Some(CONFIGS_KEY))? {
            Extracted::Collection(items) => items
                .into_iter()
                .map(Entity::from_value)
                .collect::<Result<Vec<_>, _>>()?,
            Extracted::Single(value) => vec![Entity::from_value(value)?],
            Extracted::Empty => Vec::new(),
        };
        debug!(resource = %self.kind(), count = configs.len(), "listed proxy configs");
        Ok(configs)
    }

    /// One configuration version.
    pub fn config_read(
        &self,
        version: impl Into<EntityId>,
        env: Environment,
    ) -> Result<Entity, Error> {
        let version = version.into();
        let path = format!("{}/{}", self.configs_path(env), version.path_segment());
        info!(resource = %self.kind(), %path, "read proxy config");
        Self::config_entity(self.transport().get(&path, None)?)
    }

    /// The newest configuration version in `env`.
    pub fn latest(&self, env: Environment) -> Result<Entity, Error> {
        let path = format!("{}/latest", self.configs_path(env));
        info!(resource = %self.kind(), %path, "latest proxy config");
        Self::config_entity(self.transport().get(&path, None)?)
    }

    /// Copy configuration `version` from one environment to another.
    pub fn promote(
        &self,
        version: impl Into<EntityId>,
        from: Environment,
        to: Environment,
    ) -> Result<Entity, Error> {
        let path = format!("{}/{}/promote", self.configs_path(from), version.into());
        info!(resource = %self.kind(), %path, %to, "promote proxy config");
        let query = params([("to", to.as_ref())]);
        let body = Body::Structured(json!({}));
        Self::config_entity(self.transport().post(&path, Some(&body), Some(&query))?)
    }
}

// Root client
//
// Owns the transport and hands out one memoized manager per top-level
// resource family.

use std::fmt;
use std::sync::{Arc, OnceLock};

use secrecy::SecretString;

use crate::analytics::Analytics;
use crate::auth::Credentials;
use crate::error::Error;
use crate::manager::Manager;
use crate::resources::{Account, AccountPlan, ActiveDoc, Provider, Service, Settings, Webhook};
use crate::transport::{HttpTransport, Transport, TransportConfig};

/// Everything needed to reach one admin endpoint.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Admin portal URL, e.g. `https://acme-admin.3scale.net`.
    pub endpoint: String,
    pub credentials: Credentials,
    pub transport: TransportConfig,
}

impl ClientConfig {
    /// Config from raw credentials; the access token wins when both are set.
    pub fn new(
        endpoint: impl Into<String>,
        provider_key: Option<SecretString>,
        access_token: Option<SecretString>,
    ) -> Result<Self, Error> {
        Ok(Self {
            endpoint: endpoint.into(),
            credentials: Credentials::resolve(provider_key, access_token)?,
            transport: TransportConfig::default(),
        })
    }
}

/// Entry point to the management API.
///
/// Each accessor builds its manager on first use and returns the same
/// instance afterwards.
pub struct Client {
    transport: Arc<dyn Transport>,
    services: OnceLock<Manager<Service>>,
    accounts: OnceLock<Manager<Account>>,
    providers: OnceLock<Manager<Provider>>,
    account_plans: OnceLock<Manager<AccountPlan>>,
    active_docs: OnceLock<Manager<ActiveDoc>>,
    webhooks: OnceLock<Manager<Webhook>>,
    settings: OnceLock<Manager<Settings>>,
    analytics: OnceLock<Analytics>,
}

impl Client {
    /// Connect over HTTP.
    pub fn new(config: &ClientConfig) -> Result<Self, Error> {
        let transport =
            HttpTransport::new(&config.endpoint, &config.credentials, &config.transport)?;
        Ok(Self::with_transport(Arc::new(transport)))
    }

    /// Use an existing transport (a stub in tests, a custom codec, ...).
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            services: OnceLock::new(),
            accounts: OnceLock::new(),
            providers: OnceLock::new(),
            account_plans: OnceLock::new(),
            active_docs: OnceLock::new(),
            webhooks: OnceLock::new(),
            settings: OnceLock::new(),
            analytics: OnceLock::new(),
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn services(&self) -> &Manager<Service> {
        self.services
            .get_or_init(|| Manager::root(Arc::clone(&self.transport)))
    }

    pub fn accounts(&self) -> &Manager<Account> {
        self.accounts
            .get_or_init(|| Manager::root(Arc::clone(&self.transport)))
    }

    /// Users of the provider account.
    pub fn providers(&self) -> &Manager<Provider> {
        self.providers
            .get_or_init(|| Manager::root(Arc::clone(&self.transport)))
    }

    pub fn account_plans(&self) -> &Manager<AccountPlan> {
        self.account_plans
            .get_or_init(|| Manager::root(Arc::clone(&self.transport)))
    }

    pub fn active_docs(&self) -> &Manager<ActiveDoc> {
        self.active_docs
            .get_or_init(|| Manager::root(Arc::clone(&self.transport)))
    }

    pub fn webhooks(&self) -> &Manager<Webhook> {
        self.webhooks
            .get_or_init(|| Manager::root(Arc::clone(&self.transport)))
    }

    pub fn settings(&self) -> &Manager<Settings> {
        self.settings
            .get_or_init(|| Manager::root(Arc::clone(&self.transport)))
    }

    pub fn analytics(&self) -> &Analytics {
        self.analytics
            .get_or_init(|| Analytics::new(Arc::clone(&self.transport)))
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").finish_non_exhaustive()
    }
}

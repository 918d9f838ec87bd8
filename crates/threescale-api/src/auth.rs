use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Credentials for the management API.
///
/// Exactly one is used per client. Provider keys go out as HTTP Basic with an
/// empty user name, access tokens as a bearer token.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Account-wide provider key.
    ProviderKey(SecretString),
    /// Personal access token, scoped on the admin portal.
    AccessToken(SecretString),
}

impl Credentials {
    /// Pick a credential, preferring the access token when both are given.
    pub fn resolve(
        provider_key: Option<SecretString>,
        access_token: Option<SecretString>,
    ) -> Result<Self, Error> {
        match (access_token, provider_key) {
            (Some(token), _) => Ok(Self::AccessToken(token)),
            (None, Some(key)) => Ok(Self::ProviderKey(key)),
            (None, None) => Err(Error::Configuration {
                message: "either a provider key or an access token is required".into(),
            }),
        }
    }

    /// The `Authorization` header value, marked sensitive.
    pub fn header_value(&self) -> Result<HeaderValue, Error> {
        let raw = match self {
            Self::ProviderKey(key) => {
                let encoded = STANDARD.encode(format!(":{}", key.expose_secret()));
                format!("Basic {encoded}")
            }
            Self::AccessToken(token) => format!("Bearer {}", token.expose_secret()),
        };
        let mut value = HeaderValue::from_str(&raw).map_err(|e| Error::Configuration {
            message: format!("invalid credential header value: {e}"),
        })?;
        value.set_sensitive(true);
        Ok(value)
    }
}

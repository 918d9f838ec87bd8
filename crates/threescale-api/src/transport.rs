// HTTP transport
//
// The single seam between the resource layer and the network. Managers talk
// to `dyn Transport` only; `HttpTransport` is the reqwest-backed
// implementation, and tests substitute a recording stub.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, trace};
use url::Url;

use crate::auth::Credentials;
use crate::codec::{Codec, JsonCodec};
use crate::error::{Error, RawResponse, preview};

/// Query parameters, serialized in key order.
pub type Params = BTreeMap<String, String>;

/// Build [`Params`] from string pairs.
pub fn params<K: Into<String>, V: Into<String>>(pairs: impl IntoIterator<Item = (K, V)>) -> Params {
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Encoded by the transport's codec.
    Structured(Value),
    /// Sent verbatim.
    Raw(String),
}

impl From<Value> for Body {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

/// One call to the management API. `path` is relative to the endpoint and
/// carries no format suffix.
#[derive(Debug, Clone)]
pub struct Request<'a> {
    pub method: Method,
    pub path: &'a str,
    pub body: Option<&'a Body>,
    pub params: Option<&'a Params>,
}

/// Executes requests and returns the decoded body (`None` for blank).
///
/// Implementations classify statuses: 2xx and 422 decode, 403 is
/// [`Error::Forbidden`], 404 is [`Error::NotFound`], anything else is
/// [`Error::UnhandledResponse`].
pub trait Transport: Send + Sync {
    fn send(&self, request: Request<'_>) -> Result<Option<Value>, Error>;
}

/// Verb helpers over any [`Transport`].
pub trait TransportExt: Transport {
    fn get(&self, path: &str, params: Option<&Params>) -> Result<Option<Value>, Error> {
        self.send(Request {
            method: Method::GET,
            path,
            body: None,
            params,
        })
    }

    fn post(
        &self,
        path: &str,
        body: Option<&Body>,
        params: Option<&Params>,
    ) -> Result<Option<Value>, Error> {
        self.send(Request {
            method: Method::POST,
            path,
            body,
            params,
        })
    }

    fn put(
        &self,
        path: &str,
        body: Option<&Body>,
        params: Option<&Params>,
    ) -> Result<Option<Value>, Error> {
        self.send(Request {
            method: Method::PUT,
            path,
            body,
            params,
        })
    }

    fn patch(
        &self,
        path: &str,
        body: Option<&Body>,
        params: Option<&Params>,
    ) -> Result<Option<Value>, Error> {
        self.send(Request {
            method: Method::PATCH,
            path,
            body,
            params,
        })
    }

    fn delete(&self, path: &str, params: Option<&Params>) -> Result<Option<Value>, Error> {
        self.send(Request {
            method: Method::DELETE,
            path,
            body: None,
            params,
        })
    }
}

impl<T: Transport + ?Sized> TransportExt for T {}

// ── Client construction ─────────────────────────────────────────────

/// TLS verification mode.
#[derive(Debug, Clone, Default)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (on-premise installs with self-signed certs).
    DangerAcceptInvalid,
}

/// Settings for building the underlying HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    /// Per-request timeout; the only way a call is ever cut short.
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
            user_agent: concat!("threescale-rs/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl TransportConfig {
    /// Build a blocking `reqwest` client with the given default headers.
    pub fn build_client_with_headers(
        &self,
        headers: HeaderMap,
    ) -> Result<reqwest::blocking::Client, Error> {
        let mut builder = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .default_headers(headers);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

// ── HttpTransport ───────────────────────────────────────────────────

/// Blocking HTTP transport for one admin endpoint.
///
/// Builds `{endpoint}{path}.{format}?{params}` and sends the codec's media
/// type in `Accept` and `Content-Type` plus the credential's
/// `Authorization` header on every request.
pub struct HttpTransport {
    http: reqwest::blocking::Client,
    endpoint: String,
    codec: Arc<dyn Codec>,
}

impl HttpTransport {
    /// JSON transport for `endpoint` (e.g. `https://acme-admin.3scale.net`).
    pub fn new(
        endpoint: &str,
        credentials: &Credentials,
        config: &TransportConfig,
    ) -> Result<Self, Error> {
        Self::with_codec(endpoint, credentials, config, Arc::new(JsonCodec))
    }

    pub fn with_codec(
        endpoint: &str,
        credentials: &Credentials,
        config: &TransportConfig,
        codec: Arc<dyn Codec>,
    ) -> Result<Self, Error> {
        // Reject malformed endpoints up front rather than on first call.
        Url::parse(endpoint)?;

        let mime = HeaderValue::from_str(&codec.mime_type()).map_err(|e| Error::Configuration {
            message: format!("invalid media type: {e}"),
        })?;
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, mime.clone());
        headers.insert(CONTENT_TYPE, mime);
        headers.insert(AUTHORIZATION, credentials.header_value()?);

        let http = config.build_client_with_headers(headers)?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            codec,
        })
    }

    /// Wrap an existing client (caller manages auth headers).
    pub fn from_reqwest(
        endpoint: &str,
        http: reqwest::blocking::Client,
        codec: Arc<dyn Codec>,
    ) -> Result<Self, Error> {
        Url::parse(endpoint)?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            codec,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Absolute URL for `path`, format suffix before the query string.
    pub fn url(&self, path: &str, params: Option<&Params>) -> Result<Url, Error> {
        let mut url = Url::parse(&format!(
            "{}{path}.{}",
            self.endpoint,
            self.codec.format()
        ))?;
        if let Some(params) = params.filter(|p| !p.is_empty()) {
            url.query_pairs_mut().extend_pairs(params.iter());
        }
        Ok(url)
    }

    fn classify(
        &self,
        method: &Method,
        url: &Url,
        status: reqwest::StatusCode,
        body: String,
    ) -> Result<Option<Value>, Error> {
        if status.is_success() || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY {
            return self.codec.decode(&body);
        }
        let raw = RawResponse {
            status: status.as_u16(),
            method: method.to_string(),
            url: url.to_string(),
            body,
        };
        Err(match status.as_u16() {
            403 => Error::Forbidden(raw),
            404 => Error::NotFound(raw),
            _ => Error::UnhandledResponse(raw),
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: Request<'_>) -> Result<Option<Value>, Error> {
        let url = self.url(request.path, request.params)?;
        debug!(method = %request.method, %url, "sending request");

        let mut builder = self.http.request(request.method.clone(), url.clone());
        match request.body {
            Some(Body::Structured(value)) => {
                let encoded = self.codec.encode(value)?;
                trace!(body = %preview(&encoded), "request body");
                builder = builder.body(encoded);
            }
            Some(Body::Raw(raw)) => {
                trace!(body = %preview(raw), "raw request body");
                builder = builder.body(raw.clone());
            }
            None => {}
        }

        let response = builder.send()?;
        let status = response.status();
        let body = response.text()?;
        trace!(status = status.as_u16(), body = %preview(&body), "response");

        self.classify(&request.method, &url, status, body)
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .field("format", &self.codec.format())
            .finish_non_exhaustive()
    }
}

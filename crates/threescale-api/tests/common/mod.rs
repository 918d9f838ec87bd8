// Recording stub transport shared by the integration tests.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use threescale_api::{Body, Error, Params, RawResponse, Request, Transport};

/// One request as the stub saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
    pub params: Option<Params>,
}

/// Answers requests from a queue and records every request it receives.
#[derive(Default)]
pub struct StubTransport {
    responses: Mutex<VecDeque<Result<Option<Value>, Error>>>,
    requests: Mutex<Vec<Recorded>>,
}

impl StubTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue a successful body.
    pub fn respond(&self, body: Value) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(Some(body)));
        self
    }

    /// Queue a blank body.
    pub fn respond_empty(&self) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(None));
        self
    }

    /// Queue a 404.
    pub fn respond_not_found(&self, path: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(Error::NotFound(raw(404, path))));
        self
    }

    pub fn respond_err(&self, err: Error) -> &Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests.lock().unwrap().last().cloned().unwrap()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

pub fn raw(status: u16, path: &str) -> RawResponse {
    RawResponse {
        status,
        method: "GET".into(),
        url: format!("http://stub{path}.json"),
        body: String::new(),
    }
}

impl Transport for StubTransport {
    fn send(&self, request: Request<'_>) -> Result<Option<Value>, Error> {
        self.requests.lock().unwrap().push(Recorded {
            method: request.method.to_string(),
            path: request.path.to_owned(),
            body: request.body.map(|body| match body {
                Body::Structured(value) => value.clone(),
                Body::Raw(raw) => Value::String(raw.clone()),
            }),
            params: request.params.cloned(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(None))
    }
}

/// The stub as the trait object managers expect.
pub fn dyn_transport(stub: &Arc<StubTransport>) -> Arc<dyn Transport> {
    Arc::clone(stub) as Arc<dyn Transport>
}

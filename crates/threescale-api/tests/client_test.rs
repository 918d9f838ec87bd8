// Root client: memoized managers, analytics, configuration errors.
#![allow(clippy::unwrap_used)]

mod common;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;

use common::{StubTransport, dyn_transport};
use threescale_api::{Client, ClientConfig, Credentials, Error, Granularity, Period, UsageQuery};

// ── Helpers ─────────────────────────────────────────────────────────

fn secret(value: &str) -> Option<SecretString> {
    Some(SecretString::from(value.to_owned()))
}

// ── Managers ────────────────────────────────────────────────────────

#[test]
fn accessors_return_the_same_manager() {
    let stub = StubTransport::new();
    let client = Client::with_transport(dyn_transport(&stub));

    assert!(std::ptr::eq(client.services(), client.services()));
    assert!(std::ptr::eq(client.accounts(), client.accounts()));
    assert!(std::ptr::eq(client.analytics(), client.analytics()));
    assert_eq!(stub.count(), 0);
}

#[test]
fn root_managers_point_at_their_collections() {
    let client = Client::with_transport(dyn_transport(&StubTransport::new()));

    assert_eq!(client.services().base_path(), "/admin/api/services");
    assert_eq!(client.accounts().base_path(), "/admin/api/accounts");
    assert_eq!(client.providers().base_path(), "/admin/api/users");
    assert_eq!(client.account_plans().base_path(), "/admin/api/account_plans");
    assert_eq!(client.active_docs().base_path(), "/admin/api/active_docs");
    assert_eq!(client.webhooks().base_path(), "/admin/api/webhooks");
    assert_eq!(client.settings().base_path(), "/admin/api/settings");
}

#[test]
fn service_children_share_the_client_transport() {
    let stub = StubTransport::new();
    stub.respond(json!({"service": {"id": 1}}))
        .respond(json!({"metrics": []}));

    let client = Client::with_transport(dyn_transport(&stub));
    let service = client.services().read(1).unwrap();
    service.metrics().unwrap().list(None).unwrap();

    assert_eq!(stub.count(), 2);
}

#[test]
fn active_docs_are_read_by_scanning() {
    let stub = StubTransport::new();
    stub.respond(json!({"api_docs": [
        {"api_doc": {"id": 1, "system_name": "petstore"}},
        {"api_doc": {"id": 2, "system_name": "orders"}}
    ]}));

    let client = Client::with_transport(dyn_transport(&stub));
    let doc = client.active_docs().read(2).unwrap();

    assert_eq!(doc.get("system_name").unwrap(), Some(json!("orders")));
    assert_eq!(stub.last().path, "/admin/api/active_docs");
}

// ── Analytics ───────────────────────────────────────────────────────

#[test]
fn usage_hits_stats_path_with_filters() {
    let stub = StubTransport::new();
    stub.respond(json!({"total": 42, "values": [40, 2], "change": 5.0}));

    let client = Client::with_transport(dyn_transport(&stub));
    let since = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let query = UsageQuery::service(7, "hits", since)
        .period(Period::Day)
        .granularity(Granularity::Hour);

    let usage = client.analytics().usage_view(&query).unwrap();
    assert_eq!(usage.total, Some(42));
    assert_eq!(usage.values, vec![40, 2]);

    let request = stub.last();
    assert_eq!(request.method, "GET");
    assert_eq!(request.path, "/stats/services/7/usage");
    let params = request.params.unwrap();
    assert_eq!(params["metric_name"], "hits");
    assert_eq!(params["since"], "2024-03-01");
    assert_eq!(params["period"], "day");
    assert_eq!(params["granularity"], "hour");
}

#[test]
fn empty_usage_is_null() {
    let stub = StubTransport::new();
    stub.respond_empty();

    let client = Client::with_transport(dyn_transport(&stub));
    let since = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let usage = client
        .analytics()
        .usage(&UsageQuery::application(3, "hits", since))
        .unwrap();

    assert!(usage.is_null());
    assert_eq!(stub.last().path, "/stats/applications/3/usage");
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn config_requires_some_credential() {
    let err = ClientConfig::new("https://acme-admin.example.com", None, None).unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}

#[test]
fn access_token_wins_over_provider_key() {
    let config = ClientConfig::new(
        "https://acme-admin.example.com",
        secret("key"),
        secret("token"),
    )
    .unwrap();
    assert!(matches!(config.credentials, Credentials::AccessToken(_)));
}

#[test]
fn malformed_endpoint_fails_at_construction() {
    let config = ClientConfig::new("::not a url::", secret("key"), None).unwrap();
    let err = Client::new(&config).unwrap_err();
    assert!(matches!(err, Error::InvalidUrl(_)));
}

// Manager behaviour against a recording stub transport.
#![allow(clippy::unwrap_used)]

mod common;

use pretty_assertions::assert_eq;
use serde_json::json;

use common::{StubTransport, dyn_transport};
use threescale_api::{
    Entity, EntityId, Error, Manager, Metric, Resource, ResourceKind, Scope, Service, params,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn attrs(value: serde_json::Value) -> Entity {
    Entity::from_value(value).unwrap()
}

fn services(stub: &std::sync::Arc<StubTransport>) -> Manager<Service> {
    Manager::root(dyn_transport(stub))
}

// ── Create / read ───────────────────────────────────────────────────

#[test]
fn create_service_unwraps_entity() {
    let stub = StubTransport::new();
    stub.respond(json!({"service": {"id": 1, "name": "x"}}));

    let service = services(&stub).create(&attrs(json!({"name": "x"}))).unwrap();

    assert_eq!(service.get("name").unwrap(), Some(json!("x")));
    assert_eq!(service.get("id").unwrap(), Some(json!(1)));
    assert_eq!(service.id(), Some(&EntityId::from(1)));

    let request = stub.last();
    assert_eq!(request.method, "POST");
    assert_eq!(request.path, "/admin/api/services");
    assert_eq!(request.body, Some(json!({"name": "x"})));
}

#[test]
fn create_then_read_round_trips_supplied_fields() {
    let stub = StubTransport::new();
    stub.respond(json!({"service": {"id": 4, "name": "svc", "system_name": "svc_sys"}}))
        .respond(json!({
            "service": {"id": 4, "name": "svc", "system_name": "svc_sys", "state": "incomplete"}
        }));

    let manager = services(&stub);
    let created = manager
        .create(&attrs(json!({"name": "svc", "system_name": "svc_sys"})))
        .unwrap();
    let read = manager.read(created.id().cloned().unwrap()).unwrap();

    let entity = read.entity().unwrap();
    assert_eq!(entity["name"], "svc");
    assert_eq!(entity["system_name"], "svc_sys");
    assert_eq!(stub.last().path, "/admin/api/services/4");
}

#[test]
fn read_without_entity_key_falls_back_to_bare_mapping() {
    let stub = StubTransport::new();
    stub.respond(json!({"id": 7, "name": "y"}));

    let service = services(&stub).read(7).unwrap();

    assert_eq!(service.to_entity().unwrap(), attrs(json!({"id": 7, "name": "y"})));
}

#[test]
fn read_propagates_not_found() {
    let stub = StubTransport::new();
    stub.respond_not_found("/admin/api/services/9");

    let err = services(&stub).read(9).unwrap_err();

    assert!(matches!(err, Error::NotFound(ref raw) if raw.status == 404));
    assert!(err.is_not_found());
}

#[test]
fn prepare_defers_the_request_until_first_access() {
    let stub = StubTransport::new();
    stub.respond_not_found("/admin/api/services/9");

    let service = services(&stub).prepare(9);
    assert_eq!(stub.count(), 0);
    assert!(!service.is_loaded());

    let err = service.get("name").unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(stub.count(), 1);
}

#[test]
fn lazy_handle_fetches_once() {
    let stub = StubTransport::new();
    stub.respond(json!({"service": {"id": 3, "name": "lazy"}}));

    let service = services(&stub).prepare(3);
    assert_eq!(service.get("name").unwrap(), Some(json!("lazy")));
    assert_eq!(service.name().unwrap().as_deref(), Some("lazy"));
    assert_eq!(stub.count(), 1);
}

#[test]
fn empty_body_on_create_is_unrecognized() {
    let stub = StubTransport::new();
    stub.respond_empty();

    let err = services(&stub).create(&Entity::new()).unwrap_err();
    assert!(matches!(err, Error::UnrecognizedResponse { .. }));
}

// ── List / find / select ────────────────────────────────────────────

#[test]
fn list_extracts_plural_collection() {
    let stub = StubTransport::new();
    stub.respond(json!({"plans": [{"application_plan": {"id": 5}}]}));

    let scope = Scope::root().with(ResourceKind::Service, 1);
    let plans = Manager::for_kind(dyn_transport(&stub), ResourceKind::ApplicationPlan, scope)
        .unwrap()
        .list(None)
        .unwrap();

    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].to_entity().unwrap(), attrs(json!({"id": 5})));
    assert_eq!(stub.last().path, "/admin/api/services/1/application_plans");
}

#[test]
fn list_forwards_params() {
    let stub = StubTransport::new();
    stub.respond(json!({"services": []}));

    let page = params([("page", "2")]);
    let listed = services(&stub).list(Some(&page)).unwrap();

    assert!(listed.is_empty());
    assert_eq!(stub.last().params, Some(page));
}

#[test]
fn list_without_collection_key_fails_fast() {
    let stub = StubTransport::new();
    stub.respond(json!({"unexpected": []}));

    let err = services(&stub).list(None).unwrap_err();
    assert!(matches!(err, Error::MissingCollection { ref key } if key == "services"));
}

#[test]
fn find_and_select_filter_client_side() {
    let stub = StubTransport::new();
    let body = json!({"services": [
        {"service": {"id": 1, "state": "incomplete"}},
        {"service": {"id": 2, "state": "published"}},
        {"service": {"id": 3, "state": "published"}}
    ]});
    stub.respond(body.clone()).respond(body);

    let manager = services(&stub);
    let found = manager
        .find(None, |e| e.str("state") == Some("published"))
        .unwrap()
        .unwrap();
    assert_eq!(found.id(), Some(&EntityId::from(2)));

    let selected = manager
        .select(None, |e| e.str("state") == Some("published"))
        .unwrap();
    assert_eq!(selected.len(), 2);
}

#[test]
fn read_by_name_prefers_higher_priority_field() {
    let stub = StubTransport::new();
    stub.respond(json!({"metrics": [
        {"metric": {"id": 1, "friendly_name": "target"}},
        {"metric": {"id": 2, "system_name": "target"}}
    ]}));

    let metrics: Manager<Metric> = Manager::new(
        dyn_transport(&stub),
        Scope::root().with(ResourceKind::Service, 10),
    )
    .unwrap();

    let hit = metrics.read_by_name("target").unwrap().unwrap();
    assert_eq!(hit.id(), Some(&EntityId::from(2)));
}

#[test]
fn read_by_name_misses_cleanly() {
    let stub = StubTransport::new();
    stub.respond(json!({"services": [{"service": {"id": 1, "name": "a"}}]}));

    assert!(services(&stub).read_by_name("zzz").unwrap().is_none());
}

// ── Update / delete ─────────────────────────────────────────────────

#[test]
fn update_takes_id_from_attributes() {
    let stub = StubTransport::new();
    stub.respond(json!({"service": {"id": 5, "name": "renamed"}}));

    let updated = services(&stub)
        .update(&attrs(json!({"id": 5, "name": "renamed"})), None)
        .unwrap();

    let request = stub.last();
    assert_eq!(request.method, "PUT");
    assert_eq!(request.path, "/admin/api/services/5");
    assert_eq!(updated.get("name").unwrap(), Some(json!("renamed")));
}

#[test]
fn update_without_any_id_is_rejected() {
    let stub = StubTransport::new();

    let err = services(&stub)
        .update(&attrs(json!({"name": "x"})), None)
        .unwrap_err();

    assert!(matches!(err, Error::MissingId { kind: ResourceKind::Service }));
    assert_eq!(stub.count(), 0);
}

#[test]
fn delete_returns_true_then_second_delete_is_not_found() {
    let stub = StubTransport::new();
    stub.respond_empty()
        .respond(json!({"services": []}))
        .respond_not_found("/admin/api/services/8");

    let manager = services(&stub);
    assert!(manager.delete(8, None).unwrap());
    let remaining = manager.list(None).unwrap();
    assert!(remaining.iter().all(|s| s.id() != Some(&EntityId::from(8))));

    let err = manager.delete(8, None).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(stub.requests()[0].method, "DELETE");
}

// ── Index operations ────────────────────────────────────────────────

#[test]
fn lookup_dispatches_on_key_shape() {
    let stub = StubTransport::new();
    stub.respond(json!({"service": {"id": 1, "name": "one"}}))
        .respond(json!({"services": [{"service": {"id": 2, "system_name": "two"}}]}));

    let manager = services(&stub);
    manager.lookup(1).unwrap();
    assert_eq!(stub.last().path, "/admin/api/services/1");

    let by_name = manager.lookup("two").unwrap();
    assert_eq!(by_name.id(), Some(&EntityId::from(2)));
    assert_eq!(stub.last().path, "/admin/api/services");
}

#[test]
fn assign_unknown_name_is_missing() {
    let stub = StubTransport::new();
    stub.respond(json!({"services": []}));

    let err = services(&stub)
        .assign("ghost", &attrs(json!({"name": "x"})))
        .unwrap_err();
    assert!(matches!(err, Error::Missing { ref key, .. } if key == "ghost"));
}

#[test]
fn assign_resolves_name_then_updates() {
    let stub = StubTransport::new();
    stub.respond(json!({"services": [{"service": {"id": 6, "system_name": "api"}}]}))
        .respond(json!({"service": {"id": 6, "name": "new"}}));

    services(&stub)
        .assign("api", &attrs(json!({"name": "new"})))
        .unwrap();

    let request = stub.last();
    assert_eq!(request.method, "PUT");
    assert_eq!(request.path, "/admin/api/services/6");
}

// ── Validation payloads ─────────────────────────────────────────────

#[test]
fn validation_errors_raise_api_error() {
    let stub = StubTransport::new();
    stub.respond(json!({"errors": {"name": ["can't be blank"]}}));

    let err = services(&stub).create(&Entity::new()).unwrap_err();
    match err {
        Error::Api { message, .. } => assert_eq!(message, "name can't be blank"),
        other => panic!("unexpected error: {other:?}"),
    }
}

// ── Custom managers ─────────────────────────────────────────────────

#[test]
fn custom_manager_defaults_collection_key() {
    let stub = StubTransport::new();
    stub.respond(json!({"widgets": [{"widget": {"id": 1}}]}));

    let manager: Manager<Resource> = Manager::custom(
        dyn_transport(&stub),
        ResourceKind::Service,
        "widget",
        None,
        "/admin/api/widgets",
    );
    assert_eq!(manager.collection_key(), "widgets");
    assert_eq!(manager.list(None).unwrap().len(), 1);
}

#[test]
fn scoped_manager_requires_its_parents() {
    let stub = StubTransport::new();
    let err = Manager::<Metric>::new(dyn_transport(&stub), Scope::root()).unwrap_err();
    assert!(matches!(err, Error::MissingScope { .. }));
}

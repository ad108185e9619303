//! End-to-end provider behaviour against a stubbed Boundary controller.

use boundary_provider::testing::{
    assert_error_contains, assert_plan_creates, assert_plan_deletes, assert_plan_no_changes, ProviderTester, TestError,
};
use boundary_provider::{BoundaryProvider, ProviderError, ProviderService};
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "at_1234567890_test";

async fn configured(server: &MockServer) -> ProviderTester<BoundaryProvider> {
    let tester = ProviderTester::new(BoundaryProvider::new());
    tester
        .configure(json!({"addr": server.uri(), "token": TOKEN}))
        .await
        .unwrap();
    tester
}

fn ok(body: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({
        "kind": "NotFound",
        "message": "Resource not found."
    }))
}

#[tokio::test]
async fn test_host_catalog_create_and_read() {
    let server = MockServer::start().await;
    let catalog = json!({
        "id": "hcst_1234567890",
        "scope_id": "p_1234567890",
        "type": "static",
        "name": "backend",
        "version": 1
    });

    Mock::given(method("POST"))
        .and(path("/v1/host-catalogs"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .and(body_json(json!({"scope_id": "p_1234567890", "type": "static", "name": "backend"})))
        .respond_with(ok(catalog.clone()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/host-catalogs/hcst_1234567890"))
        .respond_with(ok(catalog))
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let config = json!({"scope_id": "p_1234567890", "type": "static", "name": "backend"});
    assert_plan_creates(&tester.plan_create("boundary_host_catalog", config.clone()).await.unwrap());

    let state = tester
        .lifecycle_create("boundary_host_catalog", config)
        .await
        .unwrap();
    assert_eq!(
        state,
        json!({
            "id": "hcst_1234567890",
            "scope_id": "p_1234567890",
            "type": "static",
            "name": "backend",
            "description": null
        })
    );
}

#[tokio::test]
async fn test_update_reads_current_version_first() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/hosts/hst_1234567890"))
        .respond_with(ok(json!({"id": "hst_1234567890", "version": 4})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v1/hosts/hst_1234567890"))
        .and(body_json(json!({
            "attributes": {"address": "10.0.0.2"},
            "name": null,
            "version": 4
        })))
        .respond_with(ok(json!({
            "id": "hst_1234567890",
            "host_catalog_id": "hcst_1234567890",
            "type": "static",
            "attributes": {"address": "10.0.0.2"},
            "version": 5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let prior = json!({
        "id": "hst_1234567890",
        "host_catalog_id": "hcst_1234567890",
        "type": "static",
        "name": "db",
        "address": "10.0.0.1"
    });
    let plan = tester
        .plan_update(
            "boundary_host",
            prior.clone(),
            json!({"host_catalog_id": "hcst_1234567890", "type": "static", "address": "10.0.0.2"}),
        )
        .await
        .unwrap();
    assert!(!plan.requires_replace);
    let mut changed = plan.changed_paths();
    changed.sort();
    assert_eq!(changed, vec!["address", "name"]);

    let state = tester
        .update("boundary_host", prior, plan.planned_state)
        .await
        .unwrap();
    assert_eq!(state["address"], "10.0.0.2");
    assert_eq!(state["name"], Value::Null);
}

#[tokio::test]
async fn test_empty_strings_clear_fields() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/hosts/hst_1234567890"))
        .respond_with(ok(json!({"id": "hst_1234567890", "version": 3})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v1/hosts/hst_1234567890"))
        .and(body_json(json!({
            "attributes": {"address": null},
            "name": null,
            "version": 3
        })))
        .respond_with(ok(json!({
            "id": "hst_1234567890",
            "host_catalog_id": "hcst_1234567890",
            "type": "static",
            "version": 4
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let prior = json!({
        "id": "hst_1234567890",
        "host_catalog_id": "hcst_1234567890",
        "type": "static",
        "name": "db",
        "address": "10.0.0.1"
    });
    let planned = json!({
        "id": "hst_1234567890",
        "host_catalog_id": "hcst_1234567890",
        "type": "static",
        "name": "",
        "address": ""
    });

    let state = tester.update("boundary_host", prior, planned).await.unwrap();
    assert_eq!(state["name"], Value::Null);
    assert_eq!(state["address"], Value::Null);
}

#[tokio::test]
async fn test_update_without_changes_sends_nothing() {
    let server = MockServer::start().await;
    let tester = configured(&server).await;

    let prior = json!({
        "id": "hcst_1234567890",
        "scope_id": "p_1234567890",
        "type": "static",
        "name": "backend",
        "description": null
    });
    assert_plan_no_changes(
        &tester
            .plan_update(
                "boundary_host_catalog",
                prior.clone(),
                json!({"scope_id": "p_1234567890", "type": "static", "name": "backend"}),
            )
            .await
            .unwrap(),
    );

    let state = tester
        .update("boundary_host_catalog", prior.clone(), prior.clone())
        .await
        .unwrap();
    assert_eq!(state, prior);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_read_of_deleted_resource_is_null() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/host-sets/hsst_1234567890"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let state = tester
        .read("boundary_host_set", json!({"id": "hsst_1234567890"}))
        .await
        .unwrap();
    assert_eq!(state, Value::Null);
}

#[tokio::test]
async fn test_read_propagates_other_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/roles/r_1234567890"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "kind": "PermissionDenied",
            "message": "Forbidden."
        })))
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let err = tester
        .read("boundary_role", json!({"id": "r_1234567890"}))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "error reading role: 403 PermissionDenied: Forbidden.");
}

#[tokio::test]
async fn test_delete_of_missing_resource_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/hosts/hst_1234567890"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let state = json!({"id": "hst_1234567890", "host_catalog_id": "hcst_1", "type": "static"});
    assert_plan_deletes(&tester.plan_delete("boundary_host", state.clone()).await.unwrap());

    let err = tester.delete("boundary_host", state).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_password_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/auth-methods/ampw_1234567890:authenticate"))
        .and(body_json(json!({
            "command": "login",
            "attributes": {"login_name": "admin", "password": "password"}
        })))
        .respond_with(ok(json!({"attributes": {"token": "at_from_login"}})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/hosts/hst_1234567890"))
        .and(header("authorization", "Bearer at_from_login"))
        .respond_with(ok(json!({
            "id": "hst_1234567890",
            "host_catalog_id": "hcst_1234567890",
            "type": "static",
            "attributes": {"address": "10.0.0.1"},
            "version": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tester = ProviderTester::new(BoundaryProvider::new());
    tester
        .configure(json!({
            "addr": server.uri(),
            "auth_method_id": "ampw_1234567890",
            "password_auth_method_login_name": "admin",
            "password_auth_method_password": "password"
        }))
        .await
        .unwrap();
    assert!(tester.provider().is_configured().await);

    let state = tester
        .read("boundary_host", json!({"id": "hst_1234567890"}))
        .await
        .unwrap();
    assert_eq!(state["address"], "10.0.0.1");
}

#[tokio::test]
async fn test_host_set_create_applies_hosts_with_created_version() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/host-sets"))
        .and(body_json(json!({"host_catalog_id": "hcst_1234567890", "type": "static", "name": "web"})))
        .respond_with(ok(json!({
            "id": "hsst_1234567890",
            "host_catalog_id": "hcst_1234567890",
            "type": "static",
            "name": "web",
            "version": 1
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/host-sets/hsst_1234567890:set-hosts"))
        .and(body_json(json!({"host_ids": ["hst_1", "hst_2"], "version": 1})))
        .respond_with(ok(json!({
            "id": "hsst_1234567890",
            "host_catalog_id": "hcst_1234567890",
            "type": "static",
            "name": "web",
            "host_ids": ["hst_2", "hst_1"],
            "version": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let plan = tester
        .plan_create(
            "boundary_host_set",
            json!({
                "host_catalog_id": "hcst_1234567890",
                "type": "static",
                "name": "web",
                "host_ids": ["hst_1", "hst_2"]
            }),
        )
        .await
        .unwrap();
    let state = tester
        .create("boundary_host_set", plan.planned_state)
        .await
        .unwrap();
    assert_eq!(state["id"], "hsst_1234567890");
    assert_eq!(state["host_ids"], json!(["hst_1", "hst_2"]));
}

#[tokio::test]
async fn test_host_set_update_chains_versions() {
    let server = MockServer::start().await;
    let set = |name: &str, hosts: Value, version: u32| {
        json!({
            "id": "hsst_1234567890",
            "host_catalog_id": "hcst_1234567890",
            "type": "static",
            "name": name,
            "host_ids": hosts,
            "version": version
        })
    };

    Mock::given(method("GET"))
        .and(path("/v1/host-sets/hsst_1234567890"))
        .respond_with(ok(set("web", json!(["hst_1"]), 5)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/v1/host-sets/hsst_1234567890"))
        .and(body_json(json!({"name": "frontend", "version": 5})))
        .respond_with(ok(set("frontend", json!(["hst_1"]), 6)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/host-sets/hsst_1234567890:set-hosts"))
        .and(body_json(json!({"host_ids": ["hst_1", "hst_2"], "version": 6})))
        .respond_with(ok(set("frontend", json!(["hst_1", "hst_2"]), 7)))
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let prior = json!({
        "id": "hsst_1234567890",
        "host_catalog_id": "hcst_1234567890",
        "type": "static",
        "name": "web",
        "description": null,
        "host_ids": ["hst_1"]
    });
    let planned = json!({
        "id": "hsst_1234567890",
        "host_catalog_id": "hcst_1234567890",
        "type": "static",
        "name": "frontend",
        "description": null,
        "host_ids": ["hst_1", "hst_2"]
    });

    let state = tester
        .update("boundary_host_set", prior, planned)
        .await
        .unwrap();
    assert_eq!(state["name"], "frontend");
    assert_eq!(state["host_ids"], json!(["hst_1", "hst_2"]));
}

#[tokio::test]
async fn test_role_create_sets_principals_then_grants() {
    let server = MockServer::start().await;
    let role = |principals: Value, grants: Value, version: u32| {
        json!({
            "id": "r_1234567890",
            "scope_id": "o_1234567890",
            "name": "ops",
            "grant_scope_id": "o_1234567890",
            "principal_ids": principals,
            "grant_strings": grants,
            "version": version
        })
    };

    Mock::given(method("POST"))
        .and(path("/v1/roles"))
        .and(body_json(json!({"scope_id": "o_1234567890", "name": "ops"})))
        .respond_with(ok(role(json!([]), json!([]), 1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/roles/r_1234567890:set-principals"))
        .and(body_json(json!({"principal_ids": ["u_1234567890"], "version": 1})))
        .respond_with(ok(role(json!(["u_1234567890"]), json!([]), 2)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/roles/r_1234567890:set-grants"))
        .and(body_json(json!({"grant_strings": ["ids=*;type=*;actions=read"], "version": 2})))
        .respond_with(ok(role(
            json!(["u_1234567890"]),
            json!(["ids=*;type=*;actions=read"]),
            3,
        )))
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let state = tester
        .create(
            "boundary_role",
            json!({
                "scope_id": "o_1234567890",
                "name": "ops",
                "principal_ids": ["u_1234567890"],
                "grant_strings": ["ids=*;type=*;actions=read"]
            }),
        )
        .await
        .unwrap();
    assert_eq!(state["grant_scope_id"], "o_1234567890");
    assert_eq!(state["principal_ids"], json!(["u_1234567890"]));
    assert_eq!(state["grant_strings"], json!(["ids=*;type=*;actions=read"]));
}

#[tokio::test]
async fn test_controller_led_worker_keeps_activation_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/workers:create:controller-led"))
        .and(body_json(json!({"scope_id": "global", "name": "edge"})))
        .respond_with(ok(json!({
            "id": "w_1234567890",
            "scope_id": "global",
            "name": "edge",
            "controller_generated_activation_token": "neslat_1234567890",
            "version": 1
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/workers/w_1234567890"))
        .respond_with(ok(json!({
            "id": "w_1234567890",
            "scope_id": "global",
            "name": "edge",
            "authorized_actions": ["read", "update", "delete"],
            "version": 1
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let state = tester
        .lifecycle_create("boundary_worker", json!({"name": "edge"}))
        .await
        .unwrap();
    assert_eq!(state["scope_id"], "global");
    assert_eq!(state["controller_generated_activation_token"], "neslat_1234567890");
    assert_eq!(state["worker_generated_auth_token"], Value::Null);
    assert_eq!(state["authorized_actions"], json!(["read", "update", "delete"]));
}

#[tokio::test]
async fn test_worker_led_registration() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/workers:create:worker-led"))
        .and(body_json(json!({"scope_id": "global", "worker_generated_auth_token": "wgat_token"})))
        .respond_with(ok(json!({"id": "w_2", "scope_id": "global", "version": 1})))
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let plan = tester
        .plan_create("boundary_worker", json!({"worker_generated_auth_token": "wgat_token"}))
        .await
        .unwrap();
    let state = tester
        .create("boundary_worker", plan.planned_state)
        .await
        .unwrap();
    assert_eq!(state["id"], "w_2");
    assert_eq!(state["worker_generated_auth_token"], "wgat_token");
}

#[tokio::test]
async fn test_import_existing_and_missing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/host-catalogs/hcst_1234567890"))
        .respond_with(ok(json!({
            "id": "hcst_1234567890",
            "scope_id": "p_1234567890",
            "type": "static",
            "version": 2
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/host-catalogs/hcst_missing"))
        .respond_with(not_found())
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let imported = assert_ok!(
        tester
            .import_resource("boundary_host_catalog", "hcst_1234567890")
            .await
    );
    assert_eq!(imported.len(), 1);
    assert_eq!(imported[0].resource_type, "boundary_host_catalog");
    assert_eq!(imported[0].state["scope_id"], "p_1234567890");

    let err = tester
        .import_resource("boundary_host_catalog", "hcst_missing")
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::NotFound(_)));
}

#[tokio::test]
async fn test_scopes_data_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/scopes"))
        .and(query_param("scope_id", "global"))
        .and(query_param("recursive", "true"))
        .respond_with(ok(json!({
            "items": [{
                "id": "o_1234567890",
                "scope_id": "global",
                "scope": {"id": "global", "type": "global", "name": "global"},
                "name": "ops",
                "type": "org",
                "version": 1,
                "authorized_actions": ["read"],
                "not_in_schema": true
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let tester = configured(&server).await;
    let config = json!({"scope_id": "global", "recursive": true});
    tester
        .validate_data_source_config("boundary_scopes", config.clone())
        .await
        .unwrap();

    let state = tester
        .read_data_source("boundary_scopes", config)
        .await
        .unwrap();
    assert_eq!(state["id"], "scopes");
    assert_eq!(state["filter"], Value::Null);
    assert_eq!(state["recursive"], true);

    let item = &state["items"][0];
    assert_eq!(item["name"], "ops");
    assert_eq!(item["version"], 1);
    assert_eq!(item["description"], Value::Null);
    assert_eq!(item["scope"], json!([{
        "id": "global",
        "type": "global",
        "name": "global",
        "description": null,
        "parent_scope_id": null
    }]));
    assert!(item.get("not_in_schema").is_none());
}

#[tokio::test]
async fn test_calls_before_configure_fail() {
    let tester = ProviderTester::new(BoundaryProvider::new());
    let err = assert_err!(
        tester
            .create("boundary_host", json!({"host_catalog_id": "hcst_1", "type": "static"}))
            .await
    );
    assert!(matches!(err, ProviderError::Configuration(_)));

    let err = assert_err!(tester.read_data_source("boundary_users", json!({})).await);
    assert!(matches!(err, ProviderError::Configuration(_)));

    assert_ok!(tester.stop().await);
}

#[tokio::test]
async fn test_validation_diagnostics() {
    let tester = ProviderTester::new(BoundaryProvider::new());

    match tester
        .validate_resource_config("boundary_host", json!({"type": "static", "port": 22}))
        .await
    {
        Err(TestError::Diagnostics(diagnostics)) => {
            assert_error_contains(&diagnostics, "Missing required attribute 'host_catalog_id'");
            assert_error_contains(&diagnostics, "Unsupported attribute 'port'");
        },
        other => panic!("expected diagnostics, got {:?}", other),
    }

    match tester
        .validate_provider_config(json!({"addr": "http://127.0.0.1:9200", "tls_insecure": "yes"}))
        .await
    {
        Err(TestError::Diagnostics(diagnostics)) => assert_eq!(diagnostics.len(), 1),
        other => panic!("expected diagnostics, got {:?}", other),
    }

    let diagnostics = tester
        .provider()
        .validate_data_source_config("boundary_groups", json!({"recursive": "yes"}))
        .await
        .unwrap();
    assert_eq!(diagnostics[0].attribute.as_deref(), Some("recursive"));

    let err = tester
        .validate_resource_config("boundary_target", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, TestError::Provider(ProviderError::UnknownResource(_))));
}

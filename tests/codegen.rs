//! Data source generation from a Swagger document.

use std::path::{Path, PathBuf};

use boundary_provider::codegen::{self, DataSourceTarget, Swagger};
use boundary_provider::ProviderError;

fn fixture() -> Swagger {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/boundary.swagger.json");
    Swagger::from_path(&path).unwrap()
}

fn file_names(paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect()
}

#[test]
fn test_generate_default_targets() {
    let out = tempfile::tempdir().unwrap();
    let written = codegen::generate(&fixture(), &codegen::default_targets(), out.path()).unwrap();

    assert_eq!(
        file_names(&written),
        vec!["auth_methods.rs", "groups.rs", "scopes.rs", "users.rs", "mod.rs"]
    );

    let users = std::fs::read_to_string(out.path().join("users.rs")).unwrap();
    assert!(users.starts_with("// Code generated by boundary-provider generate. DO NOT EDIT.\n"));
    assert!(users.contains("// Source: UserService_ListUsers (GET /v1/users)"));
    assert!(users.contains("    collection: \"users\",\n"));
    assert!(users.contains(
        ".with_attribute(\"account_ids\", Attribute::new(AttributeType::list(AttributeType::String), AttributeFlags::computed()))"
    ));
    assert!(users.contains("                        \"accounts\",\n"));

    let auth_methods = std::fs::read_to_string(out.path().join("auth_methods.rs")).unwrap();
    assert!(auth_methods.contains(
        ".with_attribute(\"attributes\", Attribute::new(AttributeType::Dynamic, AttributeFlags::computed()))"
    ));
    assert!(auth_methods.contains(
        ".with_attribute(\"authorized_collection_actions\", Attribute::new(AttributeType::map(AttributeType::Dynamic), AttributeFlags::computed()))"
    ));

    let index = std::fs::read_to_string(out.path().join("mod.rs")).unwrap();
    assert!(index.contains("mod auth_methods;\nmod groups;\nmod scopes;\nmod users;\n"));
}

#[test]
fn test_committed_modules_are_up_to_date() {
    let out = tempfile::tempdir().unwrap();
    codegen::generate(&fixture(), &codegen::default_targets(), out.path()).unwrap();

    let committed = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/datasources/generated");
    for name in ["auth_methods.rs", "groups.rs", "scopes.rs", "users.rs", "mod.rs"] {
        let generated = std::fs::read_to_string(out.path().join(name)).unwrap();
        let expected = std::fs::read_to_string(committed.join(name)).unwrap();
        assert_eq!(generated.trim_end(), expected.trim_end(), "{} is stale", name);
    }
}

#[test]
fn test_generate_is_deterministic() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    let targets: Vec<DataSourceTarget> = vec!["boundary_groups=/v1/groups".parse().unwrap()];

    codegen::generate(&fixture(), &targets, first.path()).unwrap();
    codegen::generate(&fixture(), &targets, second.path()).unwrap();

    for name in ["groups.rs", "mod.rs"] {
        assert_eq!(
            std::fs::read_to_string(first.path().join(name)).unwrap(),
            std::fs::read_to_string(second.path().join(name)).unwrap()
        );
    }
}

#[test]
fn test_missing_list_path_names_the_path() {
    let out = tempfile::tempdir().unwrap();
    let targets = vec!["boundary_targets=/v1/targets".parse().unwrap()];

    let err = codegen::generate(&fixture(), &targets, out.path()).unwrap_err();
    assert!(matches!(err, ProviderError::Codegen(_)));
    assert!(err.to_string().contains("/v1/targets"), "{}", err);
    assert!(!out.path().join("mod.rs").exists());
}

#[test]
fn test_rejects_colliding_modules_and_empty_targets() {
    let out = tempfile::tempdir().unwrap();
    let targets: Vec<DataSourceTarget> = vec![
        "boundary_users=/v1/users".parse().unwrap(),
        "users=/v1/users".parse().unwrap(),
    ];
    assert!(codegen::generate(&fixture(), &targets, out.path()).is_err());
    assert!(codegen::generate(&fixture(), &[], out.path()).is_err());
}

//! Variable resolution tests, including environment files and dynamic
//! functions that read the process environment.

use super::{init_test_env, write_file};
use chrono::{DateTime, Utc};
use dothttp::environment::{load_variables, parse_variables, EnvironmentConfig};
use dothttp::variables::{
    apply_offset, has_unresolved_variables, parse_datetime_arguments, variable_names,
    VariableResolver,
};
use dothttp::Error;
use proptest::prelude::*;
use serial_test::serial;
use std::env;
use tempfile::TempDir;
use uuid::Uuid;

const ENV_FILE: &str = r#"{
    "$shared": { "apiVersion": "v2", "retries": 3 },
    "dev": { "baseUrl": "http://localhost:8080", "token": "dev-token" },
    "prod": { "baseUrl": "https://api.example.com", "token": "{{secret:Vault:ApiToken}}" },
    "active": "dev"
}"#;

#[test]
fn test_resolver_from_environment_file() {
    init_test_env();
    let dir = TempDir::new().unwrap();
    write_file(&dir, "http-client.env.json", ENV_FILE);

    let config = EnvironmentConfig {
        max_parent_depth: 0,
        ..EnvironmentConfig::default()
    };
    let mut resolver = VariableResolver::new();
    resolver.set_variables(load_variables(dir.path(), &config).unwrap());

    assert_eq!(
        resolver.resolve("{{baseUrl}}/{{apiVersion}}/users?retries={{retries}}"),
        "http://localhost:8080/v2/users?retries=3"
    );
}

#[test]
fn test_secrets_pass_through() {
    let mut resolver = VariableResolver::new();
    resolver.set_variables(parse_variables(ENV_FILE, Some("prod")).unwrap());

    let header = resolver.resolve("Bearer {{token}}");
    assert_eq!(header, "Bearer {{secret:Vault:ApiToken}}");
    assert!(has_unresolved_variables(&header));
}

#[test]
fn test_unknown_environment_is_error() {
    let err = parse_variables(ENV_FILE, Some("staging")).unwrap_err();
    assert!(matches!(err, Error::EnvironmentNotFound(_)));
}

#[test]
fn test_dynamic_and_simple_mix() {
    let mut resolver = VariableResolver::new();
    resolver.set_variable("prefix", "order");

    let result = resolver.resolve("{{prefix}}-{{$guid}}");
    let (prefix, id) = result.split_once('-').unwrap();
    assert_eq!(prefix, "order");
    assert!(Uuid::parse_str(id).is_ok());
}

#[test]
fn test_idempotent_without_placeholders() {
    let resolver = VariableResolver::new();
    for text in ["", "plain text", "{ \"a\": {\"b\": 1} }", "{{", "}}", "{single}"] {
        assert_eq!(resolver.resolve(text), text);
    }
}

#[test]
fn test_unresolved_detection() {
    let mut resolver = VariableResolver::new();
    resolver.set_variable("host", "example.com");

    let text = "https://{{host}}/{{path}}";
    let resolved = resolver.resolve(text);
    assert_eq!(resolved, "https://example.com/{{path}}");
    assert!(has_unresolved_variables(&resolved));
    assert_eq!(variable_names(&resolved), vec!["path"]);
}

#[test]
fn test_timestamp_offset_applied() {
    let resolver = VariableResolver::new();
    let now = Utc::now().timestamp();
    let later: i64 = resolver.resolve("{{$timestamp 1 h}}").parse().unwrap();
    assert!((later - now - 3600).abs() <= 2);
}

#[test]
fn test_datetime_formats() {
    let resolver = VariableResolver::new();

    let iso = resolver.resolve("{{$datetime iso8601}}");
    assert!(DateTime::parse_from_rfc3339(&iso).is_ok(), "{}", iso);

    let custom = resolver.resolve("{{$datetime 'yyyy-MM-dd' -1 d}}");
    let expected = apply_offset(Utc::now(), -1, "d").format("%Y-%m-%d").to_string();
    assert_eq!(custom, expected);

    let args = parse_datetime_arguments(Some("'yyyy-MM-dd' -1 d"));
    assert_eq!(args.format.as_deref(), Some("yyyy-MM-dd"));
}

#[test]
#[serial]
fn test_process_env_lookup() {
    env::set_var("DOTHTTP_IT_TOKEN", "from-env");
    let resolver = VariableResolver::new();

    assert_eq!(resolver.resolve("{{$processEnv DOTHTTP_IT_TOKEN}}"), "from-env");
    assert_eq!(resolver.resolve("{{$dotEnv DOTHTTP_IT_TOKEN}}"), "from-env");

    env::remove_var("DOTHTTP_IT_TOKEN");
    assert_eq!(resolver.resolve("x{{$processEnv DOTHTTP_IT_TOKEN}}x"), "xx");
}

#[test]
fn test_unknown_function_passthrough() {
    let resolver = VariableResolver::new();
    assert_eq!(resolver.resolve("{{$RandomEmail}}"), "{{$randomemail}}");
}

proptest! {
    #[test]
    fn prop_random_int_within_range(min in -10_000i32..10_000, span in 1i32..10_000) {
        let max = min + span;
        let resolver = VariableResolver::new();
        let value: i32 = resolver
            .resolve(&format!("{{{{$randomInt {} {}}}}}", min, max))
            .parse()
            .unwrap();
        prop_assert!(value >= min && value < max);
    }

    #[test]
    fn prop_random_int_single_bound(max in 1i32..1_000_000) {
        let resolver = VariableResolver::new();
        let value: i32 = resolver
            .resolve(&format!("{{{{$randomInt {}}}}}", max))
            .parse()
            .unwrap();
        prop_assert!((0..max).contains(&value));
    }

    #[test]
    fn prop_text_without_braces_unchanged(text in "[^{}]{0,200}") {
        let mut resolver = VariableResolver::new();
        resolver.set_variable("a", "1");
        prop_assert_eq!(resolver.resolve(&text), text);
    }
}

//! End-to-end parser tests over complete files.

use super::{init_test_env, write_file, WORKFLOW};
use dothttp::parser::{load_file, parse_file, split_lines};
use dothttp::{Error, HttpMethod};
use proptest::prelude::*;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_workflow_structure() {
    init_test_env();
    let file = parse_file(WORKFLOW, Path::new("workflow.http"));

    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    assert!(file.is_valid());
    assert_eq!(file.requests.len(), 4);

    let keys: Vec<&str> = file.variables.keys().collect();
    assert_eq!(keys, vec!["baseUrl", "contentType"]);
    assert_eq!(file.variables.get("baseUrl"), Some("https://api.example.com"));
}

#[test]
fn test_workflow_first_request() {
    let file = parse_file(WORKFLOW, Path::new("workflow.http"));
    let login = &file.requests[0];

    assert_eq!(login.method, "POST");
    assert_eq!(login.standard_method(), Some(HttpMethod::POST));
    assert_eq!(login.url, "{{baseUrl}}/auth/login");
    assert_eq!(login.http_version.as_deref(), Some("HTTP/1.1"));
    assert_eq!(login.name.as_deref(), Some("login"));
    assert_eq!(login.separator_title.as_deref(), Some("Sign in"));
    assert_eq!(login.comments, vec!["Authenticates the test user"]);
    assert_eq!(login.line_number, 7);
    assert_eq!(login.headers.len(), 2);
    assert_eq!(login.headers.get("content-type"), Some("{{contentType}}"));
    assert_eq!(
        login.body.as_deref(),
        Some("{\n  \"username\": \"{{username}}\",\n  \"password\": \"{{password}}\"\n}")
    );
    assert!(!login.has_response_references);
    assert!(login.depends_on.is_empty());
}

#[test]
fn test_workflow_dependencies() {
    let file = parse_file(WORKFLOW, Path::new("workflow.http"));
    assert!(file.has_chained_requests());

    let me = file.request_by_name("ME").unwrap();
    assert_eq!(me.depends_on, vec!["login"]);
    assert_eq!(me.separator_title.as_deref(), Some("Current user"));

    let update = &file.requests[2];
    assert_eq!(update.name, None);
    assert_eq!(update.display_name(), "Update profile");
    assert_eq!(update.depends_on, vec!["me", "login"]);
    assert_eq!(update.variables.get("DISPLAYNAME"), Some("Ada Lovelace"));
    assert_eq!(update.line_number, 24);
}

#[test]
fn test_workflow_file_body() {
    let file = parse_file(WORKFLOW, Path::new("workflow.http"));
    let upload = file.request_by_name("upload").unwrap();

    assert!(upload.is_file_body());
    assert_eq!(upload.body, None);
    assert_eq!(
        upload.body_file_path.as_deref(),
        Some("./fixtures/{{me.response.body.$.id}}.bin")
    );
    assert_eq!(upload.separator_title, None);
    assert_eq!(upload.depends_on, vec!["me"]);
}

#[test]
fn test_simple_get_properties() {
    let file = parse_file("GET https://api.example.com/users", Path::new("simple.http"));

    assert_eq!(file.requests.len(), 1);
    let request = &file.requests[0];
    assert_eq!(request.method, "GET");
    assert_eq!(request.url, "https://api.example.com/users");
    assert_eq!(request.http_version, None);
    assert_eq!(request.line_number, 1);
    assert!(file.diagnostics.is_empty());
}

#[test]
fn test_variables_are_not_resolved_by_parser() {
    let file = parse_file(
        "@baseUrl = https://api.example.com\nGET {{baseUrl}}/users",
        Path::new("vars.http"),
    );
    assert_eq!(file.variables.get("baseUrl"), Some("https://api.example.com"));
    assert_eq!(file.requests[0].url, "{{baseUrl}}/users");
}

#[test]
fn test_repeated_references_are_deduplicated() {
    let content = "\
GET https://example.com/{{login.response.body.$.id}}
Authorization: Bearer {{login.response.body.$.token}}
X-Other: {{login.response.headers.X-Trace}}

{\"again\": \"{{login.request.body.*}}\"}
";
    let file = parse_file(content, Path::new("dedupe.http"));
    assert_eq!(file.requests[0].depends_on, vec!["login"]);
    assert!(file.requests[0].depends_on("login"));
}

#[test]
fn test_plain_variable_with_same_name_is_not_dependency() {
    let file = parse_file(
        "# @name login\nGET https://example.com/{{login}}",
        Path::new("plain.http"),
    );
    assert!(!file.requests[0].has_response_references);
    assert!(!file.has_chained_requests());
}

#[test]
fn test_load_file_from_disk() {
    let dir = TempDir::new().unwrap();
    let path = write_file(&dir, "api.http", WORKFLOW);

    let file = load_file(&path).unwrap();
    assert_eq!(file.file_path, path);
    assert_eq!(file.requests.len(), 4);
}

#[test]
fn test_load_file_errors() {
    assert!(matches!(load_file(Path::new("")), Err(Error::EmptyFilePath)));

    let dir = TempDir::new().unwrap();
    assert!(matches!(
        load_file(&dir.path().join("missing.http")),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_serializes_to_json() {
    let file = parse_file(WORKFLOW, Path::new("workflow.http"));
    let json = serde_json::to_value(&file).unwrap();

    assert_eq!(json["requests"][0]["name"], "login");
    assert_eq!(json["requests"][0]["headers"]["Content-Type"], "{{contentType}}");
    assert_eq!(json["requests"][1]["depends_on"][0], "login");
    assert_eq!(json["variables"]["baseUrl"], "https://api.example.com");
}

#[test]
fn test_split_lines_all_separators() {
    for text in [
        "line1\nline2\nline3",
        "line1\r\nline2\r\nline3",
        "line1\rline2\rline3",
        "line1\r\nline2\nline3",
        "line1\rline2\r\nline3",
    ] {
        assert_eq!(split_lines(text), vec!["line1", "line2", "line3"], "{:?}", text);
    }
}

#[test]
fn test_split_lines_keeps_empty_lines() {
    assert_eq!(split_lines("a\n\nb\n"), vec!["a", "", "b", ""]);
    assert_eq!(split_lines(""), vec![""]);
}

proptest! {
    #[test]
    fn prop_split_lines_any_separator_mix(
        lines in prop::collection::vec("[a-z0-9 ]{0,12}", 1..8),
        separators in prop::collection::vec(prop::sample::select(vec!["\n", "\r\n", "\r"]), 8),
    ) {
        let mut text = String::new();
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                text.push_str(separators[i - 1]);
            }
            text.push_str(line);
        }

        let split = split_lines(&text);
        prop_assert_eq!(split, lines.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn prop_parser_never_panics(content in "(?s).{0,400}") {
        let file = parse_file(&content, Path::new("fuzz.http"));
        for request in &file.requests {
            prop_assert!(!(request.body.is_some() && request.body_file_path.is_some()));
            prop_assert_eq!(request.has_response_references, !request.depends_on.is_empty());
        }
    }
}

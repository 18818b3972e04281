//! Request chaining tests: parse, resolve, capture, resolve again.

use super::{init_test_env, WORKFLOW};
use dothttp::chain::{missing_dependencies, resolve_request};
use dothttp::parser::parse_file;
use dothttp::variables::has_unresolved_variables;
use dothttp::{HttpResponse, ResponseBody, ResponseCapture, VariableResolver};
use std::path::Path;

fn base_resolver() -> VariableResolver {
    let mut resolver = VariableResolver::new();
    resolver.set_variable("username", "ada");
    resolver.set_variable("password", "s3cret");
    resolver
}

/// Drives the workflow the way an executor would, with canned responses.
#[tokio::test]
async fn test_workflow_in_file_order() {
    init_test_env();
    let file = parse_file(WORKFLOW, Path::new("workflow.http"));
    assert!(missing_dependencies(&file).is_empty());

    let resolver = base_resolver();
    let capture = ResponseCapture::new();

    // login
    let login = resolve_request(&file.requests[0], &file.variables, &resolver, &capture);
    assert_eq!(login.url, "https://api.example.com/auth/login");
    assert_eq!(login.http_version.as_deref(), Some("HTTP/1.1"));
    assert!(!has_unresolved_variables(login.body.as_deref().unwrap()));
    capture
        .capture(
            "login",
            HttpResponse::new(200)
                .with_header("Content-Type", "application/json")
                .with_body(r#"{"token": "jwt-123", "expires": 3600}"#),
            login.body.as_deref(),
        )
        .await
        .unwrap();

    // me
    let me = resolve_request(&file.requests[1], &file.variables, &resolver, &capture);
    assert_eq!(me.headers.get("Authorization"), Some("Bearer jwt-123"));
    let streamed: &'static [u8] = br#"{"id": 17, "name": "Ada"}"#;
    capture
        .capture(
            "me",
            HttpResponse::new(200)
                .with_header("ETag", "\"v5\"")
                .with_body(ResponseBody::from_reader(streamed)),
            None,
        )
        .await
        .unwrap();

    // update profile
    let update = resolve_request(&file.requests[2], &file.variables, &resolver, &capture);
    assert_eq!(update.method, "PATCH");
    assert_eq!(update.url, "https://api.example.com/users/17");
    assert_eq!(update.headers.get("if-match"), Some("\"v5\""));
    assert_eq!(update.headers.get("Content-Type"), Some("application/json"));
    assert_eq!(
        update.body.as_deref(),
        Some(r#"{"displayName": "Ada Lovelace", "by": "ada"}"#)
    );

    // upload
    let upload = resolve_request(&file.requests[3], &file.variables, &resolver, &capture);
    assert_eq!(upload.body, None);
    assert_eq!(upload.body_file_path.as_deref(), Some("./fixtures/17.bin"));
}

#[tokio::test]
async fn test_xml_response_chaining() {
    let content = "\
# @name feed
GET https://example.com/feed.xml

###
GET https://example.com/items/{{feed.response.body./rss/channel/item/@id}}
X-Title: {{feed.response.body./rss/channel/title}}
";
    let file = parse_file(content, Path::new("feed.http"));
    let capture = ResponseCapture::new();
    capture
        .capture(
            "feed",
            HttpResponse::new(200).with_body(
                r#"<rss><channel><title>Daily</title><item id="99"/></channel></rss>"#,
            ),
            None,
        )
        .await
        .unwrap();

    let resolved = resolve_request(
        &file.requests[1],
        &file.variables,
        &VariableResolver::new(),
        &capture,
    );
    assert_eq!(resolved.url, "https://example.com/items/99");
    assert_eq!(resolved.headers.get("x-title"), Some("Daily"));
}

#[tokio::test]
async fn test_missing_values_degrade_gracefully() {
    let content = "\
GET https://example.com/{{login.response.body.$.missing}}/{{login.response.headers.X-None}}/{{ghost.response.body.*}}
";
    let file = parse_file(content, Path::new("degrade.http"));
    let capture = ResponseCapture::new();
    capture
        .capture("login", HttpResponse::new(500).with_body("not json"), None)
        .await
        .unwrap();

    let resolved = resolve_request(
        &file.requests[0],
        &file.variables,
        &VariableResolver::new(),
        &capture,
    );
    assert_eq!(
        resolved.url,
        "https://example.com//{{login.response.headers.X-None}}/{{ghost.response.body.*}}"
    );
    assert!(has_unresolved_variables(&resolved.url));
}

#[tokio::test]
async fn test_capture_cleared_between_runs() {
    let file = parse_file(WORKFLOW, Path::new("workflow.http"));
    let capture = ResponseCapture::new();
    capture
        .capture(
            "login",
            HttpResponse::new(200).with_body(r#"{"token": "first"}"#),
            None,
        )
        .await
        .unwrap();

    let me = resolve_request(&file.requests[1], &file.variables, &base_resolver(), &capture);
    assert_eq!(me.headers.get("Authorization"), Some("Bearer first"));

    capture.clear();
    let me = resolve_request(&file.requests[1], &file.variables, &base_resolver(), &capture);
    assert_eq!(
        me.headers.get("Authorization"),
        Some("Bearer {{login.response.body.$.token}}")
    );
}

#[test]
fn test_missing_dependencies_report() {
    let content = "\
# @name b
GET https://example.com/{{a.response.body.$.id}}

###
# @name a
GET https://example.com/{{b.response.body.$.id}}
";
    let file = parse_file(content, Path::new("cycle.http"));
    let issues = missing_dependencies(&file);

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].request, "b");
    assert_eq!(issues[0].missing, vec!["a"]);
}

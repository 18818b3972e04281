//! Integration tests module
//!
//! Shared fixtures and setup for the parser, resolver and chaining suites.

pub mod chaining_test;
pub mod parser_test;
pub mod resolver_test;

use std::fs;
use std::path::PathBuf;
use std::sync::Once;
use tempfile::TempDir;

static INIT: Once = Once::new();

/// Initialize test environment (run once)
pub fn init_test_env() {
    INIT.call_once(|| {
        dothttp::logging::init_logging();
    });
}

/// Writes `content` to `name` inside `dir` and returns the path.
pub fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

/// A small API workflow exercising most of the file format.
pub const WORKFLOW: &str = r#"@baseUrl = https://api.example.com
@contentType = application/json

### Sign in
# Authenticates the test user
# @name login
POST {{baseUrl}}/auth/login HTTP/1.1
Content-Type: {{contentType}}
X-Request-Id: {{$guid}}

{
  "username": "{{username}}",
  "password": "{{password}}"
}

### Current user
# @name me
GET {{baseUrl}}/users/me
Authorization: Bearer {{login.response.body.$.token}}
Accept: application/json

### Update profile
@displayName = Ada Lovelace
PATCH {{baseUrl}}/users/{{me.response.body.$.id}}
Authorization: Bearer {{login.response.body.$.token}}
If-Match: {{me.response.headers.ETag}}
Content-Type: {{contentType}}

{"displayName": "{{displayName}}", "by": "{{login.request.body.$.username}}"}

###
// @name upload
POST {{baseUrl}}/files
Content-Type: application/octet-stream

< ./fixtures/{{me.response.body.$.id}}.bin
"#;

//! Parser and placeholder engine for `.http` request files
//!
//! This crate turns `.http` / `.rest` files into structured requests and
//! resolves the placeholders inside them, including references from one
//! request to the captured response of another.
//!
//! # Architecture
//!
//! - **models**: Parsed file and request types, response snapshots
//! - **parser**: Line-oriented state machine with `DOTHTTP001`-`DOTHTTP005` diagnostics
//! - **variables**: `{{name}}` and `{{$function}}` resolution
//! - **capture**: Captured responses, JSONPath-lite and XPath-lite evaluation
//! - **chain**: Glue for executors that send requests in sequence
//! - **environment**: Variable maps from `http-client.env.json` files
//!
//! Sending requests is out of scope. An executor resolves each request with
//! [`chain::resolve_request`], sends it with its own HTTP client, and captures
//! the response into a [`ResponseCapture`] for later requests.
//!
//! # File Format
//!
//! ```http
//! @baseUrl = https://api.example.com
//!
//! ### Sign in
//! # @name login
//! POST {{baseUrl}}/login
//! Content-Type: application/json
//!
//! {"user": "ada", "nonce": "{{$guid}}"}
//!
//! ###
//! GET {{baseUrl}}/me
//! Authorization: Bearer {{login.response.body.$.token}}
//! ```
//!
//! # Example
//!
//! ```
//! use dothttp::{parse_file, ResponseCapture, VariableResolver};
//! use dothttp::chain::resolve_request;
//! use std::path::Path;
//!
//! let file = parse_file("@host = example.com\nGET https://{{host}}/users", Path::new("api.http"));
//! assert!(file.is_valid());
//!
//! let resolved = resolve_request(
//!     &file.requests[0],
//!     &file.variables,
//!     &VariableResolver::new(),
//!     &ResponseCapture::new(),
//! );
//! assert_eq!(resolved.url, "https://example.com/users");
//! ```

pub mod capture;
pub mod chain;
pub mod environment;
pub mod error;
pub mod logging;
pub mod models;
pub mod parser;
pub mod variables;

pub use capture::{CapturedResponse, ResponseCapture};
pub use error::{Error, Result};
pub use models::{HttpMethod, HttpResponse, OrderedMap, ParsedFile, ParsedRequest, ResponseBody};
pub use parser::{load_file, parse_file, split_lines, Diagnostic, DiagnosticCode, DiagnosticSeverity};
pub use variables::VariableResolver;

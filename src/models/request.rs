//! Parsed request data model.
//!
//! A [`ParsedRequest`] is the raw, unresolved form of one request block in a
//! `.http` file. Placeholders such as `{{baseUrl}}` are kept verbatim; they
//! are substituted later by the variable resolver and response capture.

use super::map::OrderedMap;
use serde::{Deserialize, Serialize};

/// Standard HTTP request methods.
///
/// The parser accepts any alphabetic method token; this enum only describes
/// the set that does not trigger an unknown-method warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// HTTP GET method - retrieve a resource
    GET,
    /// HTTP POST method - submit data to create a resource
    POST,
    /// HTTP PUT method - replace a resource
    PUT,
    /// HTTP PATCH method - partially modify a resource
    PATCH,
    /// HTTP DELETE method - remove a resource
    DELETE,
    /// HTTP HEAD method - retrieve headers only
    HEAD,
    /// HTTP OPTIONS method - describe communication options
    OPTIONS,
    /// HTTP TRACE method - perform a message loop-back test
    TRACE,
    /// HTTP CONNECT method - establish a tunnel to the server
    CONNECT,
}

impl HttpMethod {
    /// All standard methods, in the order they are listed in diagnostics.
    pub const ALL: [HttpMethod; 9] = [
        HttpMethod::GET,
        HttpMethod::POST,
        HttpMethod::PUT,
        HttpMethod::PATCH,
        HttpMethod::DELETE,
        HttpMethod::HEAD,
        HttpMethod::OPTIONS,
        HttpMethod::TRACE,
        HttpMethod::CONNECT,
    ];

    /// Returns the string representation of the HTTP method.
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
            HttpMethod::TRACE => "TRACE",
            HttpMethod::CONNECT => "CONNECT",
        }
    }

    /// Parses a method name, ignoring case.
    ///
    /// Returns `None` for anything outside the standard set.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Some(HttpMethod::GET),
            "POST" => Some(HttpMethod::POST),
            "PUT" => Some(HttpMethod::PUT),
            "PATCH" => Some(HttpMethod::PATCH),
            "DELETE" => Some(HttpMethod::DELETE),
            "HEAD" => Some(HttpMethod::HEAD),
            "OPTIONS" => Some(HttpMethod::OPTIONS),
            "TRACE" => Some(HttpMethod::TRACE),
            "CONNECT" => Some(HttpMethod::CONNECT),
            _ => None,
        }
    }

    /// Returns `true` if `s` names one of the standard methods.
    pub fn is_standard(s: &str) -> bool {
        Self::from_str(s).is_some()
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One request block parsed from a `.http` file.
///
/// A request only exists once a syntactically valid request line was seen,
/// so `method` and `url` are always populated. `body` and `body_file_path`
/// are mutually exclusive; use [`set_body`](Self::set_body) and
/// [`set_body_file_path`](Self::set_body_file_path) to keep it that way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedRequest {
    /// Upper-cased method token. May be non-standard (see [`HttpMethod`]).
    pub method: String,

    /// Raw request target, placeholders included.
    pub url: String,

    /// Protocol version from the request line, e.g. `HTTP/1.1` or `HTTP/2`.
    pub http_version: Option<String>,

    /// Headers in file order. Lookups are case-insensitive and a repeated
    /// header name overwrites the earlier value.
    pub headers: OrderedMap,

    /// Inline body text.
    pub body: Option<String>,

    /// Path from a `< path` body line.
    pub body_file_path: Option<String>,

    /// Chaining key from a `# @name` directive.
    pub name: Option<String>,

    /// Title text following the `###` marker that opened this block.
    pub separator_title: Option<String>,

    /// Comment lines that preceded the request line.
    pub comments: Vec<String>,

    /// Request-scoped variable overrides (case-insensitive).
    pub variables: OrderedMap,

    /// Distinct request names referenced through `.response.` / `.request.`
    /// placeholders, in first-seen order.
    pub depends_on: Vec<String>,

    /// `true` iff `depends_on` is non-empty.
    pub has_response_references: bool,

    /// 1-based source line of the request line.
    pub line_number: usize,
}

impl ParsedRequest {
    /// Creates a request with the given method (upper-cased) and URL.
    pub fn new(method: impl AsRef<str>, url: impl Into<String>, line_number: usize) -> Self {
        Self {
            method: method.as_ref().to_uppercase(),
            url: url.into(),
            http_version: None,
            headers: OrderedMap::case_insensitive(),
            body: None,
            body_file_path: None,
            name: None,
            separator_title: None,
            comments: Vec::new(),
            variables: OrderedMap::case_insensitive(),
            depends_on: Vec::new(),
            has_response_references: false,
            line_number,
        }
    }

    /// Sets an inline body, clearing any file body reference.
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = Some(body.into());
        self.body_file_path = None;
    }

    /// Sets a file body reference, clearing any inline body.
    pub fn set_body_file_path(&mut self, path: impl Into<String>) {
        self.body_file_path = Some(path.into());
        self.body = None;
    }

    /// Returns `true` if the body is read from a file.
    pub fn is_file_body(&self) -> bool {
        self.body_file_path.is_some()
    }

    /// Returns the standard method, if the method token is one.
    pub fn standard_method(&self) -> Option<HttpMethod> {
        HttpMethod::from_str(&self.method)
    }

    /// Records a dependency on another request's captured exchange.
    ///
    /// Duplicate names are ignored.
    pub fn add_dependency(&mut self, name: &str) {
        if !self.depends_on.iter().any(|existing| existing == name) {
            self.depends_on.push(name.to_string());
        }
        self.has_response_references = true;
    }

    /// Returns `true` if this request references `name` via chaining.
    pub fn depends_on(&self, name: &str) -> bool {
        self.depends_on.iter().any(|existing| existing == name)
    }

    /// A human-readable label: the `@name`, else the separator title, else
    /// `METHOD URL`.
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .or_else(|| self.separator_title.clone())
            .unwrap_or_else(|| format!("{} {}", self.method, self.url))
    }
}

//! Cross-request reference placeholders.
//!
//! A reference reads a value out of another request's captured exchange:
//!
//! ```text
//! {{login.response.body.$.token}}
//! {{login.response.body./auth/token}}
//! {{login.response.body.*}}
//! {{login.response.headers.X-Session-Id}}
//! {{login.request.body.$.username}}
//! ```
//!
//! The parser uses these to compute `depends_on`; the response capture uses
//! them to substitute captured values.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const REFERENCE_PATTERN: &str =
    r"\{\{([A-Za-z0-9_-]+)\.(response|request)\.(body|headers)\.([^{}]*)\}\}";

/// Matches a reference anywhere in a text.
pub(crate) static RESPONSE_REFERENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(REFERENCE_PATTERN).expect("Failed to compile response reference regex")
});

/// Matches a text that is exactly one reference.
static EXACT_REFERENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!("^{}$", REFERENCE_PATTERN))
        .expect("Failed to compile exact response reference regex")
});

/// Which side of the captured exchange a reference reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSource {
    Response,
    Request,
}

/// Which part of the message a reference reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferencePart {
    Body,
    Headers,
}

/// A parsed `{{name.(response|request).(body|headers).remainder}}` placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseReference {
    /// The referenced request's `@name`.
    pub name: String,
    pub source: ReferenceSource,
    pub part: ReferencePart,
    /// Body path (`*`, JSONPath-lite, XPath-lite) or header name.
    pub remainder: String,
}

impl ResponseReference {
    /// Parses `text` if it consists of exactly one reference.
    pub fn parse(text: &str) -> Option<Self> {
        EXACT_REFERENCE_REGEX
            .captures(text)
            .map(|caps| Self::from_captures(&caps))
    }

    pub(crate) fn from_captures(caps: &Captures<'_>) -> Self {
        let source = match &caps[2] {
            "request" => ReferenceSource::Request,
            _ => ReferenceSource::Response,
        };
        let part = match &caps[3] {
            "headers" => ReferencePart::Headers,
            _ => ReferencePart::Body,
        };

        Self {
            name: caps[1].to_string(),
            source,
            part,
            remainder: caps[4].to_string(),
        }
    }
}

/// Distinct request names referenced in `text`, in first-seen order.
///
/// Plain `{{name}}` variables are not references and are never returned.
pub fn response_reference_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in RESPONSE_REFERENCE_REGEX.captures_iter(text) {
        let name = &caps[1];
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}

//! Parsed file data model.

use super::map::OrderedMap;
use super::request::ParsedRequest;
use crate::parser::diagnostic::{Diagnostic, DiagnosticSeverity};
use serde::Serialize;
use std::path::PathBuf;

/// The result of parsing one `.http` file.
///
/// Parsing never fails as a whole; malformed lines end up in `diagnostics`
/// and the rest of the file is still parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedFile {
    /// Label of the parsed source, usually its path.
    pub file_path: PathBuf,

    /// Variables defined before the first request (case-sensitive).
    pub variables: OrderedMap,

    /// Requests in file order.
    pub requests: Vec<ParsedRequest>,

    /// Diagnostics in the order they were raised.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParsedFile {
    /// Creates an empty file model.
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
            variables: OrderedMap::case_sensitive(),
            requests: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// `true` if any request references another request's exchange.
    pub fn has_chained_requests(&self) -> bool {
        self.requests.iter().any(|r| r.has_response_references)
    }

    /// Finds a request by its `@name`, ignoring case.
    pub fn request_by_name(&self, name: &str) -> Option<&ParsedRequest> {
        self.requests.iter().find(|r| {
            r.name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
    }

    /// Error-severity diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
    }

    /// Warning-severity diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
    }

    /// `true` if no error-severity diagnostic was raised.
    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }
}

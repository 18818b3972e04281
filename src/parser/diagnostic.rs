//! Diagnostics reported while parsing `.http` files.
//!
//! The parser never aborts on malformed input. Each problem is recorded as a
//! plain [`Diagnostic`] value carrying a stable code and a 0-based position;
//! editors and build tools convert these into their own diagnostic types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticSeverity {
    /// The construct was dropped.
    Error,
    /// The construct was kept but is suspicious.
    Warning,
}

impl fmt::Display for DiagnosticSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticSeverity::Error => write!(f, "error"),
            DiagnosticSeverity::Warning => write!(f, "warning"),
        }
    }
}

/// Stable diagnostic codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// A line that should be a request line does not match
    /// `METHOD URL [HTTP/version]`.
    #[serde(rename = "DOTHTTP001")]
    MalformedRequestLine,

    /// A header line has no `:` or an empty name.
    #[serde(rename = "DOTHTTP002")]
    InvalidHeader,

    /// An `@name = value` line is malformed.
    #[serde(rename = "DOTHTTP003")]
    InvalidVariable,

    /// Non-blank lines follow a `< path` file body reference.
    #[serde(rename = "DOTHTTP004")]
    FileBodyExtraContent,

    /// The request method is not one of the standard HTTP methods.
    #[serde(rename = "DOTHTTP005")]
    UnknownMethod,
}

impl DiagnosticCode {
    /// The stable identifier, e.g. `DOTHTTP002`.
    pub fn id(&self) -> &'static str {
        match self {
            DiagnosticCode::MalformedRequestLine => "DOTHTTP001",
            DiagnosticCode::InvalidHeader => "DOTHTTP002",
            DiagnosticCode::InvalidVariable => "DOTHTTP003",
            DiagnosticCode::FileBodyExtraContent => "DOTHTTP004",
            DiagnosticCode::UnknownMethod => "DOTHTTP005",
        }
    }

    /// The severity every diagnostic with this code carries.
    pub fn severity(&self) -> DiagnosticSeverity {
        match self {
            DiagnosticCode::FileBodyExtraContent | DiagnosticCode::UnknownMethod => {
                DiagnosticSeverity::Warning
            }
            _ => DiagnosticSeverity::Error,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A diagnostic message for a parsed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable code identifying the kind of problem.
    pub code: DiagnosticCode,
    /// Severity, derived from the code.
    pub severity: DiagnosticSeverity,
    /// Human-readable description.
    pub message: String,
    /// Zero-based line number
    pub line: usize,
    /// Zero-based character offset in the line
    pub column: usize,
}

impl Diagnostic {
    /// Creates a diagnostic; the severity follows from `code`.
    pub fn new(code: DiagnosticCode, message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: message.into(),
            line,
            column,
        }
    }

    /// The stable identifier, e.g. `DOTHTTP001`.
    pub fn id(&self) -> &'static str {
        self.code.id()
    }

    pub(crate) fn malformed_request_line(line_text: &str, line: usize, column: usize) -> Self {
        Self::new(
            DiagnosticCode::MalformedRequestLine,
            format!(
                "Malformed request line '{}'. Expected format: 'METHOD URL [HTTP/VERSION]'",
                line_text.trim()
            ),
            line,
            column,
        )
    }

    pub(crate) fn invalid_header(line_text: &str, line: usize, column: usize) -> Self {
        Self::new(
            DiagnosticCode::InvalidHeader,
            format!(
                "Invalid header format '{}'. Expected format: 'Header-Name: value'",
                line_text.trim()
            ),
            line,
            column,
        )
    }

    pub(crate) fn invalid_variable(reason: &str, line_text: &str, line: usize, column: usize) -> Self {
        Self::new(
            DiagnosticCode::InvalidVariable,
            format!(
                "Invalid variable definition '{}': {}. Expected format: '@name = value'",
                line_text.trim(),
                reason
            ),
            line,
            column,
        )
    }

    pub(crate) fn file_body_extra_content(path: &str, line: usize, column: usize) -> Self {
        Self::new(
            DiagnosticCode::FileBodyExtraContent,
            format!(
                "Content after file body reference '{}' is ignored",
                path
            ),
            line,
            column,
        )
    }

    pub(crate) fn unknown_method(method: &str, line: usize, column: usize) -> Self {
        Self::new(
            DiagnosticCode::UnknownMethod,
            format!(
                "Unknown HTTP method '{}'. Expected one of: GET, POST, PUT, PATCH, DELETE, HEAD, OPTIONS, TRACE, CONNECT",
                method
            ),
            line,
            column,
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) at {}:{}: {}",
            self.code, self.severity, self.line, self.column, self.message
        )
    }
}

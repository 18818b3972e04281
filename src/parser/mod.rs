//! HTTP request file parser.
//!
//! This module turns the text of a `.http` / `.rest` file into a
//! [`ParsedFile`]. The file is read one line at a time by a three-state
//! machine (start, headers, body). Malformed lines never abort the parse;
//! they are reported as [`Diagnostic`]s and skipped.
//!
//! ```text
//! @baseUrl = https://api.example.com
//!
//! ### Log in
//! # @name login
//! POST {{baseUrl}}/auth HTTP/1.1
//! Content-Type: application/json
//!
//! {"user": "demo"}
//!
//! ### Profile
//! GET {{baseUrl}}/me
//! Authorization: Bearer {{login.response.body.$.token}}
//! ```

pub mod diagnostic;
pub mod reference;

use crate::error::{Error, Result};
use crate::models::{HttpMethod, OrderedMap, ParsedFile, ParsedRequest};
pub use diagnostic::{Diagnostic, DiagnosticCode, DiagnosticSeverity};
use once_cell::sync::Lazy;
use regex::Regex;
pub use reference::{response_reference_names, ReferencePart, ReferenceSource, ResponseReference};
use std::path::Path;
use tracing::{debug, trace};

/// `METHOD URL [HTTP/version]`, matched against the trimmed line.
static REQUEST_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]+)\s+(\S+)(?:\s+(HTTP/\d+(?:\.\d+)?))?$")
        .expect("Failed to compile request line regex")
});

/// `@name identifier`, matched against comment text with the marker removed.
static NAME_DIRECTIVE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^@name\s+([A-Za-z0-9_-]+)$").expect("Failed to compile name directive regex")
});

/// Parses the content of an HTTP request file.
///
/// Never fails: malformed constructs become diagnostics on the returned
/// file. Empty content yields a file with no requests, variables or
/// diagnostics.
///
/// # Arguments
///
/// * `content` - The full content of the HTTP request file
/// * `file_path` - Label recorded on the result, usually the file's path
///
/// # Examples
///
/// ```
/// use dothttp::parser::parse_file;
/// use std::path::Path;
///
/// let content = "@host = api.example.com\n\nGET https://{{host}}/users\nAccept: application/json\n";
/// let file = parse_file(content, Path::new("users.http"));
///
/// assert_eq!(file.variables.get("host"), Some("api.example.com"));
/// assert_eq!(file.requests.len(), 1);
/// assert_eq!(file.requests[0].url, "https://{{host}}/users");
/// assert!(file.diagnostics.is_empty());
/// ```
pub fn parse_file(content: &str, file_path: &Path) -> ParsedFile {
    let mut parser = FileParser::new(file_path);

    if !content.is_empty() {
        for (index, line) in split_lines(content).into_iter().enumerate() {
            parser.process_line(index, line);
        }
    }

    let file = parser.finish();
    debug!(
        file = %file.file_path.display(),
        requests = file.requests.len(),
        diagnostics = file.diagnostics.len(),
        "parsed http file"
    );
    file
}

/// Reads and parses an HTTP request file from disk.
///
/// # Errors
///
/// Returns [`Error::EmptyFilePath`] for an empty path and [`Error::Io`] if
/// the file cannot be read. Problems with the file's content are reported
/// as diagnostics, never as errors.
pub fn load_file(path: &Path) -> Result<ParsedFile> {
    if path.as_os_str().is_empty() {
        return Err(Error::EmptyFilePath);
    }

    let content = std::fs::read_to_string(path)?;
    Ok(parse_file(&content, path))
}

/// Splits text into lines on `\r\n`, `\r` or `\n`.
///
/// Empty lines are preserved, including the empty line after a trailing
/// break, and a final line without a break is kept.
///
/// ```
/// use dothttp::parser::split_lines;
///
/// assert_eq!(split_lines("a\r\nb\rc\n"), vec!["a", "b", "c", ""]);
/// ```
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\r' => {
                lines.push(&text[start..i]);
                if i + 1 < bytes.len() && bytes[i + 1] == b'\n' {
                    i += 1;
                }
                start = i + 1;
            }
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }

    lines.push(&text[start..]);
    lines
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParserState {
    /// Between requests: comments, directives, variables, separators.
    Start,
    /// After a request line, until the first blank line.
    InHeaders,
    /// After the blank line, until the next separator or end of file.
    InBody,
}

/// Cursor state of one parse.
struct FileParser {
    state: ParserState,
    file: ParsedFile,
    current: Option<ParsedRequest>,
    pending_name: Option<String>,
    pending_comments: Vec<String>,
    pending_title: Option<String>,
    pending_variables: OrderedMap,
    last_header: Option<String>,
    body_lines: Vec<(usize, String)>,
}

impl FileParser {
    fn new(file_path: &Path) -> Self {
        Self {
            state: ParserState::Start,
            file: ParsedFile::new(file_path),
            current: None,
            pending_name: None,
            pending_comments: Vec::new(),
            pending_title: None,
            pending_variables: OrderedMap::case_insensitive(),
            last_header: None,
            body_lines: Vec::new(),
        }
    }

    fn process_line(&mut self, index: usize, line: &str) {
        if let Some(title) = separator_title(line) {
            if self.state != ParserState::Start {
                self.finish_request();
            }
            self.pending_title = title;
            return;
        }

        match self.state {
            ParserState::Start => self.process_start_line(index, line),
            ParserState::InHeaders => self.process_header_line(index, line),
            ParserState::InBody => self.body_lines.push((index, line.to_string())),
        }
    }

    fn process_start_line(&mut self, index: usize, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }

        if let Some(text) = comment_text(trimmed) {
            match NAME_DIRECTIVE_REGEX.captures(text) {
                Some(caps) => self.pending_name = Some(caps[1].to_string()),
                None => self.pending_comments.push(text.to_string()),
            }
            return;
        }

        if trimmed.starts_with('@') {
            self.process_variable_line(index, line, trimmed);
            return;
        }

        self.process_request_line(index, line, trimmed);
    }

    fn process_variable_line(&mut self, index: usize, line: &str, trimmed: &str) {
        match parse_variable_definition(trimmed) {
            Ok((name, value)) => {
                if self.file.requests.is_empty() && self.current.is_none() {
                    self.file.variables.insert(name, value);
                } else {
                    self.pending_variables.insert(name, value);
                }
            }
            Err(reason) => {
                trace!(line = index, reason, "invalid variable definition");
                self.file.diagnostics.push(Diagnostic::invalid_variable(
                    reason,
                    trimmed,
                    index,
                    indentation(line),
                ));
            }
        }
    }

    fn process_request_line(&mut self, index: usize, line: &str, trimmed: &str) {
        let Some(caps) = REQUEST_LINE_REGEX.captures(trimmed) else {
            self.file.diagnostics.push(Diagnostic::malformed_request_line(
                trimmed,
                index,
                indentation(line),
            ));
            return;
        };

        let mut request = ParsedRequest::new(&caps[1], &caps[2], index + 1);
        request.http_version = caps.get(3).map(|m| m.as_str().to_string());
        request.name = self.pending_name.take();
        request.separator_title = self.pending_title.take();
        request.comments = std::mem::take(&mut self.pending_comments);
        request.variables = std::mem::replace(
            &mut self.pending_variables,
            OrderedMap::case_insensitive(),
        );

        if !HttpMethod::is_standard(&request.method) {
            self.file.diagnostics.push(Diagnostic::unknown_method(
                &request.method,
                index,
                indentation(line),
            ));
        }

        let url = request.url.clone();
        scan_references(&mut request, &url);

        self.current = Some(request);
        self.last_header = None;
        self.state = ParserState::InHeaders;
    }

    fn process_header_line(&mut self, index: usize, line: &str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            self.state = ParserState::InBody;
            return;
        }

        let Some(request) = self.current.as_mut() else {
            self.state = ParserState::Start;
            return;
        };

        if !request.headers.is_empty() && line.starts_with([' ', '\t']) {
            if let Some(last) = self.last_header.as_deref() {
                if let Some(value) = request.headers.get_mut(last) {
                    value.push(' ');
                    value.push_str(trimmed);
                    let updated = value.clone();
                    scan_references(request, &updated);
                }
            }
            return;
        }

        if comment_text(trimmed).is_some() {
            return;
        }

        match trimmed.split_once(':') {
            Some((name, value)) if !name.trim().is_empty() => {
                let name = name.trim();
                let value = value.trim();
                request.headers.insert(name, value);
                scan_references(request, value);
                self.last_header = Some(name.to_string());
            }
            _ => {
                self.file.diagnostics.push(Diagnostic::invalid_header(
                    trimmed,
                    index,
                    indentation(line),
                ));
            }
        }
    }

    /// Completes the request under construction and returns to `Start`.
    fn finish_request(&mut self) {
        let lines = std::mem::take(&mut self.body_lines);
        self.state = ParserState::Start;
        self.last_header = None;

        let Some(mut request) = self.current.take() else {
            return;
        };

        self.apply_body(&mut request, lines);
        trace!(
            method = %request.method,
            url = %request.url,
            line = request.line_number,
            "finished request block"
        );
        self.file.requests.push(request);
    }

    fn apply_body(&mut self, request: &mut ParsedRequest, mut lines: Vec<(usize, String)>) {
        while lines.last().is_some_and(|(_, l)| l.trim().is_empty()) {
            lines.pop();
        }

        let Some((_, first)) = lines.first() else {
            return;
        };

        if let Some(path) = file_body_reference(first) {
            let path = path.to_string();
            scan_references(request, &path);

            if let Some((index, extra)) = lines[1..].iter().find(|(_, l)| !l.trim().is_empty()) {
                self.file.diagnostics.push(Diagnostic::file_body_extra_content(
                    &path,
                    *index,
                    indentation(extra),
                ));
            }

            request.set_body_file_path(path);
            return;
        }

        let body = lines
            .iter()
            .map(|(_, l)| l.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        scan_references(request, &body);
        request.set_body(body);
    }

    fn finish(mut self) -> ParsedFile {
        if self.current.is_some() {
            self.finish_request();
        }
        self.file
    }
}

/// Returns `Some(title)` for a `###` separator line.
fn separator_title(line: &str) -> Option<Option<String>> {
    let rest = line.trim_start().strip_prefix("###")?;
    let title = rest.trim_start_matches('#').trim();
    Some((!title.is_empty()).then(|| title.to_string()))
}

/// Text of a `#` or `//` comment with the marker removed.
fn comment_text(trimmed: &str) -> Option<&str> {
    trimmed
        .strip_prefix("//")
        .or_else(|| trimmed.strip_prefix('#'))
        .map(str::trim)
}

/// Splits `@name = value` into its trimmed parts.
fn parse_variable_definition(trimmed: &str) -> std::result::Result<(&str, &str), &'static str> {
    let rest = &trimmed[1..];
    let (name, value) = rest.split_once('=').ok_or("missing '='")?;
    let name = name.trim();

    if name.is_empty() {
        return Err("empty variable name");
    }
    if name.chars().any(char::is_whitespace) {
        return Err("variable name contains whitespace");
    }

    Ok((name, value.trim()))
}

/// Path of a `< path` body line.
///
/// This is narrower than "any `<` with a non-empty remainder is a file
/// reference", on purpose: a line like `<root>...</root>` is markup. When the
/// marker is not followed by whitespace, a `>` in the remainder keeps the
/// line as body text, so inline XML bodies survive. A bare `<` is body text
/// as well.
fn file_body_reference(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('<')?;
    let path = rest.trim();

    if path.is_empty() {
        return None;
    }
    if !rest.starts_with(char::is_whitespace) && path.contains('>') {
        return None;
    }

    Some(path)
}

fn scan_references(request: &mut ParsedRequest, text: &str) {
    for name in response_reference_names(text) {
        request.add_dependency(&name);
    }
}

fn indentation(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

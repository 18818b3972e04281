//! Request chaining helpers for executors.
//!
//! The crate does not send requests. An executor walks [`ParsedFile::requests`],
//! calls [`resolve_request`] to get the final text for each one, sends it,
//! and stores the response with [`ResponseCapture::capture`] so later
//! requests can reference it.
//!
//! [`missing_dependencies`] reports references that cannot be satisfied when
//! requests run in file order. Whether to run such requests anyway, reorder
//! them, or skip them is left to the executor.

use crate::capture::ResponseCapture;
use crate::models::{OrderedMap, ParsedFile, ParsedRequest};
use crate::variables::VariableResolver;
use serde::Serialize;
use tracing::debug;

/// A request with every resolvable placeholder substituted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedRequest {
    pub method: String,
    pub url: String,
    pub http_version: Option<String>,
    pub headers: OrderedMap,
    pub body: Option<String>,
    pub body_file_path: Option<String>,
}

/// Resolves a parsed request for sending.
///
/// The caller's resolver (typically holding environment variables) is
/// cloned, then file variables and the request's own variables are layered
/// on top in definition order. Each variable value is resolved against the
/// layers below it, so `@url = {{host}}/api` works. Every text field then
/// goes through dynamic functions, simple variables and finally response
/// references.
///
/// # Arguments
///
/// * `request` - The parsed request
/// * `file_variables` - The file's top-level variables
/// * `resolver` - Base variables, e.g. from an environment file
/// * `capture` - Responses captured from earlier requests
///
/// # Returns
///
/// The resolved request. Placeholders that cannot be resolved are left in
/// the output; check with [`crate::variables::has_unresolved_variables`].
pub fn resolve_request(
    request: &ParsedRequest,
    file_variables: &OrderedMap,
    resolver: &VariableResolver,
    capture: &ResponseCapture,
) -> ResolvedRequest {
    let mut resolver = resolver.clone();
    layer_variables(&mut resolver, file_variables);
    layer_variables(&mut resolver, &request.variables);

    let resolve = |text: &str| capture.resolve_all_references(&resolver.resolve(text));

    let mut headers = OrderedMap::case_insensitive();
    for (name, value) in request.headers.iter() {
        headers.insert(name, resolve(value));
    }

    debug!(request = %request.display_name(), "Resolved request");

    ResolvedRequest {
        method: request.method.clone(),
        url: resolve(&request.url),
        http_version: request.http_version.clone(),
        headers,
        body: request.body.as_deref().map(&resolve),
        body_file_path: request.body_file_path.as_deref().map(&resolve),
    }
}

fn layer_variables(resolver: &mut VariableResolver, variables: &OrderedMap) {
    for (name, value) in variables.iter() {
        let resolved = resolver.resolve(value);
        resolver.set_variable(name, resolved);
    }
}

/// A request whose references name requests that do not run before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyIssue {
    /// Position of the request in the file.
    pub request_index: usize,
    /// 1-based line of the request line.
    pub line_number: usize,
    /// The request's display name.
    pub request: String,
    /// Referenced names with no earlier request of that `@name`.
    pub missing: Vec<String>,
}

/// Lists references that file-order execution cannot satisfy.
///
/// A dependency is satisfied when an earlier request carries that `@name`
/// (compared case-insensitively). Forward references, self references and
/// unknown names are all reported.
pub fn missing_dependencies(file: &ParsedFile) -> Vec<DependencyIssue> {
    let mut issues = Vec::new();
    let mut seen: Vec<String> = Vec::new();

    for (index, request) in file.requests.iter().enumerate() {
        let missing: Vec<String> = request
            .depends_on
            .iter()
            .filter(|name| !seen.contains(&name.to_lowercase()))
            .cloned()
            .collect();

        if !missing.is_empty() {
            issues.push(DependencyIssue {
                request_index: index,
                line_number: request.line_number,
                request: request.display_name(),
                missing,
            });
        }

        if let Some(name) = &request.name {
            seen.push(name.to_lowercase());
        }
    }

    issues
}

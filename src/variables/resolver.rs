//! Placeholder resolution for request text.
//!
//! [`VariableResolver::resolve`] runs two passes over a piece of text:
//!
//! 1. `{{$function args}}` dynamic placeholders are evaluated.
//! 2. `{{name}}` placeholders are replaced from the stored variable map.
//!
//! Anything that cannot be resolved is left exactly as written, so callers
//! can detect residual placeholders with [`has_unresolved_variables`].

use super::system::resolve_dynamic_function;
use crate::parser::reference::{response_reference_names, RESPONSE_REFERENCE_REGEX};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;
use tracing::trace;

/// `{{$name}}` or `{{$name args}}`, with optional inner whitespace.
static DYNAMIC_VARIABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*\$([^{}\s]+)(?:\s+([^{}]*?))?\s*\}\}")
        .expect("Failed to compile dynamic variable regex")
});

/// `{{name}}` where the name is not a dynamic function.
static SIMPLE_VARIABLE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([^{}\s$][^{}\s]*)\s*\}\}")
        .expect("Failed to compile simple variable regex")
});

/// Any `{{...}}` placeholder.
static ANY_PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{[^{}]*\}\}").expect("Failed to compile placeholder regex")
});

/// Resolves `{{name}}` and `{{$function}}` placeholders.
///
/// Variable names are case-sensitive and the last write wins. The resolver
/// owns its map; share it across threads behind a lock or give each thread
/// its own clone.
///
/// # Examples
///
/// ```
/// use dothttp::variables::VariableResolver;
///
/// let mut resolver = VariableResolver::new();
/// resolver.set_variable("baseUrl", "https://api.example.com");
///
/// assert_eq!(
///     resolver.resolve("{{baseUrl}}/users/{{id}}"),
///     "https://api.example.com/users/{{id}}"
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct VariableResolver {
    variables: HashMap<String, String>,
}

impl VariableResolver {
    /// Creates a resolver with no variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a single variable, replacing any previous value.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Sets many variables at once; later entries win.
    pub fn set_variables<I, K, V>(&mut self, variables: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in variables {
            self.set_variable(name, value);
        }
    }

    /// Removes every variable.
    pub fn clear(&mut self) {
        self.variables.clear();
    }

    /// Returns the stored value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.variables.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Resolves dynamic functions, then simple variables.
    ///
    /// Never fails. Unknown dynamic functions come back as
    /// `{{$lowercased-name args}}`; unknown variables and response
    /// references are left untouched. Each pass runs once, so a variable
    /// whose value itself contains `{{...}}` is not expanded again.
    ///
    /// # Arguments
    ///
    /// * `text` - URL, header value or body text
    ///
    /// # Returns
    ///
    /// The text with every resolvable placeholder substituted.
    pub fn resolve(&self, text: &str) -> String {
        if !text.contains("{{") {
            return text.to_string();
        }

        let with_dynamic = resolve_dynamic_placeholders(text);
        self.resolve_simple_placeholders(&with_dynamic)
    }

    fn resolve_simple_placeholders(&self, text: &str) -> String {
        SIMPLE_VARIABLE_REGEX
            .replace_all(text, |caps: &Captures<'_>| match self.variables.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// See [`variable_names`].
    pub fn get_variable_names(&self, text: &str) -> Vec<String> {
        variable_names(text)
    }

    /// See [`response_reference_names`].
    pub fn get_response_reference_names(&self, text: &str) -> Vec<String> {
        response_reference_names(text)
    }

    /// See [`has_response_references`].
    pub fn has_response_references(&self, text: &str) -> bool {
        has_response_references(text)
    }

    /// See [`has_unresolved_variables`].
    pub fn has_unresolved_variables(&self, text: &str) -> bool {
        has_unresolved_variables(text)
    }
}

fn resolve_dynamic_placeholders(text: &str) -> String {
    DYNAMIC_VARIABLE_REGEX
        .replace_all(text, |caps: &Captures<'_>| {
            let name = &caps[1];
            let args = caps.get(2).map(|m| m.as_str());

            match resolve_dynamic_function(name, args) {
                Some(value) => value,
                None => {
                    trace!(function = name, "Unknown dynamic function left in place");
                    match args.map(str::trim).filter(|a| !a.is_empty()) {
                        Some(args) => format!("{{{{${} {}}}}}", name.to_lowercase(), args),
                        None => format!("{{{{${}}}}}", name.to_lowercase()),
                    }
                }
            }
        })
        .into_owned()
}

/// Distinct plain variable names referenced in `text`, in first-seen order.
///
/// Dynamic functions and response references are not included.
///
/// # Examples
///
/// ```
/// use dothttp::variables::variable_names;
///
/// let names = variable_names("{{host}}/{{ id }}?t={{$timestamp}}&x={{login.response.body.*}}&h={{host}}");
/// assert_eq!(names, vec!["host", "id"]);
/// ```
pub fn variable_names(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in SIMPLE_VARIABLE_REGEX.captures_iter(text) {
        if RESPONSE_REFERENCE_REGEX.is_match(&caps[0]) {
            continue;
        }
        let name = &caps[1];
        if !names.iter().any(|existing| existing == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Returns `true` if `text` contains at least one response reference.
pub fn has_response_references(text: &str) -> bool {
    RESPONSE_REFERENCE_REGEX.is_match(text)
}

/// Returns `true` if any `{{...}}` placeholder remains in `text`.
pub fn has_unresolved_variables(text: &str) -> bool {
    ANY_PLACEHOLDER_REGEX.is_match(text)
}

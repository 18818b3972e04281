//! JSONPath-lite evaluation over captured response bodies.
//!
//! Supported syntax is a dotted property path with optional array indices:
//! `$.items[0].id`, `data.user.name`, `$[2]`, `matrix[1][0]`. Filters,
//! wildcards and recursive descent are not supported; consecutive dots are
//! treated as a single separator.
//!
//! Values are navigated as raw JSON text, so numbers come back exactly as
//! they were written (`1.50` stays `1.50`).

use serde_json::value::RawValue;
use std::collections::HashMap;

/// One path step: an optional property name followed by array indices.
#[derive(Debug, PartialEq, Eq)]
struct Segment<'a> {
    property: &'a str,
    indices: Vec<usize>,
}

/// Evaluates `path` against `json`.
///
/// # Arguments
///
/// * `json` - The JSON document text
/// * `path` - A path such as `$.items[1].id`
///
/// # Returns
///
/// The selected value as text: strings unquoted, numbers and booleans as
/// written, objects and arrays as compact JSON. Returns an empty string if
/// the document does not parse, a step is missing, an index is out of range,
/// or the selected value is `null`.
///
/// # Examples
///
/// ```
/// use dothttp::capture::jsonpath::evaluate_json_path;
///
/// let body = r#"{"items":[{"id":1},{"id":2}]}"#;
/// assert_eq!(evaluate_json_path(body, "$.items[1].id"), "2");
/// assert_eq!(evaluate_json_path(body, "$.items[5].id"), "");
/// ```
pub fn evaluate_json_path(json: &str, path: &str) -> String {
    select(json, path).unwrap_or_default()
}

fn select(json: &str, path: &str) -> Option<String> {
    let mut current: &RawValue = serde_json::from_str(json).ok()?;

    for segment in parse_segments(path)? {
        if !segment.property.is_empty() {
            current = property(current, segment.property)?;
        }
        for index in segment.indices {
            current = element(current, index)?;
        }
    }

    render(current)
}

fn parse_segments(path: &str) -> Option<Vec<Segment<'_>>> {
    let path = path.trim();
    let path = path.strip_prefix('$').unwrap_or(path);

    path.split('.')
        .filter(|part| !part.is_empty())
        .map(parse_segment)
        .collect()
}

fn parse_segment(part: &str) -> Option<Segment<'_>> {
    let (property, mut rest) = match part.find('[') {
        Some(open) => (&part[..open], &part[open..]),
        None => (part, ""),
    };

    let mut indices = Vec::new();
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        indices.push(inner[..close].trim().parse::<usize>().ok()?);
        rest = &inner[close + 1..];
    }

    Some(Segment { property, indices })
}

fn property<'a>(value: &'a RawValue, name: &str) -> Option<&'a RawValue> {
    let mut object: HashMap<String, &'a RawValue> = serde_json::from_str(value.get()).ok()?;
    object.remove(name)
}

fn element(value: &RawValue, index: usize) -> Option<&RawValue> {
    let array: Vec<&RawValue> = serde_json::from_str(value.get()).ok()?;
    array.get(index).copied()
}

fn render(value: &RawValue) -> Option<String> {
    let raw = value.get().trim();

    match raw.as_bytes().first()? {
        b'"' => serde_json::from_str::<String>(raw).ok(),
        b'{' | b'[' => Some(compact(raw)),
        b'n' => Some(String::new()),
        _ => Some(raw.to_string()),
    }
}

/// Removes insignificant whitespace from valid JSON text.
fn compact(raw: &str) -> String {
    let mut output = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;

    for ch in raw.chars() {
        if in_string {
            output.push(ch);
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
            output.push(ch);
        } else if !ch.is_whitespace() {
            output.push(ch);
        }
    }

    output
}

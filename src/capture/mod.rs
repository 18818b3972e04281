//! Response capture and reference resolution.
//!
//! After a named request has been sent, its response is captured here under
//! the request's `@name`. Later requests read values out of it with
//! reference placeholders:
//!
//! - `{{login.response.body.*}}` - the whole body
//! - `{{login.response.body.$.token}}` - JSONPath-lite into a JSON body
//! - `{{feed.response.body./rss/channel/title}}` - XPath-lite into an XML body
//! - `{{login.response.headers.X-Session-Id}}` - a response header
//! - `{{login.request.body.$.username}}` - the body that was sent
//!
//! Resolution never fails. A reference to a name that has not been captured,
//! or to a header that is not present, is returned unchanged; a path that
//! selects nothing resolves to an empty string.

pub mod jsonpath;
pub mod xpath;

pub use jsonpath::evaluate_json_path;
pub use xpath::evaluate_xpath;

use crate::error::Result;
use crate::models::{HttpResponse, OrderedMap};
use crate::parser::reference::{
    ReferencePart, ReferenceSource, ResponseReference, RESPONSE_REFERENCE_REGEX,
};
use regex::Captures;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

/// Snapshot of one request/response exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapturedResponse {
    /// The request name it was captured under, as given.
    pub name: String,

    /// HTTP status code of the response.
    pub status_code: u16,

    /// Response headers; the first value wins for repeated names, and
    /// lookups are case-insensitive.
    pub headers: OrderedMap,

    /// Response body text.
    pub body: String,

    /// Body of the request that was sent, if any.
    pub request_body: Option<String>,
}

impl CapturedResponse {
    /// Looks up a response header case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    fn lookup(&self, reference: &ResponseReference) -> Option<String> {
        match (reference.source, reference.part) {
            (ReferenceSource::Response, ReferencePart::Body) => {
                Some(select_body(&self.body, &reference.remainder))
            }
            (ReferenceSource::Request, ReferencePart::Body) => Some(select_body(
                self.request_body.as_deref().unwrap_or_default(),
                &reference.remainder,
            )),
            (ReferenceSource::Response, ReferencePart::Headers) => {
                self.header(reference.remainder.trim()).map(str::to_string)
            }
            // Sent headers are not captured.
            (ReferenceSource::Request, ReferencePart::Headers) => None,
        }
    }
}

/// Picks the evaluator from the shape of the path.
fn select_body(body: &str, path: &str) -> String {
    let path = path.trim();
    if path == "*" {
        body.to_string()
    } else if path.starts_with('/') {
        evaluate_xpath(body, path)
    } else {
        evaluate_json_path(body, path)
    }
}

/// Shared store of captured responses, keyed case-insensitively by name.
///
/// Cloning is cheap and every clone sees the same table, so one store can be
/// handed to each task of an executor. Capturing a name again replaces the
/// previous snapshot.
///
/// # Examples
///
/// ```
/// use dothttp::capture::ResponseCapture;
/// use dothttp::models::HttpResponse;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let capture = ResponseCapture::new();
/// let response = HttpResponse::new(200).with_body(r#"{"token":"abc"}"#);
/// capture.capture("login", response, None).await.unwrap();
///
/// assert_eq!(
///     capture.resolve_all_references("Bearer {{login.response.body.$.token}}"),
///     "Bearer abc"
/// );
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ResponseCapture {
    store: Arc<RwLock<HashMap<String, CapturedResponse>>>,
}

impl ResponseCapture {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CapturedResponse>> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CapturedResponse>> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Captures `response` under `name`.
    ///
    /// The body is read to the end before the snapshot is stored; this is
    /// the only suspension point. An empty `name` is a no-op and leaves the
    /// body unread.
    ///
    /// # Arguments
    ///
    /// * `name` - The request's `@name`
    /// * `response` - The received response
    /// * `request_body` - The body that was sent, for `request.body` references
    ///
    /// # Returns
    ///
    /// `Ok(())`, or an I/O error if reading a streamed body failed.
    pub async fn capture(
        &self,
        name: &str,
        response: HttpResponse,
        request_body: Option<&str>,
    ) -> Result<()> {
        if name.trim().is_empty() {
            return Ok(());
        }

        let HttpResponse {
            status_code,
            headers: header_list,
            body,
        } = response;
        let body = body.read_to_string().await?;

        let mut headers = OrderedMap::case_insensitive();
        for (header, value) in header_list {
            if !headers.contains_key(&header) {
                headers.insert(header, value);
            }
        }

        let snapshot = CapturedResponse {
            name: name.to_string(),
            status_code,
            headers,
            body,
            request_body: request_body.map(str::to_string),
        };

        let replaced = self.write().insert(name.to_lowercase(), snapshot).is_some();
        debug!(name, status_code, replaced, "Captured response");

        Ok(())
    }

    /// Returns a copy of the snapshot stored under `name`.
    pub fn get(&self, name: &str) -> Option<CapturedResponse> {
        self.read().get(&name.to_lowercase()).cloned()
    }

    /// Returns `true` if a snapshot exists for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(&name.to_lowercase())
    }

    /// Removes and returns the snapshot stored under `name`.
    pub fn remove(&self, name: &str) -> Option<CapturedResponse> {
        self.write().remove(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drops every snapshot.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Resolves `text` if it is exactly one reference placeholder.
    ///
    /// Any other text, or a reference that cannot be resolved, is returned
    /// unchanged.
    pub fn resolve_reference(&self, text: &str) -> String {
        let Some(reference) = ResponseReference::parse(text) else {
            return text.to_string();
        };

        let store = self.read();
        resolve_with(&store, &reference).unwrap_or_else(|| text.to_string())
    }

    /// Resolves every reference placeholder in `text` in one left-to-right
    /// scan. Unresolvable references are left as written.
    pub fn resolve_all_references(&self, text: &str) -> String {
        if !text.contains("{{") {
            return text.to_string();
        }

        let store = self.read();
        RESPONSE_REFERENCE_REGEX
            .replace_all(text, |caps: &Captures<'_>| {
                let reference = ResponseReference::from_captures(caps);
                resolve_with(&store, &reference).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }
}

fn resolve_with(
    store: &HashMap<String, CapturedResponse>,
    reference: &ResponseReference,
) -> Option<String> {
    let Some(snapshot) = store.get(&reference.name.to_lowercase()) else {
        trace!(name = %reference.name, "No captured response for reference");
        return None;
    };
    snapshot.lookup(reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResponseBody;

    fn json_response() -> HttpResponse {
        HttpResponse::new(201)
            .with_header("Content-Type", "application/json")
            .with_header("X-Request-Id", "first")
            .with_header("x-request-id", "second")
            .with_body(r#"{"token":"abc","user":{"id":7},"items":[{"id":1},{"id":2}]}"#)
    }

    #[tokio::test]
    async fn test_capture_and_get() {
        let capture = ResponseCapture::new();
        capture
            .capture("Login", json_response(), Some(r#"{"username":"ada"}"#))
            .await
            .unwrap();

        assert!(capture.contains("login"));
        assert_eq!(capture.len(), 1);

        let snapshot = capture.get("LOGIN").unwrap();
        assert_eq!(snapshot.name, "Login");
        assert_eq!(snapshot.status_code, 201);
        assert_eq!(snapshot.header("x-request-id"), Some("first"));
        assert_eq!(snapshot.request_body.as_deref(), Some(r#"{"username":"ada"}"#));
    }

    #[tokio::test]
    async fn test_empty_name_is_noop() {
        let capture = ResponseCapture::new();
        capture.capture("", json_response(), None).await.unwrap();
        capture.capture("   ", json_response(), None).await.unwrap();
        assert!(capture.is_empty());
    }

    #[tokio::test]
    async fn test_capture_streamed_body() {
        let capture = ResponseCapture::new();
        let reader: &'static [u8] = b"<root><id>9</id></root>";
        let response = HttpResponse::new(200).with_body(ResponseBody::from_reader(reader));
        capture.capture("feed", response, None).await.unwrap();

        assert_eq!(capture.resolve_reference("{{feed.response.body./root/id}}"), "9");
    }

    #[tokio::test]
    async fn test_recapture_overwrites() {
        let capture = ResponseCapture::new();
        capture
            .capture("login", HttpResponse::new(200).with_body("old"), None)
            .await
            .unwrap();
        capture
            .capture("LOGIN", HttpResponse::new(200).with_body("new"), None)
            .await
            .unwrap();

        assert_eq!(capture.len(), 1);
        assert_eq!(capture.resolve_reference("{{login.response.body.*}}"), "new");
    }

    #[tokio::test]
    async fn test_resolve_body_references() {
        let capture = ResponseCapture::new();
        capture.capture("login", json_response(), None).await.unwrap();

        assert_eq!(capture.resolve_reference("{{login.response.body.$.token}}"), "abc");
        assert_eq!(capture.resolve_reference("{{login.response.body.user.id}}"), "7");
        assert_eq!(capture.resolve_reference("{{login.response.body.$.items[1].id}}"), "2");
        assert_eq!(capture.resolve_reference("{{login.response.body.$.items[5].id}}"), "");
        assert!(capture
            .resolve_reference("{{login.response.body.*}}")
            .starts_with(r#"{"token""#));
    }

    #[tokio::test]
    async fn test_resolve_header_references() {
        let capture = ResponseCapture::new();
        capture.capture("login", json_response(), None).await.unwrap();

        assert_eq!(
            capture.resolve_reference("{{login.response.headers.content-type}}"),
            "application/json"
        );
        assert_eq!(
            capture.resolve_reference("{{login.response.headers.X-Missing}}"),
            "{{login.response.headers.X-Missing}}"
        );
    }

    #[tokio::test]
    async fn test_resolve_request_body_references() {
        let capture = ResponseCapture::new();
        capture
            .capture("create", json_response(), Some(r#"{"username":"ada"}"#))
            .await
            .unwrap();
        capture.capture("ping", json_response(), None).await.unwrap();

        assert_eq!(capture.resolve_reference("{{create.request.body.$.username}}"), "ada");
        assert_eq!(capture.resolve_reference("{{ping.request.body.*}}"), "");
        assert_eq!(
            capture.resolve_reference("{{create.request.headers.Accept}}"),
            "{{create.request.headers.Accept}}"
        );
    }

    #[test]
    fn test_uncaptured_reference_is_fixed_point() {
        let capture = ResponseCapture::new();
        let text = "{{login.response.body.$.token}}";
        assert_eq!(capture.resolve_reference(text), text);
        assert_eq!(capture.resolve_all_references(text), text);
    }

    #[test]
    fn test_resolve_reference_requires_exact_placeholder() {
        let capture = ResponseCapture::new();
        let text = "Bearer {{login.response.body.$.token}}";
        assert_eq!(capture.resolve_reference(text), text);
    }

    #[tokio::test]
    async fn test_resolve_all_references() {
        let capture = ResponseCapture::new();
        capture.capture("login", json_response(), None).await.unwrap();

        let text = "Bearer {{login.response.body.$.token}} for {{login.response.body.$.user.id}} \
                    via {{other.response.body.$.x}} and {{plain}}";
        assert_eq!(
            capture.resolve_all_references(text),
            "Bearer abc for 7 via {{other.response.body.$.x}} and {{plain}}"
        );
    }

    #[tokio::test]
    async fn test_clones_share_store() {
        let capture = ResponseCapture::new();
        let clone = capture.clone();
        clone.capture("login", json_response(), None).await.unwrap();

        assert!(capture.contains("login"));
        assert!(capture.remove("login").is_some());
        assert!(!clone.contains("login"));

        clone.capture("a", json_response(), None).await.unwrap();
        capture.clear();
        assert!(clone.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_captures() {
        let capture = ResponseCapture::new();
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = capture.clone();
            handles.push(tokio::spawn(async move {
                let response = HttpResponse::new(200).with_body(format!(r#"{{"n":{}}}"#, i));
                store.capture(&format!("req{}", i), response, None).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(capture.len(), 8);
        assert_eq!(capture.resolve_reference("{{req3.response.body.$.n}}"), "3");
    }

    #[test]
    fn test_store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ResponseCapture>();
    }
}

//! HTTP response snapshot handed to the response capture.
//!
//! The transport that produced the response lives outside this crate. It
//! hands over the status, the header list, and a body that is either already
//! buffered or still an unread async stream.

use std::fmt;
use std::pin::Pin;
use tokio::io::{AsyncRead, AsyncReadExt};

/// The body of a received response.
pub enum ResponseBody {
    /// The response had no content.
    Empty,

    /// Fully buffered body bytes.
    Bytes(Vec<u8>),

    /// A body that has not been read yet.
    Stream(Pin<Box<dyn AsyncRead + Send>>),
}

impl ResponseBody {
    /// Wraps an async reader as a body stream.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        ResponseBody::Stream(Box::pin(reader))
    }

    /// Reads the whole body as text.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected. This is the
    /// only place the capture path waits on I/O.
    pub async fn read_to_string(self) -> std::io::Result<String> {
        match self {
            ResponseBody::Empty => Ok(String::new()),
            ResponseBody::Bytes(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            ResponseBody::Stream(mut reader) => {
                let mut buffer = Vec::new();
                reader.read_to_end(&mut buffer).await?;
                Ok(String::from_utf8_lossy(&buffer).into_owned())
            }
        }
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseBody::Empty => write!(f, "Empty"),
            ResponseBody::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            ResponseBody::Stream(_) => write!(f, "Stream(..)"),
        }
    }
}

impl Default for ResponseBody {
    fn default() -> Self {
        ResponseBody::Empty
    }
}

impl From<String> for ResponseBody {
    fn from(text: String) -> Self {
        ResponseBody::Bytes(text.into_bytes())
    }
}

impl From<&str> for ResponseBody {
    fn from(text: &str) -> Self {
        ResponseBody::Bytes(text.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for ResponseBody {
    fn from(bytes: Vec<u8>) -> Self {
        ResponseBody::Bytes(bytes)
    }
}

/// A response as received from the transport.
#[derive(Debug, Default)]
pub struct HttpResponse {
    /// HTTP status code (e.g., 200, 404, 500).
    pub status_code: u16,

    /// Response headers in received order. A name may repeat.
    pub headers: Vec<(String, String)>,

    /// Response body.
    pub body: ResponseBody,
}

impl HttpResponse {
    /// Creates a response with no headers and an empty body.
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            headers: Vec::new(),
            body: ResponseBody::Empty,
        }
    }

    /// Adds a header, builder style.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the body, builder style.
    pub fn with_body(mut self, body: impl Into<ResponseBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Checks if the response status indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

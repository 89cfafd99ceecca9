//! Lightweight in-memory stubs for playback without an archive document

use crate::archive::{Body, Entry, Header, RecordedRequest, RecordedResponse};

/// A canned HTTP exchange that can seed a store directly.
///
/// Defaults to a `GET` answered with an empty `200`; override what the test
/// cares about.
///
/// ```
/// use reprise::stub::Stub;
///
/// let stub = Stub::new("https://api.example.com/health")
///     .status(204)
///     .header("X-Env", "test");
/// ```
#[derive(Debug, Clone)]
pub struct Stub {
    url: String,
    method: String,
    status: u16,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl Stub {
    /// Stub a URL with the defaults: `GET`, status 200, no body
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: "GET".to_string(),
            status: 200,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Set the method the stub answers
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Set the response status
    #[must_use]
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Append a response header
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a textual response body
    #[must_use]
    pub fn body_text(mut self, text: impl Into<String>) -> Self {
        self.body = Some(text.into().into_bytes());
        self
    }

    /// Set a raw response body
    #[must_use]
    pub fn body_bytes(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.body = Some(bytes.into());
        self
    }

    /// Convert into an archive entry for a store's baseline
    #[must_use]
    pub fn into_entry(self) -> Entry {
        Entry {
            request: RecordedRequest {
                method: self.method.trim().to_uppercase(),
                url: self.url,
                headers: vec![],
                body: None,
            },
            response: RecordedResponse {
                status: self.status,
                headers: self
                    .headers
                    .into_iter()
                    .map(|(name, value)| Header { name, value })
                    .collect(),
                body: self.body.as_deref().map(Body::from_bytes),
            },
        }
    }
}

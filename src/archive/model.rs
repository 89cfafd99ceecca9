//! Recorded interaction model

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::matcher::RequestParts;
use crate::{RepriseError, Result};

/// Ordered collection of recorded interactions.
///
/// Insertion order is meaningful: matching is first-match-wins and export
/// preserves the order entries were loaded or appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    /// Recorded entries in archive order
    pub entries: Vec<Entry>,
}

impl Archive {
    /// Create an archive from entries
    #[must_use]
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive holds no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// One recorded request/response pair.
///
/// Request fields are never mutated after creation; only whole entries are
/// appended to a store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// The request as it went out
    pub request: RecordedRequest,
    /// The response that came back
    pub response: RecordedResponse,
}

impl Entry {
    /// Build an entry from a live exchange
    #[must_use]
    pub fn from_exchange(request: &RequestParts, response: RecordedResponse) -> Self {
        Self {
            request: RecordedRequest::from_parts(request),
            response,
        }
    }
}

/// Recorded form of an outgoing request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedRequest {
    /// HTTP method (e.g. `GET`, `POST`)
    pub method: String,
    /// Absolute URL as one comparable string
    pub url: String,
    /// Ordered header name/value pairs
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Optional request body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

impl RecordedRequest {
    /// Capture a request in recorded form
    #[must_use]
    pub fn from_parts(parts: &RequestParts) -> Self {
        Self {
            method: parts.method.clone(),
            url: parts.url.clone(),
            headers: parts
                .headers()
                .iter()
                .map(|(name, value)| Header::new(name, value))
                .collect(),
            body: parts.body().map(Body::from_bytes),
        }
    }

    /// Case-insensitive header lookup, first occurrence wins
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|header| header.name.eq_ignore_ascii_case(name))
            .map(|header| header.value.as_str())
    }

    /// Reconstruct the comparable view of this request.
    ///
    /// Returns `None` when the stored URL does not parse or the body cannot
    /// be decoded; the matcher engine skips such entries instead of failing
    /// the whole search.
    #[must_use]
    pub fn to_parts(&self) -> Option<RequestParts> {
        let mut parts = RequestParts::new(&self.method, &self.url).ok()?;
        for header in &self.headers {
            parts = parts.with_header(&header.name, &header.value);
        }
        if let Some(body) = &self.body {
            parts = parts.with_body(body.bytes().ok()?);
        }
        Some(parts)
    }
}

/// Recorded form of a response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedResponse {
    /// HTTP status code
    pub status: u16,
    /// Ordered header name/value pairs
    #[serde(default)]
    pub headers: Vec<Header>,
    /// Optional response body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Body>,
}

impl RecordedResponse {
    /// Case-insensitive header lookup, first occurrence wins
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|header| header.name.eq_ignore_ascii_case(name))
            .map(|header| header.value.as_str())
    }

    /// Decoded body bytes, empty when absent
    pub fn body_bytes(&self) -> Result<Vec<u8>> {
        match &self.body {
            Some(body) => body.bytes(),
            None => Ok(Vec::new()),
        }
    }
}

/// One header name/value pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Header name; lookup is case-insensitive
    pub name: String,
    /// Header value
    pub value: String,
}

impl Header {
    /// Create a header pair
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Textual encoding of a stored body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyEncoding {
    /// Body text is the payload itself
    Utf8,
    /// Body text is the base64 encoding of the payload
    Base64,
}

/// Stored body: text plus an explicit encoding marker.
///
/// Binary payloads are carried as base64 so the interchange document stays
/// valid text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    /// Body content in textual form
    pub text: String,
    /// How `text` encodes the payload bytes
    pub encoding: BodyEncoding,
}

impl Body {
    /// Store raw bytes, choosing `utf8` when lossless and `base64` otherwise
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(text) => Self {
                text: text.to_string(),
                encoding: BodyEncoding::Utf8,
            },
            Err(_) => Self {
                text: BASE64.encode(bytes),
                encoding: BodyEncoding::Base64,
            },
        }
    }

    /// Store a text payload directly
    #[must_use]
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            encoding: BodyEncoding::Utf8,
        }
    }

    /// Decode the payload bytes
    pub fn bytes(&self) -> Result<Vec<u8>> {
        match self.encoding {
            BodyEncoding::Utf8 => Ok(self.text.as_bytes().to_vec()),
            BodyEncoding::Base64 => BASE64
                .decode(&self.text)
                .map_err(|e| RepriseError::ArchiveFormat(format!("Invalid base64 body: {e}"))),
        }
    }
}

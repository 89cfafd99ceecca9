//! Comparable view of one in-flight request

use std::borrow::Cow;

use hyper::Uri;

use crate::{RepriseError, Result};

/// The matcher engine's view of a request: method, absolute URL (raw and
/// decomposed), ordered headers, optional body bytes.
///
/// Construction validates the URL once so every matcher stays pure and total
/// over its inputs.
#[derive(Debug, Clone)]
pub struct RequestParts {
    /// HTTP method, uppercase normalized
    pub method: String,
    /// Absolute URL as one comparable string
    pub url: String,
    uri: Uri,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl RequestParts {
    /// Build a comparable request from a method and absolute URL.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::InvalidRequest`] when the method is empty or
    /// the URL does not parse as an absolute URI (scheme and host required).
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Result<Self> {
        let method = method.into().trim().to_uppercase();
        if method.is_empty() {
            return Err(RepriseError::InvalidRequest(
                "Method cannot be empty".to_string(),
            ));
        }

        let url = url.into();
        let uri: Uri = url
            .parse()
            .map_err(|e| RepriseError::InvalidRequest(format!("Invalid URL {url:?}: {e}")))?;
        if uri.scheme().is_none() || uri.host().is_none() {
            return Err(RepriseError::InvalidRequest(format!(
                "URL is not absolute: {url:?}"
            )));
        }

        Ok(Self {
            method,
            url,
            uri,
            headers: Vec::new(),
            body: None,
        })
    }

    /// Append a header pair
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach a body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Ordered header pairs as sent
    #[must_use]
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup, first occurrence wins
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Remove every occurrence of a header, returning the first value
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let first = self.header(name).map(str::to_string);
        self.headers
            .retain(|(header, _)| !header.eq_ignore_ascii_case(name));
        first
    }

    /// Body bytes, if any
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Parsed URI
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// URL host
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.uri.host()
    }

    /// URL path
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Raw query string, if any
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    /// Decomposed query items, preserving order and multiplicity.
    ///
    /// A key without `=` decodes to a `None` value, distinct from an empty
    /// one. Repeated keys stay repeated; `?a=1&a=2` and `?a=2&a=1` compare
    /// unequal.
    #[must_use]
    pub fn query_items(&self) -> Vec<(String, Option<String>)> {
        let Some(query) = self.uri.query() else {
            return Vec::new();
        };

        query
            .split('&')
            .map(|item| match item.split_once('=') {
                Some((name, value)) => (decode(name), Some(decode(value))),
                None => (decode(item), None),
            })
            .collect()
    }
}

fn decode(text: &str) -> String {
    urlencoding::decode(text)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| text.to_string())
}

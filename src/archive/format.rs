//! JSON interchange format for archives

use hyper::Uri;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{RepriseError, Result};

use super::model::{Archive, Entry};

/// Current interchange document version
pub const FORMAT_VERSION: u32 = 1;

/// On-the-wire document shape
#[derive(Serialize, Deserialize)]
struct ArchiveDocument {
    version: u32,
    entries: Vec<Entry>,
}

impl Archive {
    /// Parse an archive from its interchange document.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::ArchiveFormat`] on unparsable JSON, an
    /// unsupported version, or any structurally invalid entry (missing
    /// method, malformed URL, undecodable body, out-of-range status). A bad
    /// entry fails the whole load; it is never silently skipped.
    pub fn from_json(text: &str) -> Result<Self> {
        let document: ArchiveDocument = serde_json::from_str(text)
            .map_err(|e| RepriseError::ArchiveFormat(format!("Failed to parse archive: {e}")))?;

        if document.version != FORMAT_VERSION {
            return Err(RepriseError::ArchiveFormat(format!(
                "Unsupported archive version: {}, expected {FORMAT_VERSION}",
                document.version
            )));
        }

        for (index, entry) in document.entries.iter().enumerate() {
            validate_entry(entry)
                .map_err(|e| RepriseError::ArchiveFormat(format!("Entry {index}: {e}")))?;
        }

        debug!("Loaded archive: {} entries", document.entries.len());

        Ok(Self {
            entries: document.entries,
        })
    }

    /// Serialize to the interchange document.
    ///
    /// Output is pretty-printed with stable field order, suitable for
    /// committing alongside the tests that replay it.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::ArchiveFormat`] if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        let document = ArchiveDocument {
            version: FORMAT_VERSION,
            entries: self.entries.clone(),
        };

        serde_json::to_string_pretty(&document)
            .map_err(|e| RepriseError::ArchiveFormat(format!("Failed to serialize archive: {e}")))
    }
}

/// Check one entry against the schema, returning a plain message for the
/// caller to wrap with entry context.
fn validate_entry(entry: &Entry) -> std::result::Result<(), String> {
    if entry.request.method.trim().is_empty() {
        return Err("missing request method".to_string());
    }

    let uri: Uri = entry
        .request
        .url
        .parse()
        .map_err(|e| format!("malformed URL {:?}: {e}", entry.request.url))?;
    if uri.scheme().is_none() || uri.host().is_none() {
        return Err(format!("URL is not absolute: {:?}", entry.request.url));
    }

    if !(100..=599).contains(&entry.response.status) {
        return Err(format!("invalid status code: {}", entry.response.status));
    }

    if let Some(body) = &entry.request.body {
        body.bytes().map_err(|e| format!("request body: {e}"))?;
    }
    if let Some(body) = &entry.response.body {
        body.bytes().map_err(|e| format!("response body: {e}"))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::model::{Body, Header, RecordedRequest, RecordedResponse};

    fn sample_entry(url: &str) -> Entry {
        Entry {
            request: RecordedRequest {
                method: "GET".to_string(),
                url: url.to_string(),
                headers: vec![Header::new("Accept", "application/json")],
                body: None,
            },
            response: RecordedResponse {
                status: 200,
                headers: vec![Header::new("Content-Type", "application/json")],
                body: Some(Body::from_text("{\"ok\":true}")),
            },
        }
    }

    #[test]
    fn test_roundtrip() {
        let archive = Archive::new(vec![
            sample_entry("https://api.example.com/v1/users"),
            sample_entry("https://api.example.com/v1/users?page=2"),
        ]);

        let json = archive.to_json().unwrap();
        let reloaded = Archive::from_json(&json).unwrap();

        assert_eq!(reloaded, archive);
    }

    #[test]
    fn test_parse_minimal_document() {
        let json = r#"{
            "version": 1,
            "entries": [{
                "request": {
                    "method": "GET",
                    "url": "https://api.example.com/health"
                },
                "response": {
                    "status": 204
                }
            }]
        }"#;

        let archive = Archive::from_json(json).unwrap();
        assert_eq!(archive.len(), 1);
        assert_eq!(archive.entries[0].response.status, 204);
        assert!(archive.entries[0].request.body.is_none());
    }

    #[test]
    fn test_unparsable_json_fails() {
        let result = Archive::from_json("{ nope");
        assert!(matches!(result, Err(RepriseError::ArchiveFormat(_))));
    }

    #[test]
    fn test_missing_required_field_fails() {
        // Request without a URL
        let json = r#"{
            "version": 1,
            "entries": [{
                "request": { "method": "GET" },
                "response": { "status": 200 }
            }]
        }"#;

        let result = Archive::from_json(json);
        assert!(matches!(result, Err(RepriseError::ArchiveFormat(_))));
    }

    #[test]
    fn test_malformed_url_fails_load() {
        let mut entry = sample_entry("https://api.example.com/v1/users");
        entry.request.url = "not a url".to_string();
        let json = Archive::new(vec![entry]).to_json().unwrap();

        let result = Archive::from_json(&json);
        assert!(matches!(result, Err(RepriseError::ArchiveFormat(_))));
    }

    #[test]
    fn test_relative_url_fails_load() {
        let mut entry = sample_entry("https://api.example.com/v1/users");
        entry.request.url = "/v1/users".to_string();
        let json = Archive::new(vec![entry]).to_json().unwrap();

        let result = Archive::from_json(&json);
        assert!(matches!(result, Err(RepriseError::ArchiveFormat(_))));
    }

    #[test]
    fn test_invalid_status_fails_load() {
        let mut entry = sample_entry("https://api.example.com/v1/users");
        entry.response.status = 1000;
        let json = Archive::new(vec![entry]).to_json().unwrap();

        let result = Archive::from_json(&json);
        assert!(matches!(result, Err(RepriseError::ArchiveFormat(_))));
    }

    #[test]
    fn test_unsupported_version_fails() {
        let json = r#"{ "version": 99, "entries": [] }"#;
        let result = Archive::from_json(json);
        assert!(matches!(result, Err(RepriseError::ArchiveFormat(_))));
    }

    #[test]
    fn test_binary_body_roundtrip() {
        let mut entry = sample_entry("https://api.example.com/blob");
        entry.response.body = Some(Body::from_bytes(&[0xff, 0x00, 0x7f, 0x80]));

        let json = Archive::new(vec![entry.clone()]).to_json().unwrap();
        let reloaded = Archive::from_json(&json).unwrap();

        assert_eq!(
            reloaded.entries[0].response.body_bytes().unwrap(),
            vec![0xff, 0x00, 0x7f, 0x80]
        );
        assert_eq!(reloaded.entries[0], entry);
    }
}

//! Composable predicates deciding when two requests are "the same"

use std::fmt;
use std::sync::Arc;

use crate::archive::Entry;

mod request;

pub use request::RequestParts;

/// Capability slot for user-supplied matching logic.
///
/// The fixed [`Matcher`] vocabulary and custom predicates share one call
/// site in the engine; implement this (or pass a closure to
/// [`Matcher::custom`]) for comparisons the vocabulary cannot express, such
/// as structural JSON body equality.
pub trait RequestPredicate: Send + Sync {
    /// Whether `request` should be treated as the same as `candidate`
    fn matches(&self, request: &RequestParts, candidate: &RequestParts) -> bool;
}

impl<F> RequestPredicate for F
where
    F: Fn(&RequestParts, &RequestParts) -> bool + Send + Sync,
{
    fn matches(&self, request: &RequestParts, candidate: &RequestParts) -> bool {
        self(request, candidate)
    }
}

/// Strategy for matching incoming requests to recorded entries
#[derive(Clone)]
pub enum Matcher {
    /// Matches HTTP method (e.g. `GET`, `POST`)
    Method,
    /// Matches the full absolute URL string, including scheme, host, path,
    /// and query
    Url,
    /// Matches URL host (e.g. `api.example.com`)
    Host,
    /// Matches URL path (e.g. `/v1/users/42`)
    Path,
    /// Matches decomposed query items, preserving order and multiplicity
    Query,
    /// Matches the values of the named headers.
    ///
    /// Name lookup is case-insensitive. A name missing from either side is
    /// a mismatch, not a wildcard.
    Headers(Vec<String>),
    /// Matches the raw body bytes, with no decoding or normalization
    Body,
    /// Escape hatch for custom matching logic
    Custom(Arc<dyn RequestPredicate>),
}

impl Matcher {
    /// Wrap a closure as a custom matcher
    pub fn custom<F>(predicate: F) -> Self
    where
        F: Fn(&RequestParts, &RequestParts) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(predicate))
    }

    fn matches(&self, request: &RequestParts, candidate: &RequestParts) -> bool {
        match self {
            Self::Method => request.method == candidate.method,
            Self::Url => request.url == candidate.url,
            Self::Host => request.host() == candidate.host(),
            Self::Path => request.path() == candidate.path(),
            Self::Query => request.query_items() == candidate.query_items(),
            Self::Headers(names) => names.iter().all(|name| {
                match (request.header(name), candidate.header(name)) {
                    (Some(incoming), Some(recorded)) => incoming == recorded,
                    _ => false,
                }
            }),
            Self::Body => request.body() == candidate.body(),
            Self::Custom(predicate) => predicate.matches(request, candidate),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method => write!(f, "Method"),
            Self::Url => write!(f, "Url"),
            Self::Host => write!(f, "Host"),
            Self::Path => write!(f, "Path"),
            Self::Query => write!(f, "Query"),
            Self::Headers(names) => f.debug_tuple("Headers").field(names).finish(),
            Self::Body => write!(f, "Body"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// Ordered list of matchers combined with logical AND.
///
/// The default set is `{Method, Url}`: the strictest practical strategy,
/// treating any query string change as a mismatch while ignoring headers and
/// body. An empty set matches everything.
#[derive(Debug, Clone)]
pub struct MatcherSet {
    matchers: Vec<Matcher>,
}

impl Default for MatcherSet {
    fn default() -> Self {
        Self::new(vec![Matcher::Method, Matcher::Url])
    }
}

impl MatcherSet {
    /// Create a matcher set from an ordered matcher list
    #[must_use]
    pub fn new(matchers: Vec<Matcher>) -> Self {
        Self { matchers }
    }

    /// Number of matchers in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    /// Whether the set holds no matchers
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Whether every matcher accepts the pair
    #[must_use]
    pub fn matches(&self, request: &RequestParts, candidate: &RequestParts) -> bool {
        self.matchers
            .iter()
            .all(|matcher| matcher.matches(request, candidate))
    }

    /// Whether the request matches a recorded entry.
    ///
    /// An entry whose stored request cannot be reconstructed (unparsable
    /// URL) is treated as a non-match rather than an error.
    #[must_use]
    pub fn matches_entry(&self, request: &RequestParts, entry: &Entry) -> bool {
        match entry.request.to_parts() {
            Some(candidate) => self.matches(request, &candidate),
            None => false,
        }
    }

    /// First entry in archive order accepted by every matcher.
    ///
    /// Deterministic: unchanged entries and request always select the same
    /// entry.
    #[must_use]
    pub fn first_match<'a>(
        &self,
        request: &RequestParts,
        entries: &'a [Entry],
    ) -> Option<&'a Entry> {
        entries
            .iter()
            .find(|entry| self.matches_entry(request, entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::{Body, Entry, Header, RecordedRequest, RecordedResponse};
    use proptest::prelude::*;

    fn entry(method: &str, url: &str) -> Entry {
        Entry {
            request: RecordedRequest {
                method: method.to_string(),
                url: url.to_string(),
                headers: vec![],
                body: None,
            },
            response: RecordedResponse {
                status: 200,
                headers: vec![],
                body: Some(Body::from_text(url)),
            },
        }
    }

    fn request(method: &str, url: &str) -> RequestParts {
        RequestParts::new(method, url).unwrap()
    }

    #[test]
    fn test_default_set_matches_method_and_url() {
        let entries = vec![
            entry("POST", "https://api.example.com/v1/users"),
            entry("GET", "https://api.example.com/v1/users"),
        ];
        let set = MatcherSet::default();

        let matched = set
            .first_match(&request("GET", "https://api.example.com/v1/users"), &entries)
            .unwrap();
        assert_eq!(matched.request.method, "GET");

        assert!(set
            .first_match(&request("GET", "https://api.example.com/v2/users"), &entries)
            .is_none());
    }

    #[test]
    fn test_default_set_ignores_headers_and_body() {
        let entries = vec![entry("GET", "https://api.example.com/v1/users")];
        let set = MatcherSet::default();

        let incoming = request("GET", "https://api.example.com/v1/users")
            .with_header("Authorization", "Bearer shiny-token")
            .with_body(&b"ignored"[..]);

        assert!(set.first_match(&incoming, &entries).is_some());
    }

    #[test]
    fn test_first_match_wins() {
        let mut first = entry("GET", "https://api.example.com/v1/users");
        first.response.status = 201;
        let second = entry("GET", "https://api.example.com/v1/users");

        let set = MatcherSet::default();
        let entries = [first, second];
        let matched = set
            .first_match(
                &request("GET", "https://api.example.com/v1/users"),
                &entries,
            )
            .unwrap();
        assert_eq!(matched.response.status, 201);
    }

    #[test]
    fn test_empty_set_matches_everything() {
        let entries = vec![entry("DELETE", "https://other.example.com/anything")];
        let set = MatcherSet::new(vec![]);

        assert!(set
            .first_match(&request("GET", "https://api.example.com/v1/users"), &entries)
            .is_some());
    }

    #[test]
    fn test_unparsable_entry_url_is_skipped() {
        let mut broken = entry("GET", "https://api.example.com/v1/users");
        broken.request.url = "not a url".to_string();
        let good = entry("GET", "https://api.example.com/v1/users");

        let set = MatcherSet::default();
        let entries = [broken, good];
        let matched = set
            .first_match(
                &request("GET", "https://api.example.com/v1/users"),
                &entries,
            )
            .unwrap();
        assert_eq!(matched.request.url, "https://api.example.com/v1/users");
    }

    #[test]
    fn test_host_and_path_matchers() {
        let entries = vec![entry("GET", "https://api.example.com/v1/users?page=2")];

        let by_host = MatcherSet::new(vec![Matcher::Host]);
        assert!(by_host
            .first_match(&request("POST", "https://api.example.com/other"), &entries)
            .is_some());
        assert!(by_host
            .first_match(&request("GET", "https://files.example.com/v1/users"), &entries)
            .is_none());

        let by_path = MatcherSet::new(vec![Matcher::Path]);
        assert!(by_path
            .first_match(&request("GET", "http://anywhere.test/v1/users"), &entries)
            .is_some());
        assert!(by_path
            .first_match(&request("GET", "https://api.example.com/v1/teams"), &entries)
            .is_none());
    }

    #[test]
    fn test_query_matcher_order_sensitive() {
        let entries = vec![entry("GET", "https://api.example.com/search?a=1&a=2")];
        let set = MatcherSet::new(vec![Matcher::Query]);

        assert!(set
            .first_match(
                &request("GET", "https://other.example.com/else?a=1&a=2"),
                &entries
            )
            .is_some());

        // Same items, different order: distinct
        assert!(set
            .first_match(
                &request("GET", "https://api.example.com/search?a=2&a=1"),
                &entries
            )
            .is_none());

        // Same key, collapsed multiplicity: distinct
        assert!(set
            .first_match(
                &request("GET", "https://api.example.com/search?a=1"),
                &entries
            )
            .is_none());
    }

    #[test]
    fn test_headers_matcher_subset_semantics() {
        let mut recorded = entry("GET", "https://api.example.com/v1/users");
        recorded.request.headers = vec![
            Header::new("Accept", "application/json"),
            Header::new("X-Trace", "abc"),
        ];
        let entries = vec![recorded];
        let set = MatcherSet::new(vec![Matcher::Headers(vec!["Accept".to_string()])]);

        let base = || request("GET", "https://api.example.com/v1/users");

        // In-set header equal, out-of-set header different: match
        let incoming = base()
            .with_header("accept", "application/json")
            .with_header("X-Trace", "totally-different");
        assert!(set.first_match(&incoming, &entries).is_some());

        // In-set header different: no match
        let incoming = base().with_header("Accept", "text/html");
        assert!(set.first_match(&incoming, &entries).is_none());

        // In-set header missing from the incoming side: no match
        assert!(set.first_match(&base(), &entries).is_none());

        // In-set header missing from the recorded side: no match
        let set = MatcherSet::new(vec![Matcher::Headers(vec!["X-Missing".to_string()])]);
        let incoming = base().with_header("X-Missing", "present");
        assert!(set.first_match(&incoming, &entries).is_none());
    }

    #[test]
    fn test_body_matcher_raw_bytes() {
        let mut recorded = entry("POST", "https://api.example.com/v1/users");
        recorded.request.body = Some(Body::from_text("{\"name\":\"ada\"}"));
        let entries = vec![recorded];
        let set = MatcherSet::new(vec![Matcher::Body]);

        let incoming = request("POST", "https://api.example.com/v1/users")
            .with_body(&b"{\"name\":\"ada\"}"[..]);
        assert!(set.first_match(&incoming, &entries).is_some());

        // Whitespace difference is a mismatch; bytes are not normalized
        let incoming = request("POST", "https://api.example.com/v1/users")
            .with_body(&b"{ \"name\": \"ada\" }"[..]);
        assert!(set.first_match(&incoming, &entries).is_none());

        // Absent on one side only: no match
        let incoming = request("POST", "https://api.example.com/v1/users");
        assert!(set.first_match(&incoming, &entries).is_none());
    }

    #[test]
    fn test_custom_predicate() {
        let entries = vec![entry("GET", "https://api.example.com/v1/users?token=one")];
        let set = MatcherSet::new(vec![
            Matcher::Method,
            Matcher::custom(|request, candidate| request.path() == candidate.path()),
        ]);

        let incoming = request("GET", "https://api.example.com/v1/users?token=two");
        assert!(set.first_match(&incoming, &entries).is_some());

        let incoming = request("POST", "https://api.example.com/v1/users?token=two");
        assert!(set.first_match(&incoming, &entries).is_none());
    }

    #[test]
    fn test_first_match_deterministic() {
        let entries: Vec<Entry> = (0..8)
            .map(|i| entry("GET", &format!("https://api.example.com/item/{i}")))
            .collect();
        let set = MatcherSet::default();
        let incoming = request("GET", "https://api.example.com/item/5");

        let first = set.first_match(&incoming, &entries).map(|e| e.request.url.clone());
        for _ in 0..10 {
            let again = set.first_match(&incoming, &entries).map(|e| e.request.url.clone());
            assert_eq!(again, first);
        }
    }

    proptest! {
        #[test]
        fn prop_default_set_ignores_headers_and_body(
            header_value in "[ -~]{0,32}",
            body in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let entries = vec![entry("GET", "https://api.example.com/v1/users")];
            let set = MatcherSet::default();

            let incoming = request("GET", "https://api.example.com/v1/users")
                .with_header("X-Noise", header_value)
                .with_body(body);

            prop_assert!(set.first_match(&incoming, &entries).is_some());
        }

        #[test]
        fn prop_first_match_is_earliest(target in 0usize..6) {
            let entries: Vec<Entry> = (0..6)
                .map(|i| {
                    let path = if i >= target { "/hit" } else { "/miss" };
                    let mut e = entry("GET", &format!("https://api.example.com{path}"));
                    e.response.status = 200 + i as u16;
                    e
                })
                .collect();

            let set = MatcherSet::new(vec![Matcher::Method, Matcher::Path]);
            let incoming = request("GET", "https://api.example.com/hit");

            let matched = set.first_match(&incoming, &entries).unwrap();
            // The earliest qualifying entry wins
            prop_assert_eq!(matched.response.status, 200 + target as u16);
        }
    }
}

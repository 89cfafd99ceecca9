//! HTTP client for forwarding requests to the live network

use std::time::Duration;

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Method, Request};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::{debug, warn};

use crate::archive::{Body, Header, RecordedResponse};
use crate::matcher::RequestParts;
use crate::{RepriseError, Result};

/// The real-network seam.
///
/// The only operation in the engine that performs blocking I/O; timeouts and
/// cancellation are whatever the underlying client enforces. Tests substitute
/// a scripted implementation.
#[async_trait]
pub trait NetworkTransport: Send + Sync {
    /// Perform the request against the live network
    async fn send(&self, request: &RequestParts) -> Result<RecordedResponse>;
}

/// Pass-through client over a pooled hyper connector
pub struct HttpClient {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpClient {
    /// Create a new HTTP client
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .build_http();

        Self { client }
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NetworkTransport for HttpClient {
    async fn send(&self, request: &RequestParts) -> Result<RecordedResponse> {
        debug!("Forwarding {} {}", request.method, request.url);

        let method = request.method.parse::<Method>().map_err(|e| {
            RepriseError::InvalidRequest(format!("Invalid HTTP method {:?}: {e}", request.method))
        })?;

        let mut builder = Request::builder().method(method).uri(request.uri().clone());
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }

        let body = request.body().unwrap_or_default();
        let http_request = builder
            .body(Full::new(Bytes::copy_from_slice(body)))
            .map_err(|e| RepriseError::InvalidRequest(format!("Failed to build request: {e}")))?;

        let response = self.client.request(http_request).await.map_err(|e| {
            warn!("Request failed: {e}");
            RepriseError::network(e)
        })?;

        let status = response.status().as_u16();
        let headers: Vec<Header> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                Header::new(name.as_str(), value.to_str().unwrap_or("<invalid>"))
            })
            .collect();

        let body_bytes = response
            .into_body()
            .collect()
            .await
            .map_err(RepriseError::network)?
            .to_bytes();

        Ok(RecordedResponse {
            status,
            headers,
            body: if body_bytes.is_empty() {
                None
            } else {
                Some(Body::from_bytes(&body_bytes))
            },
        })
    }
}

//! Per-request interception: scope resolution, mode selection, dispatch

use std::sync::Arc;

use tracing::debug;

use crate::archive::{Entry, RecordedResponse};
use crate::config::{ReplayConfig, UnscopedPolicy};
use crate::matcher::RequestParts;
use crate::store::{PlaybackStore, Resolution, StoreRegistry};
use crate::Result;

use super::network::NetworkTransport;
use super::SCOPE_HEADER;

/// The transport hook every outgoing request passes through.
///
/// Per request: read and strip the scope key, resolve the scope's store,
/// pick the effective recording mode, and either serve a recorded response,
/// forward to the live network (capturing the exchange in record mode), or
/// surface the failure. A playback miss is a hard error here; falling
/// through to the network would defeat deterministic playback.
pub struct InterceptTransport {
    registry: Arc<StoreRegistry>,
    network: Arc<dyn NetworkTransport>,
    config: ReplayConfig,
    ambient: Arc<PlaybackStore>,
}

impl InterceptTransport {
    /// Install interception over a registry and a real transport
    #[must_use]
    pub fn new(
        registry: Arc<StoreRegistry>,
        network: Arc<dyn NetworkTransport>,
        config: ReplayConfig,
    ) -> Self {
        Self {
            registry,
            network,
            config,
            ambient: Arc::new(PlaybackStore::new()),
        }
    }

    /// The store serving requests that carry no scope key under
    /// [`UnscopedPolicy::Ambient`]
    #[must_use]
    pub fn ambient_store(&self) -> Arc<PlaybackStore> {
        Arc::clone(&self.ambient)
    }

    /// The registry this transport resolves scopes against
    #[must_use]
    pub fn registry(&self) -> Arc<StoreRegistry> {
        Arc::clone(&self.registry)
    }

    /// Run one request through the interception state machine.
    ///
    /// # Errors
    ///
    /// Returns [`crate::RepriseError::NoMatchFound`] on a playback-mode
    /// miss, or a network error from the pass-through, unchanged.
    pub async fn execute(&self, mut request: RequestParts) -> Result<RecordedResponse> {
        let scope_key = request.remove_header(SCOPE_HEADER);

        let store = match &scope_key {
            // Scope stores are created on first reference
            Some(key) => self.registry.register(key),
            None => match self.config.unscoped {
                UnscopedPolicy::Ambient => Arc::clone(&self.ambient),
                UnscopedPolicy::Bypass => {
                    debug!("Unscoped bypass: {} {}", request.method, request.url);
                    return self.network.send(&request).await;
                }
            },
        };

        let mode = store.mode().unwrap_or(self.config.default_mode);

        match store.resolve(&request, &self.config.matchers, mode)? {
            Resolution::Replayed(response) => Ok(response),
            Resolution::Passthrough { record } => {
                let response = self.network.send(&request).await?;
                if record {
                    store.record(Entry::from_exchange(&request, response.clone()));
                }
                Ok(response)
            }
        }
    }
}

//! Interception transport and the real-network seam

mod intercept;
mod network;

pub use intercept::InterceptTransport;
pub use network::{HttpClient, NetworkTransport};

/// Reserved request header carrying the scope key.
///
/// Session setup attaches it to every outgoing request; the interception
/// transport strips it before matching and before any pass-through, so the
/// marker never reaches recorded entries or the live network.
pub const SCOPE_HEADER: &str = "x-reprise-scope";

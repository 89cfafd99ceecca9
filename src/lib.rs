//! Reprise - Scoped HTTP record-replay engine for deterministic tests
//!
//! Requests flow through a [`transport::InterceptTransport`], which resolves
//! the calling test's scope to a [`store::PlaybackStore`] and either serves a
//! recorded response, forwards to the live network while capturing the
//! exchange, or passes straight through.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::cargo)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation,
    clippy::multiple_crate_versions
)]

pub mod archive;
pub mod config;
pub mod error;
pub mod matcher;
pub mod store;
pub mod stub;
pub mod transport;

pub use config::{RecordingMode, ReplayConfig, UnscopedPolicy};
pub use error::{RepriseError, Result};

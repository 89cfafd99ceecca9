//! Per-scope playback stores and the shared scope registry

mod playback;
mod registry;

pub use playback::{MatchPolicy, PlaybackStore, Resolution};
pub use registry::StoreRegistry;

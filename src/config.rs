//! Configuration types for Reprise

use crate::matcher::MatcherSet;
use crate::{RepriseError, Result};

/// Name of the environment variable selecting the recording mode by name.
pub const MODE_VAR: &str = "REPLAY_MODE";

/// Boolean-style environment variable forcing live mode.
pub const LIVE_VAR: &str = "REPLAY_LIVE";

/// Boolean-style environment variable forcing record mode.
pub const RECORD_VAR: &str = "REPLAY_RECORDING";

/// Process argument forcing live mode.
pub const LIVE_ARG: &str = "--enable-replay-live";

/// Process argument forcing record mode.
pub const RECORD_ARG: &str = "--enable-replay-recording";

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingMode {
    /// Replay mode: serve matches from the archive, fail on a miss
    Playback,
    /// Record mode: serve matches, capture misses from the live network
    Record,
    /// Live mode: pass everything through without consulting the archive
    Live,
}

impl RecordingMode {
    /// Resolve the mode from the process environment and arguments.
    ///
    /// This reads the ambient process state once; prefer calling it a single
    /// time at setup and threading the result through [`ReplayConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::InvalidRecordingMode`] if `REPLAY_MODE` is set
    /// to an unrecognized value.
    pub fn from_env() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        resolve_mode(|key| std::env::var(key).ok(), &args)
    }

    /// Check if mode is Playback
    #[must_use]
    pub fn is_playback(self) -> bool {
        matches!(self, Self::Playback)
    }

    /// Check if mode is Record
    #[must_use]
    pub fn is_record(self) -> bool {
        matches!(self, Self::Record)
    }

    /// Check if mode is Live
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }
}

/// Resolve the recording mode from injected environment and argument views.
///
/// Precedence: explicit `REPLAY_MODE` > `REPLAY_LIVE` > `REPLAY_RECORDING` >
/// command-line switches > playback default. The explicit variable accepts
/// `playback`/`replay`, `record`/`recording`, and `live`/`passthrough`,
/// case-insensitive and trimmed.
///
/// # Errors
///
/// Returns [`RepriseError::InvalidRecordingMode`] for any other non-empty
/// explicit value; a typo must fail loudly rather than silently defaulting.
pub fn resolve_mode<E>(env: E, args: &[String]) -> Result<RecordingMode>
where
    E: Fn(&str) -> Option<String>,
{
    if let Some(raw) = env(MODE_VAR) {
        let mode = raw.trim().to_lowercase();
        if !mode.is_empty() {
            return match mode.as_str() {
                "playback" | "replay" => Ok(RecordingMode::Playback),
                "record" | "recording" => Ok(RecordingMode::Record),
                "live" | "passthrough" => Ok(RecordingMode::Live),
                _ => Err(RepriseError::InvalidRecordingMode(raw)),
            };
        }
    }

    if is_truthy(env(LIVE_VAR).as_deref()) {
        return Ok(RecordingMode::Live);
    }
    if is_truthy(env(RECORD_VAR).as_deref()) {
        return Ok(RecordingMode::Record);
    }

    // Some test runners support passing custom args to the test process.
    if args.iter().any(|arg| arg == LIVE_ARG) {
        return Ok(RecordingMode::Live);
    }
    if args.iter().any(|arg| arg == RECORD_ARG) {
        return Ok(RecordingMode::Record);
    }

    Ok(RecordingMode::Playback)
}

fn is_truthy(value: Option<&str>) -> bool {
    let Some(value) = value else { return false };
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// Policy for requests that carry no scope key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnscopedPolicy {
    /// Resolve against a transport-owned ambient store. A playback miss
    /// still fails loudly rather than touching the network.
    #[default]
    Ambient,
    /// Forward directly to the live network without consulting any store
    Bypass,
}

/// Engine configuration, resolved once at setup and threaded into the
/// interception transport.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Process-wide default mode; a store's per-scope override wins
    pub default_mode: RecordingMode,
    /// Matcher set applied to every resolution
    pub matchers: MatcherSet,
    /// Handling of requests without a scope key
    pub unscoped: UnscopedPolicy,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            default_mode: RecordingMode::Playback,
            matchers: MatcherSet::default(),
            unscoped: UnscopedPolicy::default(),
        }
    }
}

impl ReplayConfig {
    /// Build a configuration with the mode resolved from the process
    /// environment and arguments.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::InvalidRecordingMode`] if `REPLAY_MODE` holds
    /// an unrecognized value.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            default_mode: RecordingMode::from_env()?,
            ..Self::default()
        })
    }

    /// Replace the matcher set
    #[must_use]
    pub fn with_matchers(mut self, matchers: MatcherSet) -> Self {
        self.matchers = matchers;
        self
    }

    /// Replace the unscoped-request policy
    #[must_use]
    pub fn with_unscoped(mut self, policy: UnscopedPolicy) -> Self {
        self.unscoped = policy;
        self
    }
}

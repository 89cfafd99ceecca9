//! Playback store: one scope's view of an archive

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::archive::{Archive, Entry, RecordedResponse};
use crate::config::RecordingMode;
use crate::matcher::{MatcherSet, RequestParts};
use crate::stub::Stub;
use crate::{RepriseError, Result};

/// Whether a matched entry stays matchable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// A matched entry keeps matching subsequent requests (baseline contract)
    #[default]
    Reusable,
    /// Each entry is consumed by its first match and skipped thereafter
    SingleUse,
}

/// Outcome of a store resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Serve this recorded response; the network must not be touched
    Replayed(RecordedResponse),
    /// Forward to the live network; when `record` is set, hand the captured
    /// exchange back via [`PlaybackStore::record`]
    Passthrough {
        /// Append the live exchange to the store afterwards
        record: bool,
    },
}

/// Entry state owned by one scope.
///
/// Baseline entries (loaded or stubbed) and newly recorded entries are kept
/// separate so export never reorders the baseline ahead of new recordings.
/// Match indexes run over the chained baseline-then-recorded view.
#[derive(Default)]
struct StoreState {
    baseline: Vec<Entry>,
    recorded: Vec<Entry>,
    consumed: HashSet<usize>,
    mode_override: Option<RecordingMode>,
    policy: MatchPolicy,
}

impl StoreState {
    fn find_match(&self, request: &RequestParts, matchers: &MatcherSet) -> Option<usize> {
        let single_use = self.policy == MatchPolicy::SingleUse;
        self.baseline
            .iter()
            .chain(self.recorded.iter())
            .enumerate()
            .filter(|(index, _)| !(single_use && self.consumed.contains(index)))
            .find(|(_, entry)| matchers.matches_entry(request, entry))
            .map(|(index, _)| index)
    }

    fn entry_at(&self, index: usize) -> &Entry {
        if index < self.baseline.len() {
            &self.baseline[index]
        } else {
            &self.recorded[index - self.baseline.len()]
        }
    }
}

/// Owns one archive's entries for the lifetime of one test scope.
///
/// All entry state sits behind a store-local lock, so `resolve` and `record`
/// are serialized and first-match stays atomic with respect to appends even
/// when a single scope issues concurrent requests.
pub struct PlaybackStore {
    state: Mutex<StoreState>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl PlaybackStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().expect("store lock poisoned")
    }

    /// Replace the baseline entries with an archive's.
    ///
    /// Entries recorded this session are kept; consumption bookkeeping is
    /// reset because entry positions change.
    pub fn load(&self, archive: Archive) {
        let mut state = self.state();
        debug!("Loading {} baseline entries", archive.len());
        state.baseline = archive.entries;
        state.consumed.clear();
    }

    /// Parse an interchange document and load it as the baseline.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::ArchiveFormat`] without touching existing
    /// state if the document does not parse into the entry schema.
    pub fn load_json(&self, text: &str) -> Result<()> {
        let archive = Archive::from_json(text)?;
        self.load(archive);
        Ok(())
    }

    /// Append an in-memory stub to the baseline
    pub fn stub(&self, stub: Stub) {
        self.state().baseline.push(stub.into_entry());
    }

    /// Decide how to serve a request under the given mode.
    ///
    /// - `Playback`: first structural match wins; a miss is
    ///   [`RepriseError::NoMatchFound`], never a network fallback.
    /// - `Record`: a match replays (repeated runs against a partially
    ///   populated archive stay deterministic); a miss asks the transport to
    ///   pass through and record.
    /// - `Live`: pass through; entries are neither consulted nor mutated.
    ///
    /// # Errors
    ///
    /// Returns [`RepriseError::NoMatchFound`] carrying the unmatched request
    /// on a playback-mode miss.
    pub fn resolve(
        &self,
        request: &RequestParts,
        matchers: &MatcherSet,
        mode: RecordingMode,
    ) -> Result<Resolution> {
        if mode.is_live() {
            debug!("Live mode: {} {}", request.method, request.url);
            return Ok(Resolution::Passthrough { record: false });
        }

        let mut state = self.state();
        match state.find_match(request, matchers) {
            Some(index) => {
                if state.policy == MatchPolicy::SingleUse {
                    state.consumed.insert(index);
                }
                let response = state.entry_at(index).response.clone();
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "Match: {} {} -> {}",
                    request.method, request.url, response.status
                );
                Ok(Resolution::Replayed(response))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                if mode.is_record() {
                    debug!("Miss, capturing: {} {}", request.method, request.url);
                    Ok(Resolution::Passthrough { record: true })
                } else {
                    warn!("No match: {} {}", request.method, request.url);
                    Err(RepriseError::NoMatchFound {
                        request: Box::new(request.clone()),
                    })
                }
            }
        }
    }

    /// Append a captured entry.
    ///
    /// The entry is immediately visible to subsequent resolutions in this
    /// scope.
    pub fn record(&self, entry: Entry) {
        let mut state = self.state();
        debug!(
            "Recorded: {} {} -> {}",
            entry.request.method, entry.request.url, entry.response.status
        );
        state.recorded.push(entry);
    }

    /// Snapshot every entry, baseline order followed by appended order.
    ///
    /// Callers persisting at scope teardown should export only after the
    /// scope's in-flight requests have completed.
    #[must_use]
    pub fn export(&self) -> Archive {
        let state = self.state();
        Archive::new(
            state
                .baseline
                .iter()
                .chain(state.recorded.iter())
                .cloned()
                .collect(),
        )
    }

    /// Per-scope mode override, if any
    #[must_use]
    pub fn mode(&self) -> Option<RecordingMode> {
        self.state().mode_override
    }

    /// Set or clear the per-scope mode override
    pub fn set_mode(&self, mode: Option<RecordingMode>) {
        self.state().mode_override = mode;
    }

    /// Set the match consumption policy
    pub fn set_match_policy(&self, policy: MatchPolicy) {
        self.state().policy = policy;
    }

    /// Total entries currently held (baseline plus recorded)
    #[must_use]
    pub fn entry_count(&self) -> usize {
        let state = self.state();
        state.baseline.len() + state.recorded.len()
    }

    /// Number of resolutions served from entries
    #[must_use]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    /// Number of resolutions that found no entry
    #[must_use]
    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}

impl Default for PlaybackStore {
    fn default() -> Self {
        Self::new()
    }
}

//! Thread-safe storage for the active EDL snapshot
//!
//! Holds at most one accepted snapshot behind a mutex. Writers
//! (validate + install) are fully serialized; readers take a clone of
//! the snapshot and proceed without the lock.

use crate::edl::revision::revision_of;
use crate::edl::validate::{validate, ValidationError};
use crate::media::MediaInfo;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::info;
use waveforge_common::model::Edl;

/// An accepted, validated EDL with its derived revision and counts.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// The accepted document, revision stamped
    pub edl: Edl,
    /// Derived content revision (12 hex chars)
    pub revision: String,
    /// Number of tracks
    pub track_count: usize,
    /// Total clips across all tracks
    pub clip_count: usize,
    /// Probe results for every media entry, keyed by media id
    pub media_info: HashMap<String, MediaInfo>,
}

/// Single-slot store for the active EDL snapshot.
#[derive(Default)]
pub struct EdlStore {
    current: Mutex<Option<Snapshot>>,
}

impl EdlStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a candidate EDL and, on success, install it as the
    /// active snapshot.
    ///
    /// The derived revision is stamped into the stored document (and
    /// the returned snapshot) regardless of any revision the caller
    /// supplied.
    pub fn replace(&self, edl: Edl) -> Result<Snapshot, ValidationError> {
        // Lock taken for the full validate-and-install so concurrent
        // writers are serialized
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());

        let mut snapshot = validate(&edl)?;
        snapshot.revision = revision_of(&edl);
        snapshot.edl.revision = snapshot.revision.clone();

        info!(
            "EDL accepted: id={} revision={} tracks={} clips={}",
            snapshot.edl.id, snapshot.revision, snapshot.track_count, snapshot.clip_count
        );

        *current = Some(snapshot.clone());
        Ok(snapshot)
    }

    /// Current snapshot, if any.
    pub fn get(&self) -> Option<Snapshot> {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Whether a snapshot is installed.
    pub fn has_edl(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

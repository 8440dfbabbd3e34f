//! EDL document model
//!
//! The Edit Decision List exchange types shared by the engine, the HTTP
//! API, and the client CLI. Field names are normative for the JSON
//! exchange format; unknown fields are rejected so malformed documents
//! fail loudly at the parse boundary instead of rendering silently
//! wrong audio.
//!
//! All clip timing is expressed in sample units at the EDL sample rate.

use crate::fade::FadeShape;
use serde::{Deserialize, Serialize};

/// A complete Edit Decision List document.
///
/// `revision` may be empty on input; the engine stamps the derived
/// revision hash into the accepted snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Edl {
    /// Caller-assigned document identifier (must be non-empty)
    pub id: String,

    /// Content revision hash; ignored on input, stamped on acceptance
    #[serde(default)]
    pub revision: String,

    /// Timeline sample rate in Hz (44100, 48000, or 96000)
    pub sample_rate: u32,

    /// Media library referenced by clips
    #[serde(default)]
    pub media: Vec<AudioRef>,

    /// Timeline tracks, mixed additively
    #[serde(default)]
    pub tracks: Vec<Track>,
}

/// A media library entry pointing at an on-disk audio file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AudioRef {
    /// Identifier clips use to reference this entry
    pub id: String,

    /// Path to the audio file on disk
    pub path: String,

    /// Declared sample rate; 0 means unspecified (taken from the file)
    #[serde(default)]
    pub sample_rate: u32,

    /// Declared channel count; informational, the file is authoritative
    #[serde(default)]
    pub channels: u32,
}

/// A timeline track holding zero or more clips.
///
/// Track order is preserved from the caller but rendering is
/// order-independent (the mix is additive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Track {
    /// Track identifier (must be non-empty)
    pub id: String,

    /// Track gain in decibels (0.0 = unity)
    #[serde(default)]
    pub gain_db: f32,

    /// Muted tracks are skipped entirely during rendering
    #[serde(default)]
    pub muted: bool,

    /// Clips placed on this track
    #[serde(default)]
    pub clips: Vec<Clip>,
}

/// A placement of a media excerpt on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Clip {
    /// Clip identifier (must be non-empty)
    pub id: String,

    /// Referenced `AudioRef.id`
    pub media_id: String,

    /// Source offset into the media, in samples
    #[serde(default)]
    pub start_in_media: i64,

    /// Excerpt length in samples (must be positive)
    pub duration: i64,

    /// Placement offset on the timeline, in samples
    #[serde(default)]
    pub start_in_timeline: i64,

    /// Clip gain in decibels (0.0 = unity)
    #[serde(default)]
    pub gain_db: f32,

    /// Optional amplitude envelope at clip entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_in: Option<Fade>,

    /// Optional amplitude envelope at clip exit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fade_out: Option<Fade>,
}

/// A fade envelope applied at a clip edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fade {
    /// Envelope length in samples (non-negative; 0 disables the fade)
    pub duration_samples: i64,

    /// Envelope shape
    #[serde(default)]
    pub shape: FadeShape,
}

/// A half-open time range `[start, start + duration)` in samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeRange {
    /// First sample of the range
    pub start_samples: i64,

    /// Range length in samples
    pub duration_samples: i64,
}

impl TimeRange {
    /// One-past-the-end sample of the range.
    pub fn end_samples(&self) -> i64 {
        self.start_samples + self.duration_samples
    }
}

impl Edl {
    /// Total clip count across all tracks.
    pub fn clip_count(&self) -> usize {
        self.tracks.iter().map(|t| t.clips.len()).sum()
    }

    /// Look up a media entry by id.
    pub fn find_media(&self, media_id: &str) -> Option<&AudioRef> {
        self.media.iter().find(|m| m.id == media_id)
    }

    /// Parse an EDL from its JSON exchange form.
    ///
    /// Unknown fields are rejected; enum values parse
    /// case-insensitively.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize to the JSON exchange form.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Clip {
    /// One-past-the-end timeline sample of the clip.
    pub fn end_in_timeline(&self) -> i64 {
        self.start_in_timeline + self.duration
    }
}

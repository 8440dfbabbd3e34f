//! EDL validation
//!
//! Pure function from a candidate EDL to an accepted snapshot or a
//! structured error. Checks run in a fixed order (document id →
//! sample rate → media → tracks → clips) and stop at the first
//! failure.
//!
//! Media checks probe each referenced file once; the probe results are
//! kept on the snapshot so the renderer does not re-probe.

use crate::media::{self, MediaInfo};
use crate::store::Snapshot;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use waveforge_common::model::{Clip, Edl, Fade};

/// Sample rates the engine accepts for EDL timelines
pub const SUPPORTED_SAMPLE_RATES: &[u32] = &[44100, 48000, 96000];

/// What went wrong during validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    EmptyId,
    BadSampleRate,
    NoMedia,
    MediaMissing,
    MediaUnreadable,
    MediaSampleRateMismatch,
    NoTracks,
    EmptyTrackId,
    EmptyClipId,
    UnknownMediaRef,
    NegativeTime,
    NonPositiveDuration,
    ClipOutOfMediaBounds,
    BadFadeShape,
    NegativeFadeLength,
}

/// A structured validation failure.
///
/// `offending_id` names the media, track, or clip the check failed on,
/// when one applies.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
    pub offending_id: Option<String>,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            offending_id: None,
        }
    }

    fn with_id(kind: ValidationErrorKind, message: impl Into<String>, id: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            offending_id: Some(id.to_string()),
        }
    }
}

/// Validate a candidate EDL.
///
/// On success returns a snapshot with counts and probed media info;
/// the revision field is left empty for the store to stamp.
pub fn validate(edl: &Edl) -> Result<Snapshot, ValidationError> {
    if edl.id.is_empty() {
        return Err(ValidationError::new(
            ValidationErrorKind::EmptyId,
            "EDL id cannot be empty",
        ));
    }

    if !SUPPORTED_SAMPLE_RATES.contains(&edl.sample_rate) {
        return Err(ValidationError::new(
            ValidationErrorKind::BadSampleRate,
            format!(
                "Sample rate must be 44100, 48000, or 96000 Hz, got {}",
                edl.sample_rate
            ),
        ));
    }

    let media_info = validate_media(edl)?;
    validate_tracks(edl, &media_info)?;

    Ok(Snapshot {
        edl: edl.clone(),
        revision: String::new(),
        track_count: edl.tracks.len(),
        clip_count: edl.clip_count(),
        media_info,
    })
}

/// Check every media entry: ids, paths, file existence, decodability,
/// and sample-rate agreement. Returns probe results keyed by media id.
fn validate_media(edl: &Edl) -> Result<HashMap<String, MediaInfo>, ValidationError> {
    if edl.media.is_empty() {
        return Err(ValidationError::new(
            ValidationErrorKind::NoMedia,
            "EDL must contain at least one media reference",
        ));
    }

    let mut media_info = HashMap::with_capacity(edl.media.len());

    for media in &edl.media {
        if media.id.is_empty() {
            return Err(ValidationError::new(
                ValidationErrorKind::EmptyId,
                "Media id cannot be empty",
            ));
        }

        if media.path.is_empty() {
            return Err(ValidationError::with_id(
                ValidationErrorKind::MediaMissing,
                format!("Media path cannot be empty for media id: {}", media.id),
                &media.id,
            ));
        }

        let path = Path::new(&media.path);
        if !path.is_file() {
            return Err(ValidationError::with_id(
                ValidationErrorKind::MediaMissing,
                format!("Media file not found: {}", media.path),
                &media.id,
            ));
        }

        let info = media::probe(path).map_err(|e| {
            ValidationError::with_id(
                ValidationErrorKind::MediaUnreadable,
                format!("Unsupported or unreadable audio file: {}: {}", media.path, e),
                &media.id,
            )
        })?;

        if media.sample_rate != 0 && media.sample_rate != info.sample_rate {
            return Err(ValidationError::with_id(
                ValidationErrorKind::MediaSampleRateMismatch,
                format!(
                    "Media sample rate mismatch for {}: specified {} but file is {}",
                    media.id, media.sample_rate, info.sample_rate
                ),
                &media.id,
            ));
        }

        if info.sample_rate != edl.sample_rate {
            return Err(ValidationError::with_id(
                ValidationErrorKind::MediaSampleRateMismatch,
                format!(
                    "Media sample rate mismatch for {}: file is {} but EDL requires {}",
                    media.id, info.sample_rate, edl.sample_rate
                ),
                &media.id,
            ));
        }

        media_info.insert(media.id.clone(), info);
    }

    Ok(media_info)
}

fn validate_tracks(
    edl: &Edl,
    media_info: &HashMap<String, MediaInfo>,
) -> Result<(), ValidationError> {
    if edl.tracks.is_empty() {
        return Err(ValidationError::new(
            ValidationErrorKind::NoTracks,
            "EDL must contain at least one track",
        ));
    }

    for track in &edl.tracks {
        if track.id.is_empty() {
            return Err(ValidationError::new(
                ValidationErrorKind::EmptyTrackId,
                "Track id cannot be empty",
            ));
        }

        for clip in &track.clips {
            validate_clip(clip, media_info)?;
        }
    }

    Ok(())
}

fn validate_clip(
    clip: &Clip,
    media_info: &HashMap<String, MediaInfo>,
) -> Result<(), ValidationError> {
    if clip.id.is_empty() {
        return Err(ValidationError::new(
            ValidationErrorKind::EmptyClipId,
            "Clip id cannot be empty",
        ));
    }

    if clip.media_id.is_empty() {
        return Err(ValidationError::with_id(
            ValidationErrorKind::UnknownMediaRef,
            format!("Clip media_id cannot be empty for clip: {}", clip.id),
            &clip.id,
        ));
    }

    let info = media_info.get(&clip.media_id).ok_or_else(|| {
        ValidationError::with_id(
            ValidationErrorKind::UnknownMediaRef,
            format!("Media not found for clip {}: {}", clip.id, clip.media_id),
            &clip.id,
        )
    })?;

    if clip.start_in_media < 0 {
        return Err(ValidationError::with_id(
            ValidationErrorKind::NegativeTime,
            format!("Clip start_in_media must be non-negative for clip: {}", clip.id),
            &clip.id,
        ));
    }

    if clip.duration <= 0 {
        return Err(ValidationError::with_id(
            ValidationErrorKind::NonPositiveDuration,
            format!("Clip duration must be positive for clip: {}", clip.id),
            &clip.id,
        ));
    }

    if clip.start_in_timeline < 0 {
        return Err(ValidationError::with_id(
            ValidationErrorKind::NegativeTime,
            format!("Clip start_in_timeline must be non-negative for clip: {}", clip.id),
            &clip.id,
        ));
    }

    let media_length = info.length_frames as i64;
    if clip.start_in_media + clip.duration > media_length {
        return Err(ValidationError::with_id(
            ValidationErrorKind::ClipOutOfMediaBounds,
            format!(
                "Clip extends beyond media end for clip {}: start={} duration={} but media length={}",
                clip.id, clip.start_in_media, clip.duration, media_length
            ),
            &clip.id,
        ));
    }

    if let Some(fade) = &clip.fade_in {
        validate_fade(fade, "fade_in", &clip.id)?;
    }
    if let Some(fade) = &clip.fade_out {
        validate_fade(fade, "fade_out", &clip.id)?;
    }

    Ok(())
}

fn validate_fade(fade: &Fade, fade_kind: &str, clip_id: &str) -> Result<(), ValidationError> {
    if fade.duration_samples < 0 {
        return Err(ValidationError::with_id(
            ValidationErrorKind::NegativeFadeLength,
            format!("{} duration must be non-negative for clip: {}", fade_kind, clip_id),
            clip_id,
        ));
    }
    // Shape validity is guaranteed by the typed model; unknown shape
    // strings are rejected at the JSON parse boundary.
    Ok(())
}

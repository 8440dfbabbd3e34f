//! EDL compilation
//!
//! Turns an accepted snapshot into a render plan: per-track and
//! per-clip linear gains precomputed, clip timeline intervals resolved
//! to half-open `[t0, t1)`, media references resolved, clips stably
//! sorted by timeline start.

use crate::error::{Error, Result};
use crate::media::MediaInfo;
use crate::store::Snapshot;
use tracing::{debug, warn};
use waveforge_common::fade::FadeShape;
use waveforge_common::model::{AudioRef, Clip, Fade};

/// A fade resolved for rendering.
#[derive(Debug, Clone, Copy)]
pub struct FadeSpec {
    /// Envelope length in samples
    pub length_samples: i64,
    /// Envelope shape
    pub shape: FadeShape,
}

/// A clip resolved for rendering.
#[derive(Debug, Clone)]
pub struct CompiledClip {
    /// The source clip (timing and gain fields)
    pub clip: Clip,
    /// The resolved media entry
    pub media: AudioRef,
    /// Probed media parameters
    pub media_info: MediaInfo,
    /// First timeline sample covered by the clip
    pub t0: i64,
    /// One-past-the-end timeline sample
    pub t1: i64,
    /// Precomputed linear clip gain
    pub gain_linear: f32,
    /// Entry envelope, if any
    pub fade_in: Option<FadeSpec>,
    /// Exit envelope, if any
    pub fade_out: Option<FadeSpec>,
}

/// A track resolved for rendering.
#[derive(Debug, Clone)]
pub struct CompiledTrack {
    /// Clips sorted stably by `t0` ascending
    pub clips: Vec<CompiledClip>,
    /// Precomputed linear track gain
    pub gain_linear: f32,
    /// Muted tracks are skipped by the renderer
    pub muted: bool,
}

/// A complete render plan.
#[derive(Debug, Clone)]
pub struct CompiledEdl {
    /// Timeline sample rate in Hz
    pub sample_rate: u32,
    /// All tracks, in document order
    pub tracks: Vec<CompiledTrack>,
}

/// Convert decibels to a linear gain factor.
pub fn db_to_linear(db: f32) -> f32 {
    10.0f32.powf(db / 20.0)
}

/// Compile an accepted snapshot into a render plan.
///
/// # Errors
/// `Error::CompilationFailed` when a clip references media absent from
/// the snapshot (cannot happen for snapshots produced by validation).
pub fn compile(snapshot: &Snapshot) -> Result<CompiledEdl> {
    let edl = &snapshot.edl;

    debug!(
        "Compiling EDL {} revision {}: {} tracks, {} clips",
        edl.id, snapshot.revision, snapshot.track_count, snapshot.clip_count
    );

    let mut tracks = Vec::with_capacity(edl.tracks.len());

    for track in &edl.tracks {
        let mut clips = Vec::with_capacity(track.clips.len());

        for clip in &track.clips {
            let media = edl.find_media(&clip.media_id).ok_or_else(|| {
                Error::CompilationFailed(format!(
                    "Media not found for clip {}: {}",
                    clip.id, clip.media_id
                ))
            })?;
            let media_info = snapshot.media_info.get(&clip.media_id).copied().ok_or_else(|| {
                Error::CompilationFailed(format!(
                    "Missing probe info for media: {}",
                    clip.media_id
                ))
            })?;

            clips.push(CompiledClip {
                t0: clip.start_in_timeline,
                t1: clip.start_in_timeline + clip.duration,
                gain_linear: db_to_linear(clip.gain_db),
                fade_in: clip.fade_in.as_ref().map(convert_fade),
                fade_out: clip.fade_out.as_ref().map(convert_fade),
                media: media.clone(),
                media_info,
                clip: clip.clone(),
            });
        }

        // Stable sort keeps document order among clips sharing a start
        clips.sort_by_key(|c| c.t0);

        tracks.push(CompiledTrack {
            clips,
            gain_linear: db_to_linear(track.gain_db),
            muted: track.muted,
        });
    }

    Ok(CompiledEdl {
        sample_rate: edl.sample_rate,
        tracks,
    })
}

/// Map a wire fade onto its render spec.
///
/// The typed model only carries known shapes today; the fallback arm
/// keeps renders alive if the wire enum grows before this match does.
fn convert_fade(fade: &Fade) -> FadeSpec {
    let shape = match fade.shape {
        FadeShape::Linear => FadeShape::Linear,
        FadeShape::EqualPower => FadeShape::EqualPower,
        #[allow(unreachable_patterns)]
        other => {
            warn!("Unknown fade shape {:?}, treating as linear", other);
            FadeShape::Linear
        }
    };
    FadeSpec {
        length_samples: fade.duration_samples,
        shape,
    }
}

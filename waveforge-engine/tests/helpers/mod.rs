//! Test helper modules for engine integration tests
//!
//! - AudioGenerator: deterministic WAV fixtures
//! - EDL builders: terse construction of valid documents

#![allow(dead_code)]

pub mod audio_generator;

use waveforge_common::fade::FadeShape;
use waveforge_common::model::{AudioRef, Clip, Edl, Fade, Track};

/// Build an EDL document with the given media and tracks.
pub fn edl(id: &str, sample_rate: u32, media: Vec<AudioRef>, tracks: Vec<Track>) -> Edl {
    Edl {
        id: id.to_string(),
        revision: String::new(),
        sample_rate,
        media,
        tracks,
    }
}

/// Build a media reference.
pub fn media_ref(id: &str, path: &std::path::Path) -> AudioRef {
    AudioRef {
        id: id.to_string(),
        path: path.display().to_string(),
        sample_rate: 0,
        channels: 0,
    }
}

/// Build a track at unity gain.
pub fn track(id: &str, clips: Vec<Clip>) -> Track {
    track_with_gain(id, 0.0, clips)
}

/// Build a track with an explicit gain.
pub fn track_with_gain(id: &str, gain_db: f32, clips: Vec<Clip>) -> Track {
    Track {
        id: id.to_string(),
        gain_db,
        muted: false,
        clips,
    }
}

/// Build a clip at unity gain with no fades.
pub fn clip(id: &str, media_id: &str, start_in_media: i64, duration: i64, start_in_timeline: i64) -> Clip {
    Clip {
        id: id.to_string(),
        media_id: media_id.to_string(),
        start_in_media,
        duration,
        start_in_timeline,
        gain_db: 0.0,
        fade_in: None,
        fade_out: None,
    }
}

/// Build a fade envelope.
pub fn fade(duration_samples: i64, shape: FadeShape) -> Fade {
    Fade {
        duration_samples,
        shape,
    }
}

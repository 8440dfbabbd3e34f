//! Media probe using symphonia
//!
//! Opens a media file and reports its sample rate, channel count, and
//! length in frames. Used by the validator (media checks) and the
//! `LoadFile` helper.

use crate::error::{Error, Result};
use std::path::Path;
use symphonia::core::codecs::{CodecParameters, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// Format parameters of a probed media file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaInfo {
    /// Native sample rate in Hz
    pub sample_rate: u32,

    /// Native channel count (1 = mono, 2 = stereo, ...)
    pub channels: usize,

    /// Total length in frames
    pub length_frames: u64,
}

impl MediaInfo {
    /// File duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.length_frames as f64 / self.sample_rate as f64
    }
}

/// Probe a media file for its format parameters.
///
/// Formats that do not declare a frame count up front are decoded once
/// to count frames exactly.
///
/// # Errors
/// - File cannot be opened
/// - Format is unsupported or carries no audio track
pub fn probe(path: &Path) -> Result<MediaInfo> {
    let file = std::fs::File::open(path)
        .map_err(|e| Error::Decode(format!("Failed to open file {}: {}", path.display(), e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to probe format: {}", e)))?;

    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| Error::Decode("No audio track found".to_string()))?;

    let track_id = track.id;
    let params = track.codec_params.clone();

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| Error::Decode("Sample rate not found".to_string()))?;

    let channels = params
        .channels
        .map(|c| c.count())
        .ok_or_else(|| Error::Decode("Channel count not found".to_string()))?;

    let length_frames = match params.n_frames {
        Some(n) => n,
        None => {
            debug!(
                "No declared frame count for {}, counting by decode",
                path.display()
            );
            count_frames(format.as_mut(), track_id, &params)?
        }
    };

    debug!(
        "Probed {}: sample_rate={}, channels={}, frames={}",
        path.display(),
        sample_rate,
        channels,
        length_frames
    );

    Ok(MediaInfo {
        sample_rate,
        channels,
        length_frames,
    })
}

/// Count frames by decoding the whole stream.
fn count_frames(
    format: &mut dyn FormatReader,
    track_id: u32,
    params: &CodecParameters,
) -> Result<u64> {
    let mut decoder = symphonia::default::get_codecs()
        .make(params, &DecoderOptions::default())
        .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

    let mut frames: u64 = 0;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                warn!("Error reading packet while counting frames: {}", e);
                break;
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => frames += decoded.frames() as u64,
            Err(e) => {
                warn!("Decode error while counting frames: {}", e);
                continue;
            }
        }
    }

    Ok(frames)
}

//! Random-access media readers and the per-render reader cache
//!
//! A `MediaReader` decodes its file once into planar f32 samples and
//! then serves explicit `(destination, offset, source frame, count)`
//! reads. Readers carry no playhead: every read names its source
//! position, which keeps the renderer deterministic and re-entrant.
//!
//! Channel policy: mono media is duplicated into two planes at decode
//! time, so a mono clip contributes equally to the first two output
//! channels. Media with two or more channels keeps its native planes.

use crate::error::{Error, Result};
use crate::render::block::BlockBuffer;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, warn};

/// A fully decoded media file serving random-access frame reads.
pub struct MediaReader {
    path: PathBuf,
    sample_rate: u32,
    /// Planar sample data; mono sources hold two identical planes
    planes: Vec<Vec<f32>>,
    length_frames: u64,
}

impl MediaReader {
    /// Open and fully decode a media file.
    ///
    /// # Errors
    /// - File cannot be opened or probed
    /// - No decodable audio track
    pub fn open(path: &Path) -> Result<Self> {
        debug!("Opening media reader: {}", path.display());

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

        let mut decoder = symphonia::default::get_codecs()
            .make(&params, &DecoderOptions::default())
            .map_err(|e| Error::Decode(format!("Failed to create decoder: {}", e)))?;

        let mut planes: Vec<Vec<f32>> = vec![Vec::new(); channels];
        let mut sample_buf: Option<SampleBuffer<f32>> = None;

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(symphonia::core::errors::Error::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(e) => {
                    warn!("Error reading packet: {}", e);
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    if sample_buf.is_none() {
                        let spec = *decoded.spec();
                        sample_buf = Some(SampleBuffer::<f32>::new(decoded.capacity() as u64, spec));
                    }
                    if let Some(buf) = sample_buf.as_mut() {
                        buf.copy_interleaved_ref(decoded);
                        for frame in buf.samples().chunks_exact(channels) {
                            for (ch, &sample) in frame.iter().enumerate() {
                                planes[ch].push(sample);
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!("Decode error: {}", e);
                    continue;
                }
            }
        }

        // Mono contributes to the first two output channels
        if planes.len() == 1 {
            planes.push(planes[0].clone());
        }

        let length_frames = planes.first().map(|p| p.len() as u64).unwrap_or(0);

        debug!(
            "Media reader ready: {} ({} Hz, {} channels, {} frames)",
            path.display(),
            sample_rate,
            planes.len(),
            length_frames
        );

        Ok(Self {
            path: path.to_path_buf(),
            sample_rate,
            planes,
            length_frames,
        })
    }

    /// Path this reader was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Native sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Channel count served by this reader (mono reports 2).
    pub fn channels(&self) -> usize {
        self.planes.len()
    }

    /// Total length in frames.
    pub fn length_frames(&self) -> u64 {
        self.length_frames
    }

    /// Copy up to `frames` frames starting at `source_frame` into
    /// `dest` at `dest_offset`.
    ///
    /// The reader's channels land in the first `min(reader, dest)`
    /// destination channels; remaining destination channels are left
    /// untouched. Reads past the end of the media are truncated.
    ///
    /// # Returns
    /// Number of frames actually copied (0 when `source_frame` is out
    /// of bounds).
    pub fn read(
        &self,
        dest: &mut BlockBuffer,
        dest_offset: usize,
        source_frame: i64,
        frames: usize,
    ) -> usize {
        if source_frame < 0 || source_frame as u64 >= self.length_frames {
            return 0;
        }
        if dest_offset >= dest.frames() {
            return 0;
        }

        let start = source_frame as usize;
        let available = self.length_frames as usize - start;
        let n = frames.min(available).min(dest.frames() - dest_offset);
        let channels = self.planes.len().min(dest.channels());

        for ch in 0..channels {
            let src = &self.planes[ch][start..start + n];
            dest.plane_mut(ch)[dest_offset..dest_offset + n].copy_from_slice(src);
        }

        n
    }
}

/// Per-render cache of media readers keyed by path.
///
/// Each referenced file is opened (and decoded) at most once per
/// render call; the cache is dropped when the render ends.
#[derive(Default)]
pub struct ReaderCache {
    readers: HashMap<PathBuf, MediaReader>,
}

impl ReaderCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the reader for `path`, opening it on first access.
    ///
    /// # Errors
    /// `Error::ReaderUnavailable` when the file cannot be opened or
    /// decoded.
    pub fn open(&mut self, path: &Path) -> Result<&MediaReader> {
        match self.readers.entry(path.to_path_buf()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let reader = MediaReader::open(path).map_err(|e| Error::ReaderUnavailable {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(entry.insert(reader))
            }
        }
    }

    /// Get an already opened reader, if any.
    pub fn get(&self, path: &Path) -> Option<&MediaReader> {
        self.readers.get(path)
    }

    /// Largest channel count over all opened readers (0 when empty).
    pub fn max_channels(&self) -> usize {
        self.readers.values().map(|r| r.channels()).max().unwrap_or(0)
    }

    /// Number of opened readers.
    pub fn len(&self) -> usize {
        self.readers.len()
    }

    /// Whether the cache holds no readers.
    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }
}

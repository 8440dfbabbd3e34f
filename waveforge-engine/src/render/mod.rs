//! Windowed EDL rendering
//!
//! Streams a requested time range through a block mixer. For each
//! block, every unmuted track's intersecting clips are read from their
//! media, shaped by clip gain and fade envelopes and track gain, and
//! summed into the output. The mix is purely additive (no clipping,
//! no normalization) and bit-exact for identical inputs.

pub mod block;
pub mod wav;

use crate::edl::compile::{CompiledClip, CompiledEdl, FadeSpec};
use crate::error::{Error, Result};
use crate::media::ReaderCache;
use block::BlockBuffer;
use tracing::{debug, warn};
use waveforge_common::model::TimeRange;

/// Frames processed per mixer block
pub const BLOCK_FRAMES: usize = 4096;

/// Minimum output channel count
const MIN_CHANNELS: usize = 2;

/// Progress callback: receives the fraction done in (0, 1], returns
/// `false` to cancel the render at the next block boundary.
pub type ProgressFn<'a> = dyn FnMut(f64) -> bool + 'a;

/// Block renderer for compiled EDLs.
///
/// Owns the reader cache for one render call; drop the renderer to
/// release all media readers.
pub struct Renderer {
    cache: ReaderCache,
    block_frames: usize,
}

impl Renderer {
    /// Create a renderer with the standard block size.
    pub fn new() -> Self {
        Self::with_block_frames(BLOCK_FRAMES)
    }

    /// Create a renderer with a custom block size (tests exercise
    /// block-boundary math with small blocks).
    pub fn with_block_frames(block_frames: usize) -> Self {
        Self {
            cache: ReaderCache::new(),
            block_frames: block_frames.max(1),
        }
    }

    /// Render `range` of the compiled timeline into a planar buffer.
    ///
    /// The output has exactly `range.duration_samples` frames and
    /// `max(2, widest opened reader)` channels. `progress` is invoked
    /// after every block; returning `false` cancels the render.
    ///
    /// # Errors
    /// - `InvalidRange` for non-positive durations
    /// - `Cancelled` when the progress callback declines to continue
    pub fn render_to_buffer(
        &mut self,
        compiled: &CompiledEdl,
        range: &TimeRange,
        progress: &mut ProgressFn<'_>,
    ) -> Result<BlockBuffer> {
        let total = range.duration_samples;
        if total <= 0 {
            return Err(Error::InvalidRange);
        }

        debug!(
            "Starting render: start={} duration={} samples",
            range.start_samples, range.duration_samples
        );

        // Open every referenced reader up front; a clip whose media
        // cannot be opened contributes silence instead of aborting.
        for track in &compiled.tracks {
            for clip in &track.clips {
                if let Err(e) = self.cache.open(clip.media.path.as_ref()) {
                    warn!("{}; clip {} will be silent", e, clip.clip.id);
                }
            }
        }

        let channels = MIN_CHANNELS.max(self.cache.max_channels());
        let range_start = range.start_samples;

        let mut output = BlockBuffer::new(channels, total as usize);
        let mut mix = BlockBuffer::new(channels, self.block_frames);
        let mut clip_buf = BlockBuffer::new(channels, self.block_frames);

        let mut rendered: i64 = 0;
        while rendered < total {
            let block_start = range_start + rendered;
            let block_frames = (self.block_frames as i64).min(total - rendered);
            let block_end = block_start + block_frames;

            mix.reset(channels, block_frames as usize);

            for track in &compiled.tracks {
                if track.muted {
                    continue;
                }
                for clip in &track.clips {
                    if clip.t1 <= block_start || clip.t0 >= block_end {
                        continue;
                    }
                    clip_buf.reset(channels, block_frames as usize);
                    mix_clip(&self.cache, clip, block_start, block_end, &mut clip_buf);
                    if track.gain_linear != 1.0 {
                        clip_buf.scale(track.gain_linear);
                    }
                    mix.add_from(&clip_buf);
                }
            }

            output.copy_from(&mix, rendered as usize);
            rendered += block_frames;

            if !progress(rendered as f64 / total as f64) {
                debug!("Render cancelled at {}/{} samples", rendered, total);
                return Err(Error::Cancelled);
            }
        }

        debug!("Completed render: {} samples", rendered);
        Ok(output)
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// Mix one clip's contribution to the block `[block_start, block_end)`
/// into `buf`.
///
/// Multiplicative order: source samples → clip gain → fade-in →
/// fade-out. Track gain is applied by the caller.
fn mix_clip(
    cache: &ReaderCache,
    clip: &CompiledClip,
    block_start: i64,
    block_end: i64,
    buf: &mut BlockBuffer,
) {
    let clip_start = clip.t0.max(block_start);
    let clip_end = clip.t1.min(block_end);
    if clip_start >= clip_end {
        return;
    }

    // Media that failed to open earlier stays silent
    let Some(reader) = cache.get(clip.media.path.as_ref()) else {
        return;
    };

    let source_frame = clip.clip.start_in_media + (clip_start - clip.t0);
    let frames = (clip_end - clip_start) as usize;
    let offset = (clip_start - block_start) as usize;

    let read = reader.read(buf, offset, source_frame, frames);
    if read == 0 {
        return;
    }
    if read < frames {
        debug!(
            "Short read for clip {}: wanted {} frames, got {}",
            clip.clip.id, frames, read
        );
    }

    if clip.gain_linear != 1.0 {
        buf.scale_range(offset, read, clip.gain_linear);
    }

    if let Some(fade) = &clip.fade_in {
        apply_fade(buf, fade, true, clip.t0, clip.t1, block_start, block_end);
    }
    if let Some(fade) = &clip.fade_out {
        apply_fade(buf, fade, false, clip.t0, clip.t1, block_start, block_end);
    }
}

/// Apply one fade envelope over its intersection with the current
/// block.
///
/// Fade-in window: `[t0, t0 + len)`. Fade-out window: `[t1 - len, t1)`.
/// Fades longer than the clip overlap; both envelopes multiply.
fn apply_fade(
    buf: &mut BlockBuffer,
    fade: &FadeSpec,
    is_fade_in: bool,
    t0: i64,
    t1: i64,
    block_start: i64,
    block_end: i64,
) {
    let len = fade.length_samples;
    if len <= 0 {
        return;
    }

    let (fade_start, fade_end) = if is_fade_in {
        (t0, t0 + len)
    } else {
        (t1 - len, t1)
    };

    let start = fade_start.max(block_start);
    let end = fade_end.min(block_end);
    if start >= end {
        return;
    }

    let offset = (start - block_start) as usize;
    let frames = (end - start) as usize;

    for ch in 0..buf.channels() {
        let plane = buf.plane_mut(ch);
        for i in 0..frames {
            let timeline_pos = start + i as i64;
            let position = (timeline_pos - fade_start) as f32 / len as f32;
            let gain = if is_fade_in {
                fade.shape.fade_in_gain(position)
            } else {
                fade.shape.fade_out_gain(position)
            };
            plane[offset + i] *= gain;
        }
    }
}

//! Engine service facade
//!
//! Orchestrates the EDL store, compiler, renderer, and event bus for
//! the control-surface operations: `UpdateEdl`, `RenderEdlWindow`,
//! `Subscribe`, plus the one-shot `LoadFile`/`RenderFile` helpers.
//!
//! The facade is transport-independent: render operations stream
//! events through a caller-supplied channel sender, and cancellation
//! is signalled by the receiver going away. Render methods block and
//! are expected to run on a blocking thread.

use crate::edl::compile::compile;
use crate::error::{Error, Result};
use crate::media::{self, MediaInfo, MediaReader};
use crate::render::wav::{self, BitDepth};
use crate::render::{Renderer, BLOCK_FRAMES};
use crate::store::{EdlStore, Snapshot};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use waveforge_common::events::{EngineEvent, EventBus};
use waveforge_common::model::{Edl, TimeRange};

/// Per-subscriber event buffer depth
const EVENT_BUS_CAPACITY: usize = 256;

/// Parameters for an EDL window render.
#[derive(Debug, Clone)]
pub struct RenderWindowParams {
    /// Id the active snapshot must carry
    pub edl_id: String,
    /// Half-open window to render
    pub range: TimeRange,
    /// Output WAV path
    pub out_path: PathBuf,
    /// Requested bit depth (16, 24, or 32; others degrade to 32)
    pub bit_depth: u32,
}

/// Parameters for a one-shot file render.
#[derive(Debug, Clone, Default)]
pub struct RenderFileParams {
    /// Source file; falls back to the currently loaded file
    pub path: Option<PathBuf>,
    /// Window start in seconds (default 0)
    pub start_sec: Option<f64>,
    /// Window length in seconds (default: to end of file)
    pub duration_sec: Option<f64>,
    /// Output WAV path
    pub out_path: PathBuf,
}

/// Probe report for a loaded file.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub path: String,
    pub sample_rate: u32,
    pub channels: usize,
    pub duration_seconds: f64,
    pub size_bytes: u64,
}

struct LoadedFile {
    path: PathBuf,
    info: MediaInfo,
}

/// The engine service: single-slot EDL store, event bus, and the
/// render operations tying them together.
pub struct EngineService {
    store: EdlStore,
    events: EventBus,
    loaded: Mutex<Option<LoadedFile>>,
    started: Instant,
}

impl EngineService {
    /// Create a fresh service with no EDL and no loaded file.
    pub fn new() -> Self {
        Self {
            store: EdlStore::new(),
            events: EventBus::new(EVENT_BUS_CAPACITY),
            loaded: Mutex::new(None),
            started: Instant::now(),
        }
    }

    /// The broadcast bus carrying engine lifecycle events.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Milliseconds since the service started (heartbeat clock).
    pub fn uptime_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Whether an EDL snapshot is installed.
    pub fn has_edl(&self) -> bool {
        self.store.has_edl()
    }

    /// The active snapshot, if any.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.store.get()
    }

    /// Validate and install a new EDL.
    ///
    /// Broadcasts `EdlApplied` on success and `EdlError` on failure.
    /// The `replace` flag is accepted for wire compatibility but has
    /// no effect with the single-slot store.
    pub fn update_edl(&self, edl: Edl, replace: bool) -> Result<Snapshot> {
        if replace {
            debug!("UpdateEdl: replace flag set (single-slot store, no merge semantics)");
        }

        let edl_id = edl.id.clone();
        match self.store.replace(edl) {
            Ok(snapshot) => {
                self.events.emit_lossy(EngineEvent::EdlApplied {
                    edl_id: snapshot.edl.id.clone(),
                    revision: snapshot.revision.clone(),
                    track_count: snapshot.track_count,
                    clip_count: snapshot.clip_count,
                });
                Ok(snapshot)
            }
            Err(e) => {
                warn!("UpdateEdl rejected: {}", e);
                self.events.emit_lossy(EngineEvent::EdlError {
                    edl_id,
                    reason: e.to_string(),
                });
                Err(Error::Validation(e))
            }
        }
    }

    /// Render a window of the active EDL to a WAV file.
    ///
    /// Streams zero or more `Progress` events to `sink` followed by
    /// exactly one terminal `Complete` or `EdlError`; the same events
    /// are mirrored on the bus. Dropping the receiver cancels the
    /// render at the next block boundary (no terminal event is sent).
    ///
    /// Blocking; run via `tokio::task::spawn_blocking`.
    pub fn render_edl_window(
        &self,
        params: &RenderWindowParams,
        sink: &mpsc::Sender<EngineEvent>,
    ) -> Result<wav::WavSummary> {
        let fail = |reason: String| {
            let event = EngineEvent::EdlError {
                edl_id: params.edl_id.clone(),
                reason,
            };
            self.events.emit_lossy(event.clone());
            let _ = sink.blocking_send(event);
        };

        let snapshot = match self.store.get() {
            Some(s) => s,
            None => {
                fail("No EDL loaded".to_string());
                return Err(Error::NoEdlLoaded);
            }
        };

        if snapshot.edl.id != params.edl_id {
            let err = Error::EdlIdMismatch {
                active: snapshot.edl.id.clone(),
                requested: params.edl_id.clone(),
            };
            fail(err.to_string());
            return Err(err);
        }

        if params.range.duration_samples <= 0 {
            fail(Error::InvalidRange.to_string());
            return Err(Error::InvalidRange);
        }

        let depth = BitDepth::from_bits(params.bit_depth).unwrap_or_else(|| {
            warn!(
                "Unsupported bit depth {}, falling back to 32-bit float",
                params.bit_depth
            );
            BitDepth::Float32
        });

        let compiled = match compile(&snapshot) {
            Ok(c) => c,
            Err(e) => {
                fail(e.to_string());
                return Err(e);
            }
        };

        info!(
            "RenderEdlWindow: edl={} start={} duration={} out={} depth={}-bit",
            params.edl_id,
            params.range.start_samples,
            params.range.duration_samples,
            params.out_path.display(),
            depth.bits()
        );

        let render_started = Instant::now();
        let mut renderer = Renderer::new();
        let rendered = renderer.render_to_buffer(&compiled, &params.range, &mut |fraction| {
            let elapsed = render_started.elapsed().as_secs_f64();
            let eta_seconds = if fraction > 0.0 && fraction < 1.0 {
                Some(elapsed * (1.0 - fraction) / fraction)
            } else {
                None
            };
            let event = EngineEvent::Progress { fraction, eta_seconds };
            self.events.emit_lossy(event.clone());
            sink.blocking_send(event).is_ok()
        });

        let buffer = match rendered {
            Ok(buffer) => buffer,
            Err(Error::Cancelled) => {
                info!("RenderEdlWindow cancelled: edl={}", params.edl_id);
                return Err(Error::Cancelled);
            }
            Err(e) => {
                fail(e.to_string());
                return Err(e);
            }
        };

        let summary = match wav::write_wav(&params.out_path, compiled.sample_rate, &buffer, depth)
        {
            Ok(summary) => summary,
            Err(e) => {
                fail(e.to_string());
                return Err(e);
            }
        };

        let duration_sec =
            params.range.duration_samples as f64 / compiled.sample_rate as f64;
        let complete = EngineEvent::Complete {
            out_path: params.out_path.display().to_string(),
            duration_sec,
            sha256: summary.sha256.clone(),
        };
        self.events.emit_lossy(complete.clone());
        let _ = sink.blocking_send(complete);

        info!(
            "RenderEdlWindow complete: {} ({:.3}s audio, sha256 {}…)",
            params.out_path.display(),
            duration_sec,
            &summary.sha256[..16]
        );

        Ok(summary)
    }

    /// Probe a media file and remember it as the loaded file.
    pub fn load_file(&self, path: &Path) -> Result<FileInfo> {
        let info = media::probe(path)?;
        let size_bytes = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);

        let file_info = FileInfo {
            path: path.display().to_string(),
            sample_rate: info.sample_rate,
            channels: info.channels,
            duration_seconds: info.duration_seconds(),
            size_bytes,
        };

        info!(
            "LoadFile: {} ({:.3}s, {} Hz, {} channels)",
            file_info.path, file_info.duration_seconds, file_info.sample_rate, file_info.channels
        );

        let mut loaded = self.loaded.lock().unwrap_or_else(|e| e.into_inner());
        *loaded = Some(LoadedFile {
            path: path.to_path_buf(),
            info,
        });

        Ok(file_info)
    }

    /// Render a window of a single file's raw samples to a float-32
    /// WAV (no EDL involved).
    ///
    /// Uses the currently loaded file, or lazily loads `params.path`.
    /// Failures are streamed to `sink` as `Error` events with stable
    /// machine-readable codes.
    ///
    /// Blocking; run via `tokio::task::spawn_blocking`.
    pub fn render_file(
        &self,
        params: &RenderFileParams,
        sink: &mpsc::Sender<EngineEvent>,
    ) -> Result<wav::WavSummary> {
        let fail = |code: &str, message: String| {
            let event = EngineEvent::Error {
                code: code.to_string(),
                message,
            };
            self.events.emit_lossy(event.clone());
            let _ = sink.blocking_send(event);
        };

        // Resolve the source: explicit path wins, else the loaded file
        let (path, info) = {
            let loaded = self.loaded.lock().unwrap_or_else(|e| e.into_inner());
            match (&*loaded, &params.path) {
                (_, Some(p)) => (p.clone(), None),
                (Some(l), None) => (l.path.clone(), Some(l.info)),
                (None, None) => {
                    fail(
                        "NO_FILE_LOADED",
                        "No audio file is currently loaded. Call LoadFile first.".to_string(),
                    );
                    return Err(Error::NoFileLoaded);
                }
            }
        };

        let info = match info {
            Some(info) => info,
            None => match media::probe(&path) {
                Ok(probed) => {
                    let mut loaded = self.loaded.lock().unwrap_or_else(|e| e.into_inner());
                    *loaded = Some(LoadedFile {
                        path: path.clone(),
                        info: probed,
                    });
                    probed
                }
                Err(e) => {
                    fail("LAZY_LOAD_FAILED", e.to_string());
                    return Err(e);
                }
            },
        };

        let sample_rate = info.sample_rate;
        let file_len = info.length_frames as i64;
        let start =
            waveforge_common::time::seconds_to_samples(params.start_sec.unwrap_or(0.0), sample_rate);
        let end = match params.duration_sec {
            Some(dur) => {
                (start + waveforge_common::time::seconds_to_samples(dur, sample_rate)).min(file_len)
            }
            None => file_len,
        };
        let frames = end - start;

        if start < 0 || frames <= 0 {
            fail("INVALID_RANGE", "Invalid time range specified".to_string());
            return Err(Error::InvalidRange);
        }

        info!(
            "RenderFile: {} [{}, {}) -> {}",
            path.display(),
            start,
            end,
            params.out_path.display()
        );

        let reader = match MediaReader::open(&path) {
            Ok(r) => r,
            Err(e) => {
                fail("RENDER_ERROR", e.to_string());
                return Err(e);
            }
        };

        let mut buffer =
            crate::render::block::BlockBuffer::new(reader.channels(), frames as usize);
        let mut done: i64 = 0;
        while done < frames {
            let block = (BLOCK_FRAMES as i64).min(frames - done);
            reader.read(&mut buffer, done as usize, start + done, block as usize);
            done += block;

            let event = EngineEvent::Progress {
                fraction: done as f64 / frames as f64,
                eta_seconds: None,
            };
            self.events.emit_lossy(event.clone());
            if sink.blocking_send(event).is_err() {
                return Err(Error::Cancelled);
            }
        }

        let summary =
            match wav::write_wav(&params.out_path, sample_rate, &buffer, BitDepth::Float32) {
                Ok(summary) => summary,
                Err(e) => {
                    fail("FILE_WRITE_ERROR", e.to_string());
                    return Err(e);
                }
            };

        let complete = EngineEvent::Complete {
            out_path: params.out_path.display().to_string(),
            duration_sec: frames as f64 / sample_rate as f64,
            sha256: summary.sha256.clone(),
        };
        self.events.emit_lossy(complete.clone());
        let _ = sink.blocking_send(complete);

        Ok(summary)
    }
}

impl Default for EngineService {
    fn default() -> Self {
        Self::new()
    }
}

//! WAV emission and output hashing
//!
//! Writes canonical RIFF/WAVE little-endian files via hound. Bit depth
//! selects the encoding: 16/24-bit signed integer PCM with
//! round-and-clip quantization, or raw 32-bit IEEE float.
//!
//! Alongside the file, the encoder computes a SHA-256 of the finished
//! bytes (reported in `Complete` events) and a fast 32-bit rolling
//! checksum over the quantized PCM stream (the golden-fixture
//! fingerprint).

use crate::error::{Error, Result};
use crate::render::block::BlockBuffer;
use hound::{SampleFormat, WavSpec, WavWriter};
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Output encodings selectable per render
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    /// 16-bit signed integer PCM
    Int16,
    /// 24-bit signed integer PCM, packed little-endian
    Int24,
    /// 32-bit IEEE float
    Float32,
}

impl BitDepth {
    /// Map a requested bit count onto an encoding.
    pub fn from_bits(bits: u32) -> Option<Self> {
        match bits {
            16 => Some(BitDepth::Int16),
            24 => Some(BitDepth::Int24),
            32 => Some(BitDepth::Float32),
            _ => None,
        }
    }

    /// Bits per sample on the wire.
    pub fn bits(&self) -> u16 {
        match self {
            BitDepth::Int16 => 16,
            BitDepth::Int24 => 24,
            BitDepth::Float32 => 32,
        }
    }
}

/// Result of a WAV write.
#[derive(Debug, Clone)]
pub struct WavSummary {
    /// SHA-256 of the fully flushed file (64 lowercase hex chars)
    pub sha256: String,
    /// Rolling checksum of the PCM data stream (8 lowercase hex chars)
    pub pcm_checksum: String,
    /// File size in bytes
    pub size_bytes: u64,
}

/// Rolling 32-bit checksum over a PCM byte stream.
///
/// Cheap, deterministic fingerprint for golden-file comparisons; not a
/// cryptographic hash.
#[derive(Debug, Default, Clone, Copy)]
pub struct PcmChecksum(u32);

impl PcmChecksum {
    /// Fresh checksum state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold bytes into the checksum.
    pub fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 8) ^ b as u32;
            self.0 ^= self.0 >> 16;
        }
    }

    /// Final value as 8 lowercase hex chars.
    pub fn hex(&self) -> String {
        format!("{:08x}", self.0)
    }
}

/// Quantize a float sample to 16-bit with round-and-clip.
pub fn quantize_i16(sample: f32) -> i16 {
    let scaled = (sample * 32767.0).round();
    scaled.clamp(-32768.0, 32767.0) as i16
}

/// Quantize a float sample to 24-bit with round-and-clip.
pub fn quantize_i24(sample: f32) -> i32 {
    let scaled = (sample * 8_388_607.0).round();
    scaled.clamp(-8_388_608.0, 8_388_607.0) as i32
}

/// Write a planar buffer to a WAV file.
///
/// The parent directory is created if missing and any existing file at
/// the path is deleted first. Samples are written interleaved,
/// frame-major. The writer is finalized (header sizes patched, stream
/// flushed) before the file is hashed, so the reported SHA-256 always
/// reflects the bytes on disk.
pub fn write_wav(
    path: &Path,
    sample_rate: u32,
    buffer: &BlockBuffer,
    depth: BitDepth,
) -> Result<WavSummary> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| Error::WriteFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        }
    }

    match std::fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(Error::WriteFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            })
        }
    }

    let spec = WavSpec {
        channels: buffer.channels() as u16,
        sample_rate,
        bits_per_sample: depth.bits(),
        sample_format: match depth {
            BitDepth::Float32 => SampleFormat::Float,
            _ => SampleFormat::Int,
        },
    };

    let write_err = |e: hound::Error| Error::WriteFailed {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut writer = WavWriter::create(path, spec).map_err(write_err)?;
    let mut checksum = PcmChecksum::new();

    for frame in 0..buffer.frames() {
        for ch in 0..buffer.channels() {
            let sample = buffer.sample(ch, frame);
            match depth {
                BitDepth::Int16 => {
                    let q = quantize_i16(sample);
                    checksum.update(&q.to_le_bytes());
                    writer.write_sample(q).map_err(write_err)?;
                }
                BitDepth::Int24 => {
                    let q = quantize_i24(sample);
                    checksum.update(&q.to_le_bytes()[..3]);
                    writer.write_sample(q).map_err(write_err)?;
                }
                BitDepth::Float32 => {
                    checksum.update(&sample.to_le_bytes());
                    writer.write_sample(sample).map_err(write_err)?;
                }
            }
        }
    }

    writer.finalize().map_err(write_err)?;

    let sha256 = file_sha256(path)?;
    let size_bytes = std::fs::metadata(path)?.len();

    debug!(
        "Wrote WAV: {} ({} frames, {} ch, {}-bit, {} bytes)",
        path.display(),
        buffer.frames(),
        buffer.channels(),
        depth.bits(),
        size_bytes
    );

    Ok(WavSummary {
        sha256,
        pcm_checksum: checksum.hex(),
        size_bytes,
    })
}

/// SHA-256 of a file's bytes as lowercase hex.
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut chunk = [0u8; 8192];
    loop {
        let n = file.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        hasher.update(&chunk[..n]);
    }
    let digest = hasher.finalize();
    Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_depth_from_bits() {
        assert_eq!(BitDepth::from_bits(16), Some(BitDepth::Int16));
        assert_eq!(BitDepth::from_bits(24), Some(BitDepth::Int24));
        assert_eq!(BitDepth::from_bits(32), Some(BitDepth::Float32));
        assert_eq!(BitDepth::from_bits(8), None);
        assert_eq!(BitDepth::from_bits(0), None);
    }

    #[test]
    fn test_quantize_i16() {
        assert_eq!(quantize_i16(0.0), 0);
        assert_eq!(quantize_i16(0.25), 8192); // round(8191.75)
        assert_eq!(quantize_i16(1.0), 32767);
        assert_eq!(quantize_i16(-1.0), -32767);
        // Out-of-range input clips instead of wrapping
        assert_eq!(quantize_i16(2.0), 32767);
        assert_eq!(quantize_i16(-2.0), -32768);
    }

    #[test]
    fn test_quantize_i24() {
        assert_eq!(quantize_i24(0.0), 0);
        assert_eq!(quantize_i24(1.0), 8_388_607);
        assert_eq!(quantize_i24(-1.0), -8_388_607);
        assert_eq!(quantize_i24(2.0), 8_388_607);
        assert_eq!(quantize_i24(-2.0), -8_388_608);
    }

    #[test]
    fn test_pcm_checksum_deterministic() {
        let mut a = PcmChecksum::new();
        a.update(&[1, 2, 3, 4]);
        // Golden value for the byte sequence 01 02 03 04
        assert_eq!(a.hex(), "01020306");

        let mut b = PcmChecksum::new();
        b.update(&[1, 2]);
        b.update(&[3, 4]);
        assert_eq!(a.hex(), b.hex());

        let mut c = PcmChecksum::new();
        c.update(&[4, 3, 2, 1]);
        assert_ne!(a.hex(), c.hex());
    }
}

//! Audio test file generation utilities
//!
//! Generates deterministic WAV files with known characteristics for
//! render-pipeline testing: silence, constant (DC) signals, and sine
//! waves. Fixtures are written as 32-bit float so decoded samples are
//! bit-exact against the generator's values.

use hound::{SampleFormat, WavSpec, WavWriter};
use std::f32::consts::PI;
use std::path::Path;

fn float_spec(sample_rate: u32, channels: u16) -> WavSpec {
    WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    }
}

/// Generate a mono WAV holding a constant sample value.
///
/// A constant source makes gain and fade effects directly readable in
/// the output: every rendered sample is the applied envelope.
pub fn generate_constant_wav<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    frames: u64,
    value: f32,
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, float_spec(sample_rate, 1))?;
    for _ in 0..frames {
        writer.write_sample(value)?;
    }
    writer.finalize()
}

/// Generate a silent mono WAV.
pub fn generate_silent_wav<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    frames: u64,
) -> Result<(), hound::Error> {
    generate_constant_wav(path, sample_rate, frames, 0.0)
}

/// Generate a mono sine-wave WAV.
pub fn generate_sine_wav<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    frames: u64,
    frequency_hz: f32,
    amplitude: f32,
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, float_spec(sample_rate, 1))?;
    for frame in 0..frames {
        let t = frame as f32 / sample_rate as f32;
        writer.write_sample(amplitude * (2.0 * PI * frequency_hz * t).sin())?;
    }
    writer.finalize()
}

/// Generate a stereo WAV with distinct constant values per channel.
pub fn generate_stereo_wav<P: AsRef<Path>>(
    path: P,
    sample_rate: u32,
    frames: u64,
    left: f32,
    right: f32,
) -> Result<(), hound::Error> {
    let mut writer = WavWriter::create(path, float_spec(sample_rate, 2))?;
    for _ in 0..frames {
        writer.write_sample(left)?;
        writer.write_sample(right)?;
    }
    writer.finalize()
}

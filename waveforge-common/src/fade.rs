//! Fade shape implementations for clip edge envelopes
//!
//! Provides the two fade shapes carried on the EDL wire format with
//! precise formulas for sample-accurate envelope application.

use serde::de::{Deserialize, Deserializer, Error as DeError};
use serde::ser::{Serialize, Serializer};

/// Fade shapes for clip entry/exit envelopes
///
/// - Linear: constant rate of change (precise, predictable)
/// - EqualPower: constant perceived loudness through a crossfade
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeShape {
    /// Linear: v(p) = p
    Linear,

    /// Equal-Power: v(p) = sqrt(p)
    ///
    /// Two opposing equal-power fades sum to at most sqrt(2), keeping
    /// perceived loudness steady through the overlap.
    EqualPower,
}

impl FadeShape {
    /// Calculate the fade-in multiplier at a normalized position.
    ///
    /// # Arguments
    /// * `position` - Normalized position through the fade (0.0 to 1.0);
    ///   values outside the range are clamped
    ///
    /// # Returns
    /// Volume multiplier (0.0 = silence, 1.0 = full volume)
    pub fn fade_in_gain(&self, position: f32) -> f32 {
        let t = position.clamp(0.0, 1.0);
        match self {
            FadeShape::Linear => t,
            FadeShape::EqualPower => t.sqrt(),
        }
    }

    /// Calculate the fade-out multiplier at a normalized position.
    ///
    /// The position runs 0.0 (start of fade-out, full volume) to 1.0
    /// (end of fade-out, silence); the shape is evaluated on the
    /// remaining fraction.
    pub fn fade_out_gain(&self, position: f32) -> f32 {
        self.fade_in_gain(1.0 - position)
    }

    /// Parse a shape from its wire string, case-insensitively.
    ///
    /// Accepted spellings: `linear`; `equal_power`, `equal-power`,
    /// `equalpower`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Some(FadeShape::Linear),
            "equal_power" | "equal-power" | "equalpower" => Some(FadeShape::EqualPower),
            _ => None,
        }
    }

    /// Canonical wire name (used by the JSON exchange format).
    pub fn wire_name(&self) -> &'static str {
        match self {
            FadeShape::Linear => "LINEAR",
            FadeShape::EqualPower => "EQUAL_POWER",
        }
    }

    /// All shape variants.
    pub fn all_variants() -> &'static [FadeShape] {
        &[FadeShape::Linear, FadeShape::EqualPower]
    }
}

impl Default for FadeShape {
    fn default() -> Self {
        FadeShape::Linear
    }
}

impl std::fmt::Display for FadeShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

impl Serialize for FadeShape {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wire_name())
    }
}

impl<'de> Deserialize<'de> for FadeShape {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        FadeShape::parse(&s)
            .ok_or_else(|| DeError::unknown_variant(&s, &["LINEAR", "EQUAL_POWER"]))
    }
}

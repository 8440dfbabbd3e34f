//! # Waveforge Common Library
//!
//! Shared code for the Waveforge audio engine service:
//! - EDL document model (JSON exchange format)
//! - Engine event types (EngineEvent enum) and EventBus
//! - Fade shapes and envelope math
//! - Sample/second conversion helpers

pub mod events;
pub mod fade;
pub mod model;
pub mod time;

pub use events::{EngineEvent, EventBus};
pub use fade::FadeShape;

//! EDL pipeline: validation → revision stamping → compilation
//!
//! The pipeline stages are pure functions over the document model;
//! only the store (which invokes them) holds state.

pub mod compile;
pub mod revision;
pub mod validate;

pub use compile::{compile, CompiledClip, CompiledEdl, CompiledTrack, FadeSpec};
pub use revision::{canonical_json, revision_of};
pub use validate::{validate, ValidationError, ValidationErrorKind};

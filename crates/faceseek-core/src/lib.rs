//! faceseek-core — Face detection and recognition engine.
//!
//! Uses SCRFD for face detection and ArcFace for embedding extraction,
//! both running via ONNX Runtime for CPU inference. Frames are packed
//! RGB24 as produced by the video decode layer.

pub mod alignment;
pub mod detector;
pub mod engine;
pub mod recognizer;
pub mod types;

pub use engine::{Detection, EngineError, FaceEngine, OnnxFaceEngine};
pub use types::{BoundingBox, DistanceMatcher, Embedding, KnownFace, MatchResult, Matcher};

use std::path::PathBuf;

/// Default directory for the ONNX model files, overridable via
/// `FACESEEK_MODEL_DIR`.
pub fn default_model_dir() -> PathBuf {
    std::env::var("FACESEEK_MODEL_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("models"))
}

//! The detection + embedding pipeline behind a single trait.
//!
//! Both the reference encoder and the video scanner consume faces through
//! [`FaceEngine`]; the production implementation composes the SCRFD detector
//! and the ArcFace recognizer, and tests substitute a stub.

use crate::detector::{DetectorError, FaceDetector};
use crate::recognizer::{FaceRecognizer, RecognizerError};
use crate::types::{BoundingBox, Embedding};
use std::path::Path;
use thiserror::Error;

/// SCRFD detection model file name expected in the model directory.
pub const DETECTOR_MODEL_FILE: &str = "det_10g.onnx";
/// ArcFace recognition model file name expected in the model directory.
pub const RECOGNIZER_MODEL_FILE: &str = "w600k_r50.onnx";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),
}

/// One detected face: its bounding box (in the analyzed frame's coordinate
/// space) and the embedding extracted from it.
#[derive(Debug, Clone)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub embedding: Embedding,
}

/// Detect every face in a packed RGB24 frame and extract an embedding for
/// each. Detections are ordered by confidence, highest first.
///
/// A failure anywhere in the pipeline fails the whole frame; the caller
/// decides whether that is fatal (reference images) or recoverable
/// (per-frame scanning).
pub trait FaceEngine {
    fn analyze(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, EngineError>;
}

/// Production engine: SCRFD detection followed by ArcFace embedding
/// extraction for each detected face.
pub struct OnnxFaceEngine {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl OnnxFaceEngine {
    /// Load both ONNX models from `model_dir`.
    pub fn load(model_dir: &Path) -> Result<Self, EngineError> {
        let detector = FaceDetector::load(&model_dir.join(DETECTOR_MODEL_FILE))?;
        let recognizer = FaceRecognizer::load(&model_dir.join(RECOGNIZER_MODEL_FILE))?;
        Ok(Self {
            detector,
            recognizer,
        })
    }
}

impl FaceEngine for OnnxFaceEngine {
    fn analyze(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Detection>, EngineError> {
        let faces = self.detector.detect(rgb, width, height)?;

        let mut detections = Vec::with_capacity(faces.len());
        for bbox in faces {
            let embedding = self.recognizer.extract(rgb, width, height, &bbox)?;
            detections.push(Detection { bbox, embedding });
        }

        Ok(detections)
    }
}

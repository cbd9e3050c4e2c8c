use serde::{Deserialize, Serialize};

/// Bounding box for a detected face, with optional facial landmarks.
///
/// Coordinates are in the pixel space of the frame the detection ran on.
/// When detection runs on a downscaled copy of a video frame, the caller
/// must divide the coordinates by the downscale factor before drawing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

impl BoundingBox {
    /// (left, top, right, bottom) after dividing by `factor` and rounding
    /// down to integer pixel coordinates.
    pub fn rescaled(&self, factor: f32) -> (i32, i32, i32, i32) {
        let left = (self.x / factor) as i32;
        let top = (self.y / factor) as i32;
        let right = ((self.x + self.width) / factor) as i32;
        let bottom = ((self.y + self.height) / factor) as i32;
        (left, top, right, bottom)
    }
}

/// Face embedding vector (512-dimensional, L2-normalized ArcFace output).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// Model version that produced this embedding (e.g., "w600k_r50").
    pub model_version: Option<String>,
}

impl Embedding {
    /// Compute Euclidean distance between two embeddings. Lower = more similar.
    pub fn distance(&self, other: &Embedding) -> f32 {
        self.values
            .iter()
            .zip(other.values.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f32>()
            .sqrt()
    }
}

/// A reference face: the embedding of one reference photo plus a label
/// (the photo's file stem) used for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnownFace {
    pub label: String,
    pub embedding: Embedding,
}

/// Result of matching a probe embedding against the known set.
#[derive(Debug, Clone)]
pub struct MatchResult {
    pub matched: bool,
    /// Euclidean distance of the best (closest) entry.
    pub distance: f32,
    /// Label of the closest entry (if the set is non-empty).
    pub label: Option<String>,
}

/// Strategy for comparing a probe embedding against the known set.
pub trait Matcher {
    fn compare(&self, probe: &Embedding, known: &[KnownFace], tolerance: f32) -> MatchResult;
}

/// Euclidean-distance matcher: a probe matches when its distance to any
/// known entry is at most `tolerance` (lower tolerance = stricter).
///
/// Every entry is compared so the reported distance/label always refer to
/// the closest known face, not just the first within tolerance.
pub struct DistanceMatcher;

impl Matcher for DistanceMatcher {
    fn compare(&self, probe: &Embedding, known: &[KnownFace], tolerance: f32) -> MatchResult {
        let mut best_dist = f32::INFINITY;
        let mut best_idx: Option<usize> = None;

        for (i, face) in known.iter().enumerate() {
            let dist = probe.distance(&face.embedding);
            if dist < best_dist {
                best_dist = dist;
                best_idx = Some(i);
            }
        }

        match best_idx {
            Some(idx) => MatchResult {
                matched: best_dist <= tolerance,
                distance: best_dist,
                label: Some(known[idx].label.clone()),
            },
            None => MatchResult {
                matched: false,
                distance: f32::INFINITY,
                label: None,
            },
        }
    }
}

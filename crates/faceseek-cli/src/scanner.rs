//! Video Scanner — per-frame detection, matching, and annotation.

use anyhow::{Context, Result};
use faceseek_core::{Detection, DistanceMatcher, EngineError, FaceEngine, KnownFace, Matcher};
use faceseek_video::{annotate_match, transcode, RgbFrame, VideoCodec};
use serde::Serialize;
use std::path::Path;

/// Scanner tunables. Defaults: tolerance 0.6, downscale 0.25.
#[derive(Debug, Clone, Copy)]
pub struct ScanOptions {
    /// Maximum embedding distance for a match; lower = stricter.
    pub tolerance: f32,
    /// Factor by which frames are shrunk before detection.
    pub downscale: f32,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            tolerance: 0.6,
            downscale: 0.25,
        }
    }
}

/// One matched frame: its 1-based index and playback timestamp in seconds.
#[derive(Debug, Clone, Serialize)]
pub struct MatchRecord {
    pub frame_index: u64,
    pub timestamp_secs: f64,
}

/// Everything the scan produced besides the output video itself.
pub struct ScanOutcome {
    /// Ordered match records, at most one per frame.
    pub matches: Vec<MatchRecord>,
    /// Total frames read (== frames written).
    pub frames: u64,
}

/// Outcome of face analysis for a single frame. Failure is a value, not a
/// control-flow accident: the failed branch writes the frame through
/// unmodified and the scan continues.
enum FrameAnalysis {
    Analyzed(Vec<Detection>),
    Failed(EngineError),
}

/// Per-frame scanning state. Owns the engine and the known set for the
/// duration of one pass over a video.
pub struct Scanner<E> {
    engine: E,
    known: Vec<KnownFace>,
    matcher: DistanceMatcher,
    opts: ScanOptions,
    matches: Vec<MatchRecord>,
}

impl<E: FaceEngine> Scanner<E> {
    pub fn new(engine: E, known: Vec<KnownFace>, opts: ScanOptions) -> Self {
        Self {
            engine,
            known,
            matcher: DistanceMatcher,
            opts,
            matches: Vec::new(),
        }
    }

    fn analyze(&mut self, frame: &RgbFrame) -> FrameAnalysis {
        let small = frame.downscaled(self.opts.downscale);
        match self.engine.analyze(&small.data, small.width, small.height) {
            Ok(detections) => FrameAnalysis::Analyzed(detections),
            Err(err) => FrameAnalysis::Failed(err),
        }
    }

    /// Process one frame in place: detect on a downscaled copy, compare each
    /// face against the known set, and on the first match draw the rescaled
    /// box + label and record the frame. Analysis failures leave the frame
    /// untouched.
    pub fn handle_frame(&mut self, frame: &mut RgbFrame) {
        match self.analyze(frame) {
            FrameAnalysis::Failed(err) => {
                tracing::error!(
                    frame = frame.index,
                    error = %err,
                    "face analysis failed; passing frame through unmodified"
                );
            }
            FrameAnalysis::Analyzed(detections) => {
                for detection in detections {
                    let result =
                        self.matcher
                            .compare(&detection.embedding, &self.known, self.opts.tolerance);
                    if !result.matched {
                        continue;
                    }

                    // Detection ran on the downscaled copy; invert the factor
                    // before drawing on the original frame.
                    let (left, top, right, bottom) = detection.bbox.rescaled(self.opts.downscale);
                    annotate_match(frame, left, top, right, bottom);

                    self.matches.push(MatchRecord {
                        frame_index: frame.index,
                        timestamp_secs: frame.timestamp,
                    });
                    tracing::info!(
                        frame = frame.index,
                        timestamp_secs = format_args!("{:.2}", frame.timestamp),
                        distance = result.distance,
                        label = result.label.as_deref().unwrap_or(""),
                        "match found"
                    );
                    // First match per frame only.
                    break;
                }
            }
        }
    }

    pub fn into_matches(self) -> Vec<MatchRecord> {
        self.matches
    }
}

/// Run the full scan: read `video`, process every frame through a
/// [`Scanner`], and write the annotated copy to `output`. `progress` is
/// called once per frame with the frame index.
pub fn scan_video<E, F>(
    video: &Path,
    output: &Path,
    codec: VideoCodec,
    engine: E,
    known: Vec<KnownFace>,
    opts: ScanOptions,
    mut progress: F,
) -> Result<ScanOutcome>
where
    E: FaceEngine,
    F: FnMut(u64),
{
    let mut scanner = Scanner::new(engine, known, opts);

    let frames = transcode(video, output, codec, |frame| {
        scanner.handle_frame(frame);
        progress(frame.index);
    })
    .with_context(|| format!("failed to scan {}", video.display()))?;

    Ok(ScanOutcome {
        matches: scanner.into_matches(),
        frames,
    })
}

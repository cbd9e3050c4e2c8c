//! Resolved runtime configuration, derived from CLI arguments.

use anyhow::{bail, Result};
use faceseek_video::VideoCodec;
use std::path::PathBuf;

/// Fully resolved scan configuration. Built once from the parsed CLI
/// arguments and validated before any model or video is opened.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub reference_dir: PathBuf,
    pub video: PathBuf,
    pub output: PathBuf,
    pub tolerance: f32,
    pub downscale: f32,
    pub codec: VideoCodec,
    pub model_dir: PathBuf,
    pub json_report: Option<PathBuf>,
}

impl ScanConfig {
    /// Reject values that would silently produce garbage instead of failing
    /// later in the pipeline.
    pub fn validate(&self) -> Result<()> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            bail!("tolerance must be a non-negative number, got {}", self.tolerance);
        }
        if !self.downscale.is_finite() || self.downscale <= 0.0 || self.downscale > 1.0 {
            bail!(
                "downscale must be in (0, 1], got {} (1.0 disables downscaling)",
                self.downscale
            );
        }
        if !self.reference_dir.is_dir() {
            bail!(
                "reference directory {} does not exist or is not a directory",
                self.reference_dir.display()
            );
        }
        if !self.video.is_file() {
            bail!("video file {} does not exist", self.video.display());
        }
        Ok(())
    }
}

/// Resolve the model directory: explicit flag wins, then the
/// `FACESEEK_MODEL_DIR` environment variable, then `models/`.
pub fn resolve_model_dir(flag: Option<PathBuf>) -> PathBuf {
    flag.unwrap_or_else(faceseek_core::default_model_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dir: &std::path::Path, video: &std::path::Path) -> ScanConfig {
        ScanConfig {
            reference_dir: dir.to_path_buf(),
            video: video.to_path_buf(),
            output: PathBuf::from("output_with_matches.mp4"),
            tolerance: 0.6,
            downscale: 0.25,
            codec: VideoCodec::Mpeg4,
            model_dir: PathBuf::from("models"),
            json_report: None,
        }
    }

    fn valid_fixture() -> (tempfile::TempDir, ScanConfig) {
        let dir = tempfile::tempdir().unwrap();
        let refs = dir.path().join("refs");
        std::fs::create_dir(&refs).unwrap();
        let video = dir.path().join("clip.mp4");
        std::fs::write(&video, b"not really a video").unwrap();
        let cfg = config(&refs, &video);
        (dir, cfg)
    }

    #[test]
    fn test_valid_config_passes() {
        let (_guard, cfg) = valid_fixture();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_downscale_zero_rejected() {
        let (_guard, mut cfg) = valid_fixture();
        cfg.downscale = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_downscale_above_one_rejected() {
        let (_guard, mut cfg) = valid_fixture();
        cfg.downscale = 1.5;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_downscale_one_allowed() {
        let (_guard, mut cfg) = valid_fixture();
        cfg.downscale = 1.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let (_guard, mut cfg) = valid_fixture();
        cfg.tolerance = -0.1;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_missing_reference_dir_rejected() {
        let (_guard, mut cfg) = valid_fixture();
        cfg.reference_dir = PathBuf::from("/definitely/not/here");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_missing_video_rejected() {
        let (_guard, mut cfg) = valid_fixture();
        cfg.video = PathBuf::from("/definitely/not/here.mp4");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_model_dir_flag_wins() {
        let flag = PathBuf::from("/opt/models");
        assert_eq!(resolve_model_dir(Some(flag.clone())), flag);
    }
}

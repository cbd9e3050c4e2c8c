//! Reference Encoder — build the known set from a folder of photos.

use anyhow::{Context, Result};
use faceseek_core::{FaceEngine, KnownFace};
use std::path::{Path, PathBuf};

/// File extensions treated as reference images (matched case-insensitively).
const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Encode every reference photo in `dir` into a [`KnownFace`].
///
/// Entries are visited in sorted name order so the known set is
/// deterministic. Non-image entries are silently ignored; an image that
/// fails to decode or contains no detectable face is skipped with a
/// warning. For images with several faces, the first (most confident)
/// detection is taken. The result may be empty — the caller must treat
/// that as terminal before opening any video.
pub fn load_reference_faces<E: FaceEngine>(dir: &Path, engine: &mut E) -> Result<Vec<KnownFace>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read reference folder {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    paths.sort();

    let mut known = Vec::new();

    for path in paths {
        if !has_image_extension(&path) {
            continue;
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let label = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone());

        let image = match image::open(&path) {
            Ok(img) => img.into_rgb8(),
            Err(err) => {
                tracing::warn!(file = %file_name, error = %err, "failed to decode reference image; skipping");
                continue;
            }
        };

        match engine.analyze(image.as_raw(), image.width(), image.height()) {
            Ok(detections) => {
                // First detection = most confident face in the photo.
                if let Some(first) = detections.into_iter().next() {
                    tracing::info!(file = %file_name, "loaded reference encoding");
                    known.push(KnownFace {
                        label,
                        embedding: first.embedding,
                    });
                } else {
                    tracing::warn!(file = %file_name, "no face found in reference image");
                }
            }
            Err(err) => {
                tracing::warn!(file = %file_name, error = %err, "failed to encode reference image; skipping");
            }
        }
    }

    Ok(known)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use faceseek_core::{BoundingBox, Detection, Embedding, EngineError};
    use std::path::PathBuf;

    /// Engine stub: reports one face per analyzed image, or none/errors
    /// depending on configuration.
    struct StubEngine {
        faces_per_image: usize,
        fail: bool,
        calls: usize,
    }

    impl StubEngine {
        fn with_faces(n: usize) -> Self {
            Self {
                faces_per_image: n,
                fail: false,
                calls: 0,
            }
        }
    }

    impl FaceEngine for StubEngine {
        fn analyze(
            &mut self,
            _rgb: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<Detection>, EngineError> {
            self.calls += 1;
            if self.fail {
                return Err(EngineError::Detector(
                    faceseek_core::detector::DetectorError::InferenceFailed("stub".into()),
                ));
            }
            Ok((0..self.faces_per_image)
                .map(|i| Detection {
                    bbox: BoundingBox {
                        x: 0.0,
                        y: 0.0,
                        width: 10.0,
                        height: 10.0,
                        confidence: 1.0 - i as f32 * 0.1,
                        landmarks: None,
                    },
                    embedding: Embedding {
                        values: vec![i as f32, self.calls as f32],
                        model_version: None,
                    },
                })
                .collect())
        }
    }

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let img = image::RgbImage::from_pixel(8, 8, image::Rgb([128, 64, 32]));
        img.save_with_format(&path, image::ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn test_extension_filter() {
        assert!(has_image_extension(Path::new("a.png")));
        assert!(has_image_extension(Path::new("a.JPG")));
        assert!(has_image_extension(Path::new("a.Jpeg")));
        assert!(!has_image_extension(Path::new("a.txt")));
        assert!(!has_image_extension(Path::new("a.gif")));
        assert!(!has_image_extension(Path::new("noext")));
    }

    #[test]
    fn test_loads_one_face_per_image() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "alice.png");
        write_png(dir.path(), "bob.png");

        let mut engine = StubEngine::with_faces(1);
        let known = load_reference_faces(dir.path(), &mut engine).unwrap();

        assert_eq!(known.len(), 2);
        // sorted name order
        assert_eq!(known[0].label, "alice");
        assert_eq!(known[1].label, "bob");
        assert_eq!(engine.calls, 2);
    }

    #[test]
    fn test_non_image_entries_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "face.png");
        std::fs::write(dir.path().join("notes.txt"), b"not an image").unwrap();

        let mut engine = StubEngine::with_faces(1);
        let known = load_reference_faces(dir.path(), &mut engine).unwrap();

        assert_eq!(known.len(), 1);
        assert_eq!(engine.calls, 1, "non-image entry must not reach the engine");
    }

    #[test]
    fn test_faceless_image_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "landscape.png");

        let mut engine = StubEngine::with_faces(0);
        let known = load_reference_faces(dir.path(), &mut engine).unwrap();
        assert!(known.is_empty());
    }

    #[test]
    fn test_engine_failure_skips_file() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "broken.png");

        let mut engine = StubEngine::with_faces(1);
        engine.fail = true;
        let known = load_reference_faces(dir.path(), &mut engine).unwrap();
        assert!(known.is_empty());
    }

    #[test]
    fn test_undecodable_image_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("corrupt.png"), b"definitely not a png").unwrap();

        let mut engine = StubEngine::with_faces(1);
        let known = load_reference_faces(dir.path(), &mut engine).unwrap();
        assert!(known.is_empty());
        assert_eq!(engine.calls, 0);
    }

    #[test]
    fn test_empty_dir_empty_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut engine = StubEngine::with_faces(1);
        let known = load_reference_faces(dir.path(), &mut engine).unwrap();
        assert!(known.is_empty());
    }

    #[test]
    fn test_first_face_wins_in_multi_face_photo() {
        let dir = tempfile::tempdir().unwrap();
        write_png(dir.path(), "group.png");

        let mut engine = StubEngine::with_faces(3);
        let known = load_reference_faces(dir.path(), &mut engine).unwrap();
        assert_eq!(known.len(), 1);
        // StubEngine encodes the face index in values[0]; face 0 is first.
        assert_eq!(known[0].embedding.values[0], 0.0);
    }
}

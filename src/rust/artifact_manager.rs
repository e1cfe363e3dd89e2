use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::artifacts::{ArtifactKind, ArtifactPaths, CLASSIFIER_JSON, CLASSIFIER_ONNX, MANIFEST};
use crate::inference::ArtifactError;

/// Environment variable naming the artifact directory.
pub const ARTIFACTS_ENV: &str = "EMOTION_DETECTOR_ARTIFACTS";

#[derive(Debug, Deserialize)]
struct Manifest {
    sha256: BTreeMap<String, String>,
}

/// Locates the artifact files of one detector and checks them against an
/// optional `manifest.json` of SHA-256 digests.
#[derive(Debug, Clone)]
pub struct ArtifactManager {
    artifacts_dir: PathBuf,
}

impl ArtifactManager {
    /// Creates a new ArtifactManager with the default artifact directory
    pub fn new_default() -> Self {
        Self::new(Self::get_default_artifacts_dir())
    }

    /// Returns the default artifact directory path
    pub fn get_default_artifacts_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(ARTIFACTS_ENV) {
            return PathBuf::from(path);
        }

        // 2. Working directory, when it holds a full artifact set
        if let Ok(cwd) = env::current_dir() {
            if Self::new(&cwd).is_complete() {
                return cwd;
            }
        }

        // 3. Platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("emotion-detector").join("artifacts");
        }

        // 4. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir
                .join(".local")
                .join("share")
                .join("emotion-detector")
                .join("artifacts");
        }

        env::temp_dir().join("emotion-detector").join("artifacts")
    }

    pub fn new<P: AsRef<Path>>(artifacts_dir: P) -> Self {
        Self {
            artifacts_dir: artifacts_dir.as_ref().to_path_buf(),
        }
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    /// `model.json` when present, else `model.onnx` when present, else the
    /// `model.json` location (so a missing file is reported under its default name).
    pub fn get_classifier_path(&self) -> PathBuf {
        let json = self.artifacts_dir.join(CLASSIFIER_JSON);
        if json.exists() {
            return json;
        }
        let onnx = self.artifacts_dir.join(CLASSIFIER_ONNX);
        if onnx.exists() {
            return onnx;
        }
        json
    }

    pub fn get_vectorizer_path(&self) -> PathBuf {
        self.artifacts_dir.join(ArtifactKind::Vectorizer.file_name())
    }

    pub fn get_label_encoder_path(&self) -> PathBuf {
        self.artifacts_dir.join(ArtifactKind::LabelEncoder.file_name())
    }

    pub fn get_manifest_path(&self) -> PathBuf {
        self.artifacts_dir.join(MANIFEST)
    }

    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths {
            classifier: self.get_classifier_path(),
            vectorizer: self.get_vectorizer_path(),
            label_encoder: self.get_label_encoder_path(),
        }
    }

    pub fn is_complete(&self) -> bool {
        let paths = self.paths();
        let complete = paths.iter().all(|(kind, path)| {
            let exists = path.exists();
            log::debug!("  {} path: {:?} (exists: {})", kind, path, exists);
            exists
        });
        complete
    }

    /// Checks every file listed in `manifest.json` against its digest.
    ///
    /// Returns `Ok(false)` when the directory has no manifest, `Ok(true)` when
    /// every listed file matches.
    pub fn verify(&self) -> Result<bool, ArtifactError> {
        let manifest_path = self.get_manifest_path();
        if !manifest_path.exists() {
            log::info!("No manifest at {:?}, skipping checksum verification", manifest_path);
            return Ok(false);
        }

        let bytes = fs::read(&manifest_path).map_err(|source| ArtifactError::Io {
            path: manifest_path.clone(),
            source,
        })?;
        let manifest: Manifest =
            serde_json::from_slice(&bytes).map_err(|source| ArtifactError::BadManifest {
                path: manifest_path.clone(),
                source,
            })?;

        for (file, expected) in &manifest.sha256 {
            let path = self.artifacts_dir.join(file);
            let actual = file_digest(&path)?;
            log::debug!("Verifying {}: expected {}, got {}", file, expected, actual);
            if !actual.eq_ignore_ascii_case(expected) {
                log::error!("{} hash mismatch: expected {}, got {}", file, expected, actual);
                return Err(ArtifactError::ChecksumMismatch {
                    file: file.clone(),
                    expected: expected.clone(),
                    actual,
                });
            }
        }

        log::info!("Verified {} artifact checksums", manifest.sha256.len());
        Ok(true)
    }
}

/// Hex-encoded SHA-256 digest of a file.
pub fn file_digest(path: &Path) -> Result<String, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

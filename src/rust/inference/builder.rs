use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

use super::error::ArtifactError;
use super::label_encoder::LabelEncoder;
use super::model::{Classifier, LinearModel};
use super::service::InferenceService;
use super::vectorizer::TfidfVectorizer;
use crate::artifact_manager::ArtifactManager;
use crate::artifacts::{ArtifactPaths, ClassifierFormat};
use crate::runtime::RuntimeConfig;

/// A builder for constructing an [`InferenceService`] from artifact files.
///
/// Paths default to the standard file names inside the artifact directory,
/// which itself defaults to [`ArtifactManager::get_default_artifacts_dir`].
/// Individual files can be overridden.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use emotion_detector::InferenceService;
///
/// let service = InferenceService::builder()
///     .with_artifact_dir("artifacts")
///     .with_label_encoder_path("artifacts/labels_v2.json")
///     .build()?;
///
/// let prediction = service.predict("I can't stop smiling")?;
/// println!("{}", prediction.label);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ServiceBuilder {
    artifact_dir: Option<PathBuf>,
    classifier_path: Option<PathBuf>,
    vectorizer_path: Option<PathBuf>,
    label_encoder_path: Option<PathBuf>,
    runtime_config: RuntimeConfig,
    verify_checksums: bool,
}

impl Default for ServiceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceBuilder {
    pub fn new() -> Self {
        Self {
            artifact_dir: None,
            classifier_path: None,
            vectorizer_path: None,
            label_encoder_path: None,
            runtime_config: RuntimeConfig::default(),
            verify_checksums: true,
        }
    }

    /// Directory holding `model.json` (or `model.onnx`), `vectorizer.json`,
    /// `label_encoder.json` and optionally `manifest.json`.
    pub fn with_artifact_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.artifact_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn with_classifier_path(mut self, path: impl AsRef<Path>) -> Self {
        self.classifier_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_vectorizer_path(mut self, path: impl AsRef<Path>) -> Self {
        self.vectorizer_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_label_encoder_path(mut self, path: impl AsRef<Path>) -> Self {
        self.label_encoder_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Sets the runtime configuration for ONNX classifiers
    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime_config = config;
        self
    }

    /// Whether to check the artifact directory's manifest before loading. On by default.
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// Resolves, verifies and loads every artifact, then cross-checks them.
    pub fn build(self) -> Result<InferenceService, ArtifactError> {
        let manager = match &self.artifact_dir {
            Some(dir) => ArtifactManager::new(dir),
            None => ArtifactManager::new_default(),
        };
        info!("Loading artifacts from {:?}", manager.artifacts_dir());

        if self.verify_checksums {
            manager.verify()?;
        } else {
            warn!("Checksum verification disabled");
        }

        let defaults = manager.paths();
        let paths = ArtifactPaths {
            classifier: self.classifier_path.unwrap_or(defaults.classifier),
            vectorizer: self.vectorizer_path.unwrap_or(defaults.vectorizer),
            label_encoder: self.label_encoder_path.unwrap_or(defaults.label_encoder),
        };

        let classifier = load_classifier(&paths.classifier, &self.runtime_config)?;
        let vectorizer = TfidfVectorizer::from_file(&paths.vectorizer)?;
        let label_encoder = LabelEncoder::from_file(&paths.label_encoder)?;

        InferenceService::assemble(classifier, Arc::new(vectorizer), label_encoder, Some(paths))
    }
}

fn load_classifier(path: &Path, config: &RuntimeConfig) -> Result<Arc<dyn Classifier>, ArtifactError> {
    match ClassifierFormat::from_path(path) {
        ClassifierFormat::Json => Ok(Arc::new(LinearModel::from_file(path)?)),
        #[cfg(feature = "onnx")]
        ClassifierFormat::Onnx => Ok(Arc::new(super::onnx::OnnxClassifier::from_file(path, config)?)),
        #[cfg(not(feature = "onnx"))]
        ClassifierFormat::Onnx => {
            let _ = config;
            Err(ArtifactError::Runtime(format!(
                "{:?} is an ONNX model; rebuild with the `onnx` feature to load it",
                path
            )))
        }
    }
}

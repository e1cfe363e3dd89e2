use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

use crate::inference::ArtifactError;

/// The three artifacts a detector is assembled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Trained classifier (`model.json`, or `model.onnx` with the `onnx` feature)
    Classifier,
    /// Text to feature-vector transformer (`vectorizer.json`)
    Vectorizer,
    /// Class index to label mapping (`label_encoder.json`)
    LabelEncoder,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::Classifier,
        ArtifactKind::Vectorizer,
        ArtifactKind::LabelEncoder,
    ];

    /// Default file name inside an artifact directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Classifier => CLASSIFIER_JSON,
            Self::Vectorizer => "vectorizer.json",
            Self::LabelEncoder => "label_encoder.json",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classifier => write!(f, "classifier"),
            Self::Vectorizer => write!(f, "vectorizer"),
            Self::LabelEncoder => write!(f, "label encoder"),
        }
    }
}

pub(crate) const CLASSIFIER_JSON: &str = "model.json";
pub(crate) const CLASSIFIER_ONNX: &str = "model.onnx";
pub(crate) const MANIFEST: &str = "manifest.json";

/// How a classifier file is decoded, chosen from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierFormat {
    Json,
    Onnx,
}

impl ClassifierFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("onnx") => Self::Onnx,
            _ => Self::Json,
        }
    }
}

/// Resolved locations of one artifact set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub classifier: PathBuf,
    pub vectorizer: PathBuf,
    pub label_encoder: PathBuf,
}

impl ArtifactPaths {
    pub fn get(&self, kind: ArtifactKind) -> &Path {
        match kind {
            ArtifactKind::Classifier => &self.classifier,
            ArtifactKind::Vectorizer => &self.vectorizer,
            ArtifactKind::LabelEncoder => &self.label_encoder,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ArtifactKind, &Path)> {
        ArtifactKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

/// Reads and decodes one JSON artifact.
pub(crate) fn read_json<T: DeserializeOwned>(kind: ArtifactKind, path: &Path) -> Result<T, ArtifactError> {
    if !path.exists() {
        return Err(ArtifactError::NotFound {
            kind,
            path: path.to_path_buf(),
        });
    }
    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Malformed {
        kind,
        path: path.to_path_buf(),
        source,
    })
}

use std::io;
use std::path::PathBuf;

use crate::artifacts::ArtifactKind;

/// Errors raised while loading or cross-checking the artifact set.
///
/// Every variant is fatal: an [`InferenceService`](super::InferenceService)
/// is never constructed from artifacts that produce one of these.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("{kind} artifact not found at {path:?}")]
    NotFound { kind: ArtifactKind, path: PathBuf },
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{kind} artifact at {path:?} could not be decoded: {source}")]
    Malformed {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("manifest at {path:?} could not be decoded: {source}")]
    BadManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {kind} artifact: {reason}")]
    Invalid { kind: ArtifactKind, reason: String },
    #[error("vectorizer produces {vectorizer} features but the classifier expects {classifier}")]
    DimensionMismatch { vectorizer: usize, classifier: usize },
    #[error("label encoder knows {label_encoder} classes but the classifier outputs {classifier}")]
    ClassCountMismatch { label_encoder: usize, classifier: usize },
    #[error("checksum mismatch for {file}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl ArtifactError {
    pub(crate) fn invalid(kind: ArtifactKind, reason: impl Into<String>) -> Self {
        ArtifactError::Invalid {
            kind,
            reason: reason.into(),
        }
    }
}

/// Rejected user input. Recoverable: the front end shows a warning and keeps going.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Please enter some text.")]
    EmptyText,
}

/// Per-call failures of a classifier backend.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("feature vector has {actual} columns, classifier expects {expected}")]
    FeatureMismatch { expected: usize, actual: usize },
    #[error("class index {index} is out of range for {num_classes} classes")]
    UnknownClassIndex { index: usize, num_classes: usize },
    #[error("backend error: {0}")]
    Backend(String),
}

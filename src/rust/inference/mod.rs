mod error;
mod label_encoder;
mod model;
#[cfg(feature = "onnx")]
mod onnx;
mod service;
mod utils;
mod vectorizer;
pub mod builder;

pub use builder::ServiceBuilder;
pub use error::{ArtifactError, InferenceError, InputError};
pub use label_encoder::LabelEncoder;
pub use model::{Classifier, LinearModel, ModelSpec, MultiClass};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
pub use service::{InferenceService, LabelScore, Predict, Prediction};
pub use vectorizer::{Norm, TfidfSpec, TfidfVectorizer, Vectorizer, DEFAULT_TOKEN_PATTERN, MAX_NGRAM};

use crate::artifacts::ArtifactPaths;

/// Information about the artifacts behind an inference service
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceInfo {
    /// Files the service was loaded from; `None` when assembled in memory
    pub paths: Option<ArtifactPaths>,
    /// Classifier backend name
    pub backend: String,
    /// Width of the feature vectors
    pub num_features: usize,
    /// Number of classes the classifier outputs
    pub num_classes: usize,
    /// Labels in class-index order
    pub class_labels: Vec<String>,
}

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use ndarray::{Array2, ArrayView2, Ix2};
use ort::session::Session;
use ort::value::{Tensor, ValueType};

use super::error::{ArtifactError, InferenceError};
use super::model::Classifier;
use crate::artifacts::ArtifactKind;
use crate::runtime::{create_session_builder, RuntimeConfig};

/// Classifier exported to ONNX (skl2onnx layout without ZipMap).
///
/// Input 0 takes `float32[batch, n_features]`. Output 0 holds the predicted
/// labels as `int64[batch]` and output 1 the probabilities as
/// `float32[batch, n_classes]`.
pub struct OnnxClassifier {
    session: Session,
    input_name: String,
    n_features: usize,
    n_classes: usize,
    path: PathBuf,
}

impl fmt::Debug for OnnxClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OnnxClassifier")
            .field("path", &self.path)
            .field("input_name", &self.input_name)
            .field("n_features", &self.n_features)
            .field("n_classes", &self.n_classes)
            .finish()
    }
}

impl OnnxClassifier {
    pub fn from_file(path: &Path, config: &RuntimeConfig) -> Result<Self, ArtifactError> {
        if !path.exists() {
            return Err(ArtifactError::NotFound {
                kind: ArtifactKind::Classifier,
                path: path.to_path_buf(),
            });
        }

        let session = create_session_builder(config)
            .map_err(ArtifactError::Runtime)?
            .commit_from_file(path)
            .map_err(|e| ArtifactError::Runtime(format!("failed to load {:?}: {}", path, e)))?;

        let (input_name, n_features) = Self::validate_model(&session)?;
        let mut classifier = Self {
            session,
            input_name,
            n_features,
            n_classes: 0,
            path: path.to_path_buf(),
        };

        classifier.n_classes = match fixed_dim(&classifier.session.outputs[1].output_type, 1) {
            Some(n) => n,
            None => {
                log::debug!("Class count is symbolic in {:?}, probing with a zero vector", path);
                let probe = Array2::<f64>::zeros((1, n_features));
                classifier
                    .run(probe.view())
                    .map(|(_, proba)| proba.ncols())
                    .map_err(|e| ArtifactError::Runtime(format!("probe run failed: {}", e)))?
            }
        };
        if classifier.n_classes == 0 {
            return Err(ArtifactError::invalid(
                ArtifactKind::Classifier,
                "ONNX model produces an empty probability row",
            ));
        }

        log::info!(
            "ONNX classifier loaded from {:?} ({} features, {} classes)",
            path,
            classifier.n_features,
            classifier.n_classes
        );
        Ok(classifier)
    }

    fn validate_model(session: &Session) -> Result<(String, usize), ArtifactError> {
        let invalid = |reason: String| ArtifactError::invalid(ArtifactKind::Classifier, reason);

        if session.inputs.len() != 1 {
            return Err(invalid(format!(
                "ONNX model must have exactly 1 input, found {}",
                session.inputs.len()
            )));
        }
        if session.outputs.len() < 2 {
            return Err(invalid(format!(
                "ONNX model must have label and probability outputs, found {} output(s)",
                session.outputs.len()
            )));
        }

        let input = &session.inputs[0];
        let n_features = fixed_dim(&input.input_type, 1)
            .ok_or_else(|| invalid(format!("input '{}' has no fixed feature dimension", input.name)))?;
        Ok((input.name.clone(), n_features))
    }

    fn run(&self, features: ArrayView2<f64>) -> Result<(Vec<i64>, Array2<f64>), InferenceError> {
        if features.ncols() != self.n_features {
            return Err(InferenceError::FeatureMismatch {
                expected: self.n_features,
                actual: features.ncols(),
            });
        }

        let input = features.mapv(|x| x as f32).into_dyn();
        let mut inputs = HashMap::new();
        inputs.insert(
            self.input_name.as_str(),
            Tensor::from_array(input)
                .map_err(|e| InferenceError::Backend(format!("failed to create input tensor: {}", e)))?,
        );

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| InferenceError::Backend(format!("failed to run model: {}", e)))?;

        let labels = outputs[0]
            .try_extract_tensor::<i64>()
            .map_err(|e| InferenceError::Backend(format!("failed to extract labels: {}", e)))?
            .iter()
            .copied()
            .collect();
        let proba = outputs[1]
            .try_extract_tensor::<f32>()
            .map_err(|e| InferenceError::Backend(format!("failed to extract probabilities: {}", e)))?
            .mapv(f64::from)
            .into_dimensionality::<Ix2>()
            .map_err(|e| InferenceError::Backend(format!("unexpected probability shape: {}", e)))?;

        Ok((labels, proba))
    }
}

impl Classifier for OnnxClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn n_classes(&self) -> usize {
        self.n_classes
    }

    fn backend(&self) -> &'static str {
        "onnx"
    }

    fn predict(&self, features: ArrayView2<f64>) -> Result<Vec<usize>, InferenceError> {
        let (labels, _) = self.run(features)?;
        labels
            .into_iter()
            .map(|label| {
                usize::try_from(label)
                    .ok()
                    .filter(|&index| index < self.n_classes)
                    .ok_or_else(|| InferenceError::Backend(format!(
                        "model returned label {} outside 0..{}",
                        label, self.n_classes
                    )))
            })
            .collect()
    }

    fn predict_proba(&self, features: ArrayView2<f64>) -> Result<Array2<f64>, InferenceError> {
        let (_, proba) = self.run(features)?;
        if proba.ncols() != self.n_classes {
            return Err(InferenceError::Backend(format!(
                "model returned {} probabilities, expected {}",
                proba.ncols(),
                self.n_classes
            )));
        }
        Ok(proba)
    }
}

/// Size of dimension `axis` of a tensor type, when it is fixed and positive.
fn fixed_dim(value_type: &ValueType, axis: usize) -> Option<usize> {
    match value_type {
        ValueType::Tensor { dimensions, .. } => dimensions
            .get(axis)
            .copied()
            .filter(|&d| d > 0)
            .and_then(|d| usize::try_from(d).ok()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = OnnxClassifier::from_file(&dir.path().join("model.onnx"), &RuntimeConfig::default());
        assert!(matches!(
            result,
            Err(ArtifactError::NotFound { kind: ArtifactKind::Classifier, .. })
        ));
    }

    #[test]
    fn test_garbage_model_is_a_runtime_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"not an onnx graph").unwrap();
        let result = OnnxClassifier::from_file(&path, &RuntimeConfig::default());
        assert!(matches!(result, Err(ArtifactError::Runtime(_))));
    }
}

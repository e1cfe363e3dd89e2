use std::sync::Arc;

use super::error::{ArtifactError, InferenceError};
use super::label_encoder::LabelEncoder;
use super::model::Classifier;
use super::vectorizer::Vectorizer;
use super::ServiceInfo;
use crate::artifacts::ArtifactPaths;

/// Confidence assigned to one class.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Result of classifying one text.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Predicted label
    pub label: String,
    /// Class index of `label`
    pub class_index: usize,
    /// One entry per known class, in class-index order. Unrounded.
    pub scores: Vec<LabelScore>,
}

impl Prediction {
    /// Score of the predicted label.
    pub fn confidence(&self) -> f64 {
        self.scores
            .get(self.class_index)
            .map(|s| s.score)
            .unwrap_or(0.0)
    }
}

/// Anything that can turn one text into a [`Prediction`].
pub trait Predict {
    fn predict(&self, text: &str) -> Result<Prediction, InferenceError>;
}

/// Immutable bundle of classifier, vectorizer and label encoder.
///
/// Construction checks that the three artifacts fit together, so every
/// service that exists can serve predictions. The service is `Send + Sync`
/// and can be shared across threads with `Arc`:
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use emotion_detector::InferenceService;
/// use std::sync::Arc;
/// use std::thread;
///
/// let service = Arc::new(
///     InferenceService::builder()
///         .with_artifact_dir("artifacts")
///         .build()?,
/// );
///
/// let worker = Arc::clone(&service);
/// thread::spawn(move || {
///     let prediction = worker.predict("what a lovely morning").unwrap();
///     println!("{} ({:.2})", prediction.label, prediction.confidence());
/// });
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InferenceService {
    classifier: Arc<dyn Classifier>,
    vectorizer: Arc<dyn Vectorizer>,
    label_encoder: LabelEncoder,
    paths: Option<ArtifactPaths>,
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<InferenceService>();
    }
};

impl InferenceService {
    /// Creates a new ServiceBuilder for fluent construction
    pub fn builder() -> super::builder::ServiceBuilder {
        super::builder::ServiceBuilder::new()
    }

    /// Assembles a service from already-loaded artifacts.
    pub fn from_parts<C, V>(classifier: C, vectorizer: V, label_encoder: LabelEncoder) -> Result<Self, ArtifactError>
    where
        C: Classifier + 'static,
        V: Vectorizer + 'static,
    {
        Self::assemble(Arc::new(classifier), Arc::new(vectorizer), label_encoder, None)
    }

    pub(crate) fn assemble(
        classifier: Arc<dyn Classifier>,
        vectorizer: Arc<dyn Vectorizer>,
        label_encoder: LabelEncoder,
        paths: Option<ArtifactPaths>,
    ) -> Result<Self, ArtifactError> {
        if vectorizer.dim() != classifier.n_features() {
            return Err(ArtifactError::DimensionMismatch {
                vectorizer: vectorizer.dim(),
                classifier: classifier.n_features(),
            });
        }
        if label_encoder.len() != classifier.n_classes() {
            return Err(ArtifactError::ClassCountMismatch {
                label_encoder: label_encoder.len(),
                classifier: classifier.n_classes(),
            });
        }

        log::info!(
            "Inference service ready: {} backend, {} features, labels {:?}",
            classifier.backend(),
            classifier.n_features(),
            label_encoder.classes()
        );
        Ok(Self {
            classifier,
            vectorizer,
            label_encoder,
            paths,
        })
    }

    /// Returns information about the loaded artifacts
    pub fn info(&self) -> ServiceInfo {
        ServiceInfo {
            paths: self.paths.clone(),
            backend: self.classifier.backend().to_string(),
            num_features: self.classifier.n_features(),
            num_classes: self.classifier.n_classes(),
            class_labels: self.label_encoder.classes().to_vec(),
        }
    }

    /// Known labels in class-index order.
    pub fn labels(&self) -> &[String] {
        self.label_encoder.classes()
    }

    /// Classifies one text.
    ///
    /// The text is used as given: rejecting empty input is the caller's job
    /// (see [`crate::gate`]). Scores come back unrounded in class-index order.
    pub fn predict(&self, text: &str) -> Result<Prediction, InferenceError> {
        self.predict_batch(&[text])?
            .pop()
            .ok_or_else(|| InferenceError::Backend("classifier returned no rows".to_string()))
    }

    /// Classifies several texts with one vectorizer and classifier pass.
    pub fn predict_batch(&self, texts: &[&str]) -> Result<Vec<Prediction>, InferenceError> {
        let features = self.vectorizer.transform(texts);
        let indices = self.classifier.predict(features.view())?;
        let proba = self.classifier.predict_proba(features.view())?;
        if indices.len() != texts.len() || proba.nrows() != texts.len() {
            return Err(InferenceError::Backend(format!(
                "classifier returned {} labels and {} probability rows for {} inputs",
                indices.len(),
                proba.nrows(),
                texts.len()
            )));
        }

        let mut predictions = Vec::with_capacity(texts.len());
        for (&class_index, row) in indices.iter().zip(proba.rows()) {
            let label = self.label_encoder.inverse_transform(class_index)?.to_string();
            let scores = row
                .iter()
                .enumerate()
                .map(|(i, &score)| {
                    Ok(LabelScore {
                        label: self.label_encoder.inverse_transform(i)?.to_string(),
                        score,
                    })
                })
                .collect::<Result<Vec<_>, InferenceError>>()?;

            log::debug!("Predicted '{}' with confidence {:.4}", label, row[class_index]);
            predictions.push(Prediction {
                label,
                class_index,
                scores,
            });
        }
        Ok(predictions)
    }
}

impl Predict for InferenceService {
    fn predict(&self, text: &str) -> Result<Prediction, InferenceError> {
        InferenceService::predict(self, text)
    }
}

use std::fmt;
use std::path::Path;

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::Deserialize;

use super::error::{ArtifactError, InferenceError};
use super::utils::{argmax, sigmoid, softmax_inplace};
use crate::artifacts::{read_json, ArtifactKind};

/// A trained, frozen classifier over fixed-width feature vectors.
///
/// Both methods take a batch (`[n_samples, n_features]`) and return one
/// result per row. Class indices are positions in the probability rows.
pub trait Classifier: Send + Sync + fmt::Debug {
    /// Width of the feature vectors the model was trained on
    fn n_features(&self) -> usize;

    /// Number of columns in every probability row
    fn n_classes(&self) -> usize;

    /// Short backend name, for logs and [`ServiceInfo`](super::ServiceInfo)
    fn backend(&self) -> &'static str;

    fn predict(&self, features: ArrayView2<f64>) -> Result<Vec<usize>, InferenceError>;

    fn predict_proba(&self, features: ArrayView2<f64>) -> Result<Array2<f64>, InferenceError>;
}

/// How a logistic regression turns decision values into probabilities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiClass {
    /// One-vs-rest for binary models, multinomial otherwise
    #[default]
    Auto,
    Multinomial,
    Ovr,
}

/// Serialized classifier (`model.json`), tagged by `"type"`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    LogisticRegression {
        coef: Vec<Vec<f64>>,
        intercept: Vec<f64>,
        #[serde(default)]
        multi_class: MultiClass,
    },
    MultinomialNb {
        class_log_prior: Vec<f64>,
        feature_log_prob: Vec<Vec<f64>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Link {
    Softmax,
    OneVsRest,
    /// Single decision row; `scale` is 2 for a multinomial binary model.
    Binary { scale: f64 },
}

/// Linear-in-features classifier: logistic regression or multinomial naive Bayes.
///
/// Decision values are `X · Wᵀ + b`; the link function turns them into a
/// distribution over classes.
#[derive(Debug, Clone)]
pub struct LinearModel {
    weights: Array2<f64>,
    bias: Array1<f64>,
    link: Link,
    backend: &'static str,
}

impl LinearModel {
    pub fn from_file(path: &Path) -> Result<Self, ArtifactError> {
        let spec: ModelSpec = read_json(ArtifactKind::Classifier, path)?;
        let model = Self::from_spec(spec)?;
        log::info!(
            "Classifier loaded from {:?} ({}, {} features, {} classes)",
            path,
            model.backend,
            model.n_features(),
            model.n_classes()
        );
        Ok(model)
    }

    pub fn from_spec(spec: ModelSpec) -> Result<Self, ArtifactError> {
        match spec {
            ModelSpec::LogisticRegression {
                coef,
                intercept,
                multi_class,
            } => {
                let weights = matrix_from_rows(coef, "coef")?;
                let bias = bias_for(&weights, intercept, "intercept")?;
                let link = match (weights.nrows(), multi_class) {
                    (1, MultiClass::Multinomial) => Link::Binary { scale: 2.0 },
                    (1, _) => Link::Binary { scale: 1.0 },
                    (_, MultiClass::Ovr) => Link::OneVsRest,
                    (_, _) => Link::Softmax,
                };
                Ok(Self {
                    weights,
                    bias,
                    link,
                    backend: "logistic_regression",
                })
            }
            ModelSpec::MultinomialNb {
                class_log_prior,
                feature_log_prob,
            } => {
                let weights = matrix_from_rows(feature_log_prob, "feature_log_prob")?;
                let bias = bias_for(&weights, class_log_prior, "class_log_prior")?;
                if weights.nrows() < 2 {
                    return Err(ArtifactError::invalid(
                        ArtifactKind::Classifier,
                        "naive Bayes model needs at least two classes",
                    ));
                }
                Ok(Self {
                    weights,
                    bias,
                    link: Link::Softmax,
                    backend: "multinomial_nb",
                })
            }
        }
    }

    fn decision_function(&self, features: ArrayView2<f64>) -> Result<Array2<f64>, InferenceError> {
        if features.ncols() != self.n_features() {
            return Err(InferenceError::FeatureMismatch {
                expected: self.n_features(),
                actual: features.ncols(),
            });
        }
        let decision = features.dot(&self.weights.t()) + &self.bias;
        if let Some(row) = decision.rows().into_iter().position(|row| row.iter().any(|v| !v.is_finite())) {
            return Err(InferenceError::Backend(format!(
                "decision values for row {} are not finite",
                row
            )));
        }
        Ok(decision)
    }
}

impl Classifier for LinearModel {
    fn n_features(&self) -> usize {
        self.weights.ncols()
    }

    fn n_classes(&self) -> usize {
        match self.link {
            Link::Binary { .. } => 2,
            _ => self.weights.nrows(),
        }
    }

    fn backend(&self) -> &'static str {
        self.backend
    }

    fn predict(&self, features: ArrayView2<f64>) -> Result<Vec<usize>, InferenceError> {
        let decision = self.decision_function(features)?;
        let indices = decision
            .rows()
            .into_iter()
            .map(|row| match self.link {
                Link::Binary { .. } => usize::from(row[0] > 0.0),
                _ => argmax(row).unwrap_or(0),
            })
            .collect();
        Ok(indices)
    }

    fn predict_proba(&self, features: ArrayView2<f64>) -> Result<Array2<f64>, InferenceError> {
        let decision = self.decision_function(features)?;
        match self.link {
            Link::Binary { scale } => {
                let mut proba = Array2::zeros((decision.nrows(), 2));
                for (d, mut row) in decision.column(0).iter().zip(proba.rows_mut()) {
                    let p = sigmoid(scale * d);
                    row[0] = 1.0 - p;
                    row[1] = p;
                }
                Ok(proba)
            }
            Link::OneVsRest => {
                let mut proba = decision.mapv(sigmoid);
                for mut row in proba.axis_iter_mut(Axis(0)) {
                    let sum = row.sum();
                    if sum > 0.0 {
                        row /= sum;
                    }
                }
                Ok(proba)
            }
            Link::Softmax => {
                let mut proba = decision;
                for row in proba.axis_iter_mut(Axis(0)) {
                    softmax_inplace(row);
                }
                Ok(proba)
            }
        }
    }
}

fn matrix_from_rows(rows: Vec<Vec<f64>>, field: &str) -> Result<Array2<f64>, ArtifactError> {
    let invalid = |reason: String| ArtifactError::invalid(ArtifactKind::Classifier, reason);

    let n_rows = rows.len();
    let n_cols = rows.first().map(Vec::len).unwrap_or(0);
    if n_rows == 0 || n_cols == 0 {
        return Err(invalid(format!("{} is empty", field)));
    }
    if let Some(i) = rows.iter().position(|row| row.len() != n_cols) {
        return Err(invalid(format!(
            "{} row {} has {} columns, expected {}",
            field,
            i,
            rows[i].len(),
            n_cols
        )));
    }

    let flat: Vec<f64> = rows.into_iter().flatten().collect();
    if flat.iter().any(|v| !v.is_finite()) {
        return Err(invalid(format!("{} contains non-finite values", field)));
    }
    Array2::from_shape_vec((n_rows, n_cols), flat).map_err(|e| invalid(format!("{}: {}", field, e)))
}

fn bias_for(weights: &Array2<f64>, bias: Vec<f64>, field: &str) -> Result<Array1<f64>, ArtifactError> {
    if bias.len() != weights.nrows() {
        return Err(ArtifactError::invalid(
            ArtifactKind::Classifier,
            format!("{} has {} values for {} weight rows", field, bias.len(), weights.nrows()),
        ));
    }
    if bias.iter().any(|v| !v.is_finite()) {
        return Err(ArtifactError::invalid(
            ArtifactKind::Classifier,
            format!("{} contains non-finite values", field),
        ));
    }
    Ok(Array1::from(bias))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use serde_json::json;

    fn model(value: serde_json::Value) -> LinearModel {
        let spec: ModelSpec = serde_json::from_value(value).unwrap();
        LinearModel::from_spec(spec).unwrap()
    }

    fn assert_rows_sum_to_one(proba: &Array2<f64>) {
        for row in proba.rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9, "row {:?} does not sum to 1", row);
        }
    }

    #[test]
    fn test_multinomial_logistic_regression() {
        let m = model(json!({
            "type": "logistic_regression",
            "coef": [[1.0, 0.0], [0.0, 1.0], [-1.0, -1.0]],
            "intercept": [0.0, 0.0, 0.0]
        }));
        assert_eq!(m.n_features(), 2);
        assert_eq!(m.n_classes(), 3);

        let x = array![[2.0, 0.0], [0.0, 3.0]];
        assert_eq!(m.predict(x.view()).unwrap(), vec![0, 1]);

        let proba = m.predict_proba(x.view()).unwrap();
        assert_eq!(proba.shape(), &[2, 3]);
        assert_rows_sum_to_one(&proba);
        assert!(proba[[0, 0]] > proba[[0, 1]]);
    }

    #[test]
    fn test_ovr_normalizes_sigmoids() {
        let m = model(json!({
            "type": "logistic_regression",
            "coef": [[1.0], [-1.0], [0.5]],
            "intercept": [0.0, 0.0, -0.5],
            "multi_class": "ovr"
        }));
        let x = array![[1.0]];
        let proba = m.predict_proba(x.view()).unwrap();
        assert_rows_sum_to_one(&proba);

        let raw = [sigmoid(1.0), sigmoid(-1.0), sigmoid(0.0)];
        let total: f64 = raw.iter().sum();
        for (i, r) in raw.iter().enumerate() {
            assert!((proba[[0, i]] - r / total).abs() < 1e-12);
        }
    }

    #[test]
    fn test_binary_logistic_regression() {
        let m = model(json!({
            "type": "logistic_regression",
            "coef": [[2.0]],
            "intercept": [-1.0]
        }));
        assert_eq!(m.n_classes(), 2);

        let x = array![[1.0], [0.0]];
        assert_eq!(m.predict(x.view()).unwrap(), vec![1, 0]);

        let proba = m.predict_proba(x.view()).unwrap();
        assert!((proba[[0, 1]] - sigmoid(1.0)).abs() < 1e-12);
        assert!((proba[[1, 0]] - (1.0 - sigmoid(-1.0))).abs() < 1e-12);
        assert_rows_sum_to_one(&proba);
    }

    #[test]
    fn test_binary_multinomial_doubles_decision() {
        let m = model(json!({
            "type": "logistic_regression",
            "coef": [[1.0]],
            "intercept": [0.0],
            "multi_class": "multinomial"
        }));
        let proba = m.predict_proba(array![[1.0]].view()).unwrap();
        assert!((proba[[0, 1]] - sigmoid(2.0)).abs() < 1e-12);
    }

    #[test]
    fn test_multinomial_nb() {
        let m = model(json!({
            "type": "multinomial_nb",
            "class_log_prior": [(0.5f64).ln(), (0.5f64).ln()],
            "feature_log_prob": [[(0.9f64).ln(), (0.1f64).ln()], [(0.2f64).ln(), (0.8f64).ln()]]
        }));
        assert_eq!(m.backend(), "multinomial_nb");

        let x = array![[1.0, 0.0], [0.0, 1.0]];
        assert_eq!(m.predict(x.view()).unwrap(), vec![0, 1]);

        let proba = m.predict_proba(x.view()).unwrap();
        assert_rows_sum_to_one(&proba);
        // Equal priors: posterior for row 0 is 0.9 / (0.9 + 0.2)
        assert!((proba[[0, 0]] - 0.9 / 1.1).abs() < 1e-9);
    }

    #[test]
    fn test_predict_matches_most_probable_class() {
        let m = model(json!({
            "type": "logistic_regression",
            "coef": [[0.3, -0.2, 0.1], [-0.4, 0.9, 0.0], [0.2, 0.2, -0.7]],
            "intercept": [0.1, -0.3, 0.05]
        }));
        let x = array![[1.0, 0.0, 0.0], [0.0, 0.5, 0.5], [0.2, 0.1, 0.9], [0.0, 0.0, 0.0]];
        let predicted = m.predict(x.view()).unwrap();
        let proba = m.predict_proba(x.view()).unwrap();
        for (row, &label) in proba.rows().into_iter().zip(&predicted) {
            assert_eq!(argmax(row), Some(label));
        }
    }

    #[test]
    fn test_feature_mismatch() {
        let m = model(json!({
            "type": "logistic_regression",
            "coef": [[1.0, 2.0], [3.0, 4.0]],
            "intercept": [0.0, 0.0]
        }));
        let x = array![[1.0, 2.0, 3.0]];
        assert!(matches!(
            m.predict(x.view()),
            Err(InferenceError::FeatureMismatch { expected: 2, actual: 3 })
        ));
    }

    #[test]
    fn test_overflowing_decision_is_an_error() {
        let m = model(json!({
            "type": "logistic_regression",
            "coef": [[1e308], [-1e308]],
            "intercept": [0.0, 0.0]
        }));
        let x = array![[10.0]];
        assert!(matches!(m.predict(x.view()), Err(InferenceError::Backend(_))));
        assert!(matches!(m.predict_proba(x.view()), Err(InferenceError::Backend(_))));
        assert!(m.predict_proba(array![[1.0]].view()).is_ok());
    }

    #[test]
    fn test_invalid_specs() {
        let cases = vec![
            json!({"type": "logistic_regression", "coef": [], "intercept": []}),
            json!({"type": "logistic_regression", "coef": [[1.0], [1.0, 2.0]], "intercept": [0.0, 0.0]}),
            json!({"type": "logistic_regression", "coef": [[1.0], [2.0]], "intercept": [0.0]}),
            json!({"type": "multinomial_nb", "class_log_prior": [0.0], "feature_log_prob": [[-1.0]]}),
        ];
        for case in cases {
            let spec: ModelSpec = serde_json::from_value(case.clone()).unwrap();
            assert!(
                matches!(LinearModel::from_spec(spec), Err(ArtifactError::Invalid { .. })),
                "expected {} to be rejected",
                case
            );
        }
    }

    #[test]
    fn test_unknown_model_type_is_a_decode_error() {
        let result: Result<ModelSpec, _> =
            serde_json::from_value(json!({"type": "random_forest", "trees": []}));
        assert!(result.is_err());
    }
}

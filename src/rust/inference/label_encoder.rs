use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use super::error::{ArtifactError, InferenceError};
use crate::artifacts::{read_json, ArtifactKind};

#[derive(Debug, Deserialize)]
struct LabelEncoderSpec {
    classes: Vec<String>,
}

/// Bijection between class indices `0..len()` and label strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

impl LabelEncoder {
    /// Builds an encoder whose class `i` is `classes[i]`.
    ///
    /// Fails when the list is empty or a label appears twice, since either
    /// would break the index/label bijection.
    pub fn new<S: Into<String>>(classes: Vec<S>) -> Result<Self, ArtifactError> {
        let classes: Vec<String> = classes.into_iter().map(Into::into).collect();
        if classes.is_empty() {
            return Err(ArtifactError::invalid(
                ArtifactKind::LabelEncoder,
                "label encoder has no classes",
            ));
        }

        let mut index = HashMap::with_capacity(classes.len());
        for (i, label) in classes.iter().enumerate() {
            if index.insert(label.clone(), i).is_some() {
                return Err(ArtifactError::invalid(
                    ArtifactKind::LabelEncoder,
                    format!("label '{}' appears more than once", label),
                ));
            }
        }

        Ok(Self { classes, index })
    }

    pub fn from_file(path: &Path) -> Result<Self, ArtifactError> {
        let spec: LabelEncoderSpec = read_json(ArtifactKind::LabelEncoder, path)?;
        let encoder = Self::new(spec.classes)?;
        log::info!("Label encoder loaded from {:?} ({} classes)", path, encoder.len());
        Ok(encoder)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Labels in class-index order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn transform(&self, label: &str) -> Option<usize> {
        self.index.get(label).copied()
    }

    pub fn inverse_transform(&self, index: usize) -> Result<&str, InferenceError> {
        self.classes
            .get(index)
            .map(String::as_str)
            .ok_or(InferenceError::UnknownClassIndex {
                index,
                num_classes: self.classes.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_indices() {
        let encoder = LabelEncoder::new(vec!["anger", "joy", "sadness"]).unwrap();
        assert_eq!(encoder.len(), 3);
        assert_eq!(encoder.inverse_transform(1).unwrap(), "joy");
        assert_eq!(encoder.transform("sadness"), Some(2));
        assert_eq!(encoder.transform("fear"), None);
    }

    #[test]
    fn test_out_of_range_index() {
        let encoder = LabelEncoder::new(vec!["joy"]).unwrap();
        assert!(matches!(
            encoder.inverse_transform(1),
            Err(InferenceError::UnknownClassIndex { index: 1, num_classes: 1 })
        ));
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(LabelEncoder::new(vec!["joy", "joy"]).is_err());
        assert!(LabelEncoder::new(Vec::<String>::new()).is_err());
    }
}

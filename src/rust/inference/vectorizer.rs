use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use ndarray::{Array1, Array2, ArrayViewMut1};
use regex::Regex;
use serde::Deserialize;

use super::error::ArtifactError;
use super::utils::{l1_normalize, l2_normalize};
use crate::artifacts::{read_json, ArtifactKind};

/// Transforms raw text into fixed-width feature vectors.
///
/// The width is fixed when the vectorizer is fitted and never changes at
/// runtime; every row returned by [`transform`](Vectorizer::transform) has
/// exactly [`dim`](Vectorizer::dim) columns.
pub trait Vectorizer: Send + Sync + fmt::Debug {
    /// Number of features per vector
    fn dim(&self) -> usize;

    /// One row per input text, in input order.
    fn transform(&self, texts: &[&str]) -> Array2<f64>;

    fn transform_one(&self, text: &str) -> Array1<f64> {
        self.transform(&[text]).row(0).to_owned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Norm {
    L1,
    L2,
}

pub const DEFAULT_TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// Longest n-gram a vectorizer may be configured to produce.
pub const MAX_NGRAM: usize = 16;

fn default_true() -> bool {
    true
}

fn default_token_pattern() -> String {
    DEFAULT_TOKEN_PATTERN.to_string()
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_norm() -> Option<Norm> {
    Some(Norm::L2)
}

/// Serialized form of a fitted TF-IDF vectorizer (`vectorizer.json`).
#[derive(Debug, Clone, Deserialize)]
pub struct TfidfSpec {
    pub vocabulary: HashMap<String, usize>,
    #[serde(default)]
    pub idf: Option<Vec<f64>>,
    #[serde(default = "default_true")]
    pub lowercase: bool,
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
    #[serde(default = "default_ngram_range")]
    pub ngram_range: (usize, usize),
    #[serde(default)]
    pub stop_words: Vec<String>,
    #[serde(default)]
    pub binary: bool,
    #[serde(default)]
    pub sublinear_tf: bool,
    #[serde(default = "default_norm")]
    pub norm: Option<Norm>,
}

impl TfidfSpec {
    /// A spec with the given vocabulary and default settings, no idf weights.
    pub fn new(vocabulary: HashMap<String, usize>) -> Self {
        Self {
            vocabulary,
            idf: None,
            lowercase: true,
            token_pattern: default_token_pattern(),
            ngram_range: default_ngram_range(),
            stop_words: Vec::new(),
            binary: false,
            sublinear_tf: false,
            norm: default_norm(),
        }
    }
}

/// Word n-gram TF-IDF vectorizer.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Option<Array1<f64>>,
    lowercase: bool,
    pattern: Regex,
    capture_group: bool,
    ngram_range: (usize, usize),
    stop_words: HashSet<String>,
    binary: bool,
    sublinear_tf: bool,
    norm: Option<Norm>,
}

impl TfidfVectorizer {
    pub fn from_file(path: &Path) -> Result<Self, ArtifactError> {
        let spec: TfidfSpec = read_json(ArtifactKind::Vectorizer, path)?;
        let vectorizer = Self::from_spec(spec)?;
        log::info!(
            "Vectorizer loaded from {:?} ({} features, ngram range {:?})",
            path,
            vectorizer.dim(),
            vectorizer.ngram_range
        );
        Ok(vectorizer)
    }

    pub fn from_spec(spec: TfidfSpec) -> Result<Self, ArtifactError> {
        let invalid = |reason: String| ArtifactError::invalid(ArtifactKind::Vectorizer, reason);

        let dim = spec.vocabulary.len();
        if dim == 0 {
            return Err(invalid("vocabulary is empty".into()));
        }

        let mut seen = vec![false; dim];
        for (term, &index) in &spec.vocabulary {
            if index >= dim {
                return Err(invalid(format!(
                    "term '{}' has index {} but the vocabulary has {} terms",
                    term, index, dim
                )));
            }
            if seen[index] {
                return Err(invalid(format!("index {} is assigned to more than one term", index)));
            }
            seen[index] = true;
        }

        let idf = match spec.idf {
            Some(idf) => {
                if idf.len() != dim {
                    return Err(invalid(format!(
                        "idf has {} weights but the vocabulary has {} terms",
                        idf.len(),
                        dim
                    )));
                }
                if idf.iter().any(|w| !w.is_finite()) {
                    return Err(invalid("idf contains non-finite weights".into()));
                }
                Some(Array1::from(idf))
            }
            None => None,
        };

        let (min_n, max_n) = spec.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(invalid(format!("invalid ngram range ({}, {})", min_n, max_n)));
        }
        if max_n > MAX_NGRAM {
            return Err(invalid(format!(
                "ngram range ({}, {}) exceeds the maximum n-gram length {}",
                min_n, max_n, MAX_NGRAM
            )));
        }

        let pattern = Regex::new(&spec.token_pattern)
            .map_err(|e| invalid(format!("invalid token pattern: {}", e)))?;
        // captures_len counts the implicit whole-match group
        let capture_group = match pattern.captures_len() {
            1 => false,
            2 => true,
            n => {
                return Err(invalid(format!(
                    "token pattern has {} capture groups, at most one is allowed",
                    n - 1
                )))
            }
        };

        Ok(Self {
            vocabulary: spec.vocabulary,
            idf,
            lowercase: spec.lowercase,
            pattern,
            capture_group,
            ngram_range: spec.ngram_range,
            stop_words: spec.stop_words.into_iter().collect(),
            binary: spec.binary,
            sublinear_tf: spec.sublinear_tf,
            norm: spec.norm,
        })
    }

    /// Splits text into the terms that are looked up in the vocabulary.
    pub fn analyze(&self, text: &str) -> Vec<String> {
        let text: Cow<str> = if self.lowercase {
            Cow::Owned(text.to_lowercase())
        } else {
            Cow::Borrowed(text)
        };

        let tokens: Vec<&str> = if self.capture_group {
            self.pattern
                .captures_iter(&text)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str())
                .collect()
        } else {
            self.pattern.find_iter(&text).map(|m| m.as_str()).collect()
        };

        let tokens: Vec<&str> = tokens
            .into_iter()
            .filter(|token| !self.stop_words.contains(*token))
            .collect();

        let (min_n, max_n) = self.ngram_range;
        let mut terms = Vec::with_capacity(tokens.len().saturating_mul(max_n - min_n + 1));
        for n in min_n..=max_n {
            if n > tokens.len() {
                break;
            }
            terms.extend(tokens.windows(n).map(|window| window.join(" ")));
        }
        terms
    }

    fn fill_row(&self, text: &str, mut row: ArrayViewMut1<f64>) {
        for term in self.analyze(text) {
            if let Some(&index) = self.vocabulary.get(&term) {
                row[index] += 1.0;
            }
        }

        if self.binary {
            row.mapv_inplace(|tf| if tf > 0.0 { 1.0 } else { 0.0 });
        } else if self.sublinear_tf {
            row.mapv_inplace(|tf| if tf > 0.0 { 1.0 + tf.ln() } else { 0.0 });
        }

        if let Some(idf) = &self.idf {
            row *= idf;
        }

        match self.norm {
            Some(Norm::L2) => l2_normalize(row),
            Some(Norm::L1) => l1_normalize(row),
            None => {}
        }
    }
}

impl Vectorizer for TfidfVectorizer {
    fn dim(&self) -> usize {
        self.vocabulary.len()
    }

    fn transform(&self, texts: &[&str]) -> Array2<f64> {
        let mut features = Array2::zeros((texts.len(), self.dim()));
        for (text, row) in texts.iter().zip(features.rows_mut()) {
            self.fill_row(text, row);
        }
        features
    }
}

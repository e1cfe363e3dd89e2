#![allow(dead_code)]

use std::fs;
use std::path::Path;

use env_logger::Env;
use serde_json::{json, Value};
use tempfile::TempDir;

pub const LABELS: [&str; 3] = ["joy", "anger", "sadness"];

pub fn init_logger() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("warn")).try_init();
}

pub fn vectorizer_json() -> Value {
    json!({
        "vocabulary": {
            "happy": 0, "glad": 1, "love": 2,
            "angry": 3, "furious": 4, "hate": 5,
            "sad": 6, "lonely": 7, "cry": 8,
            "today": 9
        },
        "idf": [2.0, 2.1, 1.9, 2.0, 2.3, 1.8, 2.0, 2.2, 2.1, 1.1]
    })
}

pub fn model_json() -> Value {
    let mut coef = vec![vec![-1.0; 10]; 3];
    for (class, row) in coef.iter_mut().enumerate() {
        for feature in class * 3..class * 3 + 3 {
            row[feature] = 4.0;
        }
        row[9] = 0.0;
    }
    json!({
        "type": "logistic_regression",
        "coef": coef,
        "intercept": [0.0, 0.0, 0.0]
    })
}

pub fn label_encoder_json() -> Value {
    json!({ "classes": LABELS })
}

pub fn write_json(path: &Path, value: &Value) {
    fs::write(path, serde_json::to_vec_pretty(value).unwrap()).unwrap();
}

/// A directory holding a consistent joy/anger/sadness artifact set.
pub fn artifact_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_json(&dir.path().join("model.json"), &model_json());
    write_json(&dir.path().join("vectorizer.json"), &vectorizer_json());
    write_json(&dir.path().join("label_encoder.json"), &label_encoder_json());
    dir
}

/// Writes `manifest.json` with the current digests of the three artifacts.
pub fn write_manifest(dir: &Path) {
    let mut digests = serde_json::Map::new();
    for name in ["model.json", "vectorizer.json", "label_encoder.json"] {
        let digest = emotion_detector::artifact_manager::file_digest(&dir.join(name)).unwrap();
        digests.insert(name.to_string(), Value::String(digest));
    }
    write_json(&dir.join("manifest.json"), &json!({ "sha256": digests }));
}

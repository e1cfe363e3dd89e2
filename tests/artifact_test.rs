mod common;

use std::fs;

use common::{artifact_dir, init_logger, write_json, write_manifest};
use emotion_detector::{ArtifactError, ArtifactKind, ArtifactManager, InferenceService};
use serde_json::json;

fn build(dir: &std::path::Path) -> Result<InferenceService, ArtifactError> {
    init_logger();
    InferenceService::builder().with_artifact_dir(dir).build()
}

#[test]
fn test_missing_artifacts() {
    for kind in ArtifactKind::ALL {
        let dir = artifact_dir();
        fs::remove_file(dir.path().join(kind.file_name())).unwrap();
        match build(dir.path()) {
            Err(ArtifactError::NotFound { kind: missing, .. }) => assert_eq!(missing, kind),
            other => panic!("expected NotFound for {}, got {:?}", kind, other),
        }
    }
}

#[test]
fn test_corrupt_artifacts() {
    for kind in ArtifactKind::ALL {
        let dir = artifact_dir();
        fs::write(dir.path().join(kind.file_name()), b"\x80\x03corrupt pickle").unwrap();
        match build(dir.path()) {
            Err(ArtifactError::Malformed { kind: broken, .. }) => assert_eq!(broken, kind),
            other => panic!("expected Malformed for {}, got {:?}", kind, other),
        }
    }
}

#[test]
fn test_structurally_invalid_classifier() {
    let dir = artifact_dir();
    write_json(
        &dir.path().join("model.json"),
        &json!({"type": "logistic_regression", "coef": [[1.0, "x"]], "intercept": [0.0]}),
    );
    assert!(matches!(build(dir.path()), Err(ArtifactError::Malformed { .. })));

    write_json(
        &dir.path().join("model.json"),
        &json!({"type": "logistic_regression", "coef": [[1.0], [1.0, 2.0]], "intercept": [0.0, 0.0]}),
    );
    assert!(matches!(
        build(dir.path()),
        Err(ArtifactError::Invalid { kind: ArtifactKind::Classifier, .. })
    ));
}

#[test]
fn test_oversized_ngram_range_fails_at_load() {
    let dir = artifact_dir();
    let mut vectorizer = common::vectorizer_json();
    vectorizer["ngram_range"] = json!([1, u64::MAX]);
    write_json(&dir.path().join("vectorizer.json"), &vectorizer);
    assert!(matches!(
        build(dir.path()),
        Err(ArtifactError::Invalid { kind: ArtifactKind::Vectorizer, .. })
    ));
}

#[test]
fn test_label_count_must_match_classifier() {
    let dir = artifact_dir();
    write_json(
        &dir.path().join("label_encoder.json"),
        &json!({"classes": ["joy", "anger"]}),
    );
    assert!(matches!(
        build(dir.path()),
        Err(ArtifactError::ClassCountMismatch { label_encoder: 2, classifier: 3 })
    ));
}

#[test]
fn test_vectorizer_width_must_match_classifier() {
    let dir = artifact_dir();
    write_json(
        &dir.path().join("vectorizer.json"),
        &json!({"vocabulary": {"happy": 0, "angry": 1}}),
    );
    assert!(matches!(
        build(dir.path()),
        Err(ArtifactError::DimensionMismatch { vectorizer: 2, classifier: 10 })
    ));
}

#[test]
fn test_manifest_is_checked_before_loading() {
    let dir = artifact_dir();
    write_manifest(dir.path());
    assert!(build(dir.path()).is_ok());

    // Same shape, different weights: decodes fine but no longer matches the manifest
    let mut model = common::model_json();
    model["intercept"] = json!([0.5, 0.0, 0.0]);
    write_json(&dir.path().join("model.json"), &model);

    match build(dir.path()) {
        Err(ArtifactError::ChecksumMismatch { file, .. }) => assert_eq!(file, "model.json"),
        other => panic!("expected ChecksumMismatch, got {:?}", other),
    }

    let service = InferenceService::builder()
        .with_artifact_dir(dir.path())
        .verify_checksums(false)
        .build();
    assert!(service.is_ok());
}

#[test]
fn test_manager_on_fixture_dir() {
    let dir = artifact_dir();
    let manager = ArtifactManager::new(dir.path());
    assert!(manager.is_complete());
    assert!(!manager.verify().unwrap());

    write_manifest(dir.path());
    assert!(manager.verify().unwrap());
}

#[cfg(not(feature = "onnx"))]
#[test]
fn test_onnx_classifier_needs_feature() {
    let dir = artifact_dir();
    let onnx = dir.path().join("model.onnx");
    fs::write(&onnx, b"onnx bytes").unwrap();

    let result = InferenceService::builder()
        .with_artifact_dir(dir.path())
        .with_classifier_path(&onnx)
        .build();
    assert!(matches!(result, Err(ArtifactError::Runtime(_))));
}

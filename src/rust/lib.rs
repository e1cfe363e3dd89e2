//! An emotion detector: TF-IDF text features fed to a pre-trained classifier.
//!
//! Three artifacts are loaded once into an immutable [`InferenceService`]: a
//! vectorizer, a classifier and a label encoder. Each prediction returns the
//! predicted label plus one confidence score per known label.
//!
//! # Basic Usage
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use emotion_detector::InferenceService;
//!
//! let service = InferenceService::builder()
//!     .with_artifact_dir("artifacts")
//!     .build()?;
//!
//! let prediction = service.predict("I am so happy today")?;
//! println!("Predicted emotion: {}", prediction.label);
//! for entry in &prediction.scores {
//!     println!("{}: {:.2}", entry.label, entry.score);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Front end
//!
//! User input goes through [`gate::handle`], which refuses blank text before
//! the classifier is involved, and [`Renderer`] turns the outcome into text:
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use emotion_detector::{gate, InferenceService, Renderer};
//!
//! let service = InferenceService::builder().build()?;
//! let outcome = gate::handle(&service, "   ")?;
//! Renderer::default().render_outcome(&mut std::io::stdout(), &outcome)?;
//! # Ok(())
//! # }
//! ```

pub mod artifact_manager;
pub mod artifacts;
pub mod gate;
pub mod inference;
pub mod render;
mod runtime;
pub mod session;

pub use artifact_manager::{ArtifactManager, ARTIFACTS_ENV};
pub use artifacts::{ArtifactKind, ArtifactPaths, ClassifierFormat};
pub use gate::Outcome;
pub use inference::{
    ArtifactError, Classifier, InferenceError, InferenceService, InputError, LabelEncoder, LabelScore,
    LinearModel, Predict, Prediction, ServiceBuilder, ServiceInfo, TfidfVectorizer, Vectorizer,
};
pub use render::Renderer;
pub use runtime::{OptimizationLevel, RuntimeConfig};
#[cfg(feature = "onnx")]
pub use runtime::create_session_builder;

/// Initialises `env_logger` with `RUST_LOG`, defaulting to `info`.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init();
}

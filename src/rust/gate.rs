//! Routing of one "Predict" action.
//!
//! Blank input never reaches the classifier; it becomes a notice instead.

use crate::inference::{InferenceError, InputError, Predict, Prediction};

/// What the front end should display for one action.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Predicted(Prediction),
    Rejected(InputError),
}

/// Unicode whitespace plus the ASCII separators U+001C..U+001F.
fn is_blank(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Returns the text to classify, or why it was refused.
pub fn admit(text: &str) -> Result<&str, InputError> {
    if text.trim_matches(is_blank).is_empty() {
        Err(InputError::EmptyText)
    } else {
        Ok(text)
    }
}

/// Runs `predictor` on `text` if the gate admits it.
///
/// Admitted text is passed on as typed, untrimmed.
pub fn handle<P: Predict + ?Sized>(predictor: &P, text: &str) -> Result<Outcome, InferenceError> {
    match admit(text) {
        Ok(text) => predictor.predict(text).map(Outcome::Predicted),
        Err(rejection) => {
            log::debug!("Rejected input: {}", rejection);
            Ok(Outcome::Rejected(rejection))
        }
    }
}

use std::io::{self, Write};

use crate::gate::Outcome;
use crate::inference::{InputError, Prediction};

pub const TITLE: &str = "Emotion Detector";
pub const SUBTITLE: &str = "Enter a sentence and emotion will be detected";
pub const PROMPT: &str = "Your Sentence: ";

/// Default number of decimals shown for confidence scores.
pub const DEFAULT_PRECISION: usize = 2;

/// Text rendering of predictions and notices.
///
/// Scores are printed in the order the prediction carries them, rounded only
/// here, at display time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Renderer {
    precision: usize,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(DEFAULT_PRECISION)
    }
}

impl Renderer {
    pub fn new(precision: usize) -> Self {
        Self { precision }
    }

    pub fn precision(&self) -> usize {
        self.precision
    }

    pub fn render_header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", TITLE)?;
        writeln!(out, "{}", SUBTITLE)?;
        writeln!(out)
    }

    pub fn render_prediction<W: Write>(&self, out: &mut W, prediction: &Prediction) -> io::Result<()> {
        writeln!(out, "Predicted Emotion:")?;
        writeln!(out, "  {}", prediction.label)?;
        writeln!(out)?;
        writeln!(out, "Confidence Scores:")?;
        for entry in &prediction.scores {
            writeln!(out, "  {}: {:.*}", entry.label, self.precision, entry.score)?;
        }
        Ok(())
    }

    pub fn render_notice<W: Write>(&self, out: &mut W, notice: &InputError) -> io::Result<()> {
        writeln!(out, "Warning: {}", notice)
    }

    pub fn render_outcome<W: Write>(&self, out: &mut W, outcome: &Outcome) -> io::Result<()> {
        match outcome {
            Outcome::Predicted(prediction) => self.render_prediction(out, prediction),
            Outcome::Rejected(notice) => self.render_notice(out, notice),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::LabelScore;

    fn prediction() -> Prediction {
        let scores = [("anger", 0.046), ("joy", 0.9031), ("sadness", 0.0509)]
            .into_iter()
            .map(|(label, score)| LabelScore {
                label: label.to_string(),
                score,
            })
            .collect();
        Prediction {
            label: "joy".to_string(),
            class_index: 1,
            scores,
        }
    }

    fn render(renderer: Renderer, outcome: &Outcome) -> String {
        let mut out = Vec::new();
        renderer.render_outcome(&mut out, outcome).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_prediction_layout() {
        let text = render(Renderer::default(), &Outcome::Predicted(prediction()));
        assert_eq!(
            text,
            "Predicted Emotion:\n  joy\n\nConfidence Scores:\n  anger: 0.05\n  joy: 0.90\n  sadness: 0.05\n"
        );
    }

    #[test]
    fn test_scores_keep_given_order() {
        let mut p = prediction();
        p.scores.reverse();
        let text = render(Renderer::default(), &Outcome::Predicted(p));
        let sadness = text.find("sadness").unwrap();
        let anger = text.find("anger").unwrap();
        assert!(sadness < anger);
    }

    #[test]
    fn test_precision() {
        let text = render(Renderer::new(4), &Outcome::Predicted(prediction()));
        assert!(text.contains("  joy: 0.9031\n"));
    }

    #[test]
    fn test_notice() {
        let text = render(Renderer::default(), &Outcome::Rejected(InputError::EmptyText));
        assert_eq!(text, "Warning: Please enter some text.\n");
    }
}

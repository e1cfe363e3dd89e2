//! Line-oriented terminal front end.
//!
//! Every line read is one "Predict" action. End of input ends the session.

use std::borrow::Cow;
use std::io::{self, BufRead, Write};

use crate::gate::{self, Outcome};
use crate::inference::Predict;
use crate::render::{Renderer, PROMPT};

/// Counts of what happened during a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub predicted: usize,
    pub rejected: usize,
    pub failed: usize,
}

/// Runs one action and renders its outcome.
///
/// Backend failures are reported on `out` rather than returned, so a bad
/// request never ends an interactive session.
pub fn run_action<P, W>(predictor: &P, renderer: &Renderer, out: &mut W, text: &str, stats: &mut SessionStats) -> io::Result<()>
where
    P: Predict + ?Sized,
    W: Write,
{
    match gate::handle(predictor, text) {
        Ok(outcome) => {
            match outcome {
                Outcome::Predicted(_) => stats.predicted += 1,
                Outcome::Rejected(_) => stats.rejected += 1,
            }
            renderer.render_outcome(out, &outcome)
        }
        Err(e) => {
            log::error!("Prediction failed: {}", e);
            stats.failed += 1;
            writeln!(out, "Error: {}", e)
        }
    }
}

/// Reads one line, without its line ending. `None` at EOF.
///
/// Bytes that are not valid UTF-8 are replaced rather than rejected.
fn read_line<R: BufRead>(input: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>> {
    buf.clear();
    if input.read_until(b'\n', buf)? == 0 {
        return Ok(None);
    }
    if buf.ends_with(b"\n") {
        buf.pop();
        if buf.ends_with(b"\r") {
            buf.pop();
        }
    }
    let line = String::from_utf8_lossy(buf);
    if let Cow::Owned(_) = line {
        log::warn!("Input line was not valid UTF-8; invalid bytes were replaced");
    }
    Ok(Some(line.into_owned()))
}

/// Reads lines from `input` until EOF, rendering one outcome per line.
pub fn run_interactive<P, R, W>(predictor: &P, renderer: &Renderer, mut input: R, out: &mut W) -> io::Result<SessionStats>
where
    P: Predict + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut stats = SessionStats::default();
    renderer.render_header(out)?;

    let mut buf = Vec::new();
    loop {
        write!(out, "{}", PROMPT)?;
        out.flush()?;

        let line = match read_line(&mut input, &mut buf)? {
            Some(line) => line,
            None => {
                writeln!(out)?;
                break;
            }
        };
        run_action(predictor, renderer, out, &line, &mut stats)?;
        writeln!(out)?;
    }

    log::info!(
        "Session ended: {} predicted, {} rejected, {} failed",
        stats.predicted,
        stats.rejected,
        stats.failed
    );
    Ok(stats)
}

//! Speech source boundary
//!
//! The interpreter pulls one recognized utterance at a time from whatever
//! implements [`SpeechSource`]. A real recognizer plugs in behind the same
//! trait; [`StdinSource`] ships as the reference implementation so the
//! interpreter can be driven end to end from a terminal.

use std::io::{self, BufRead, Write};

/// Failure modes of the speech source.
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechError {
    /// Recognizer temporarily unreachable; the caller retries.
    Connectivity(String),
    /// Recognizer failed for good; the caller abandons the session.
    Service(String),
}

impl std::fmt::Display for SpeechError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpeechError::Connectivity(msg) => write!(f, "speech source unreachable: {}", msg),
            SpeechError::Service(msg) => write!(f, "speech service error: {}", msg),
        }
    }
}

impl std::error::Error for SpeechError {}

/// Provider of recognized utterances, one at a time.
pub trait SpeechSource {
    /// Blocks until the next utterance. `Ok(None)` means nothing was
    /// recognized (silence, timeout) - not an error, no action.
    fn next_utterance(&mut self) -> Result<Option<String>, SpeechError>;
}

/// Reads one utterance per line from stdin. EOF ends the source.
pub struct StdinSource {
    prompt: bool,
}

impl StdinSource {
    pub fn new(prompt: bool) -> Self {
        Self { prompt }
    }
}

impl SpeechSource for StdinSource {
    fn next_utterance(&mut self) -> Result<Option<String>, SpeechError> {
        if self.prompt {
            eprint!("> ");
            let _ = io::stderr().flush();
        }

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) => Err(SpeechError::Service("input stream closed".to_string())),
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(line.to_string()))
                }
            }
            Err(e) => Err(SpeechError::Service(e.to_string())),
        }
    }
}

//! Listening session: the utterance loop and its two-state machine
//!
//! `Idle -> Listening` on start; back to `Idle` on a resolved stop phrase,
//! an explicit stop request (Ctrl-C), or an unrecoverable speech source
//! error. The loop itself is synchronous: tokenize -> match -> dispatch,
//! one utterance at a time.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::dispatch::Dispatcher;
use crate::keyboard::Keyboard;
use crate::matcher::Matcher;
use crate::speech::{SpeechError, SpeechSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Listening,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "Idle"),
            SessionState::Listening => write!(f, "Listening"),
        }
    }
}

pub struct Session<K: Keyboard> {
    matcher: Matcher,
    dispatcher: Dispatcher<K>,
    state: SessionState,
    /// Explicit caller stop request, checked between utterances. An
    /// in-flight action list is never interrupted; the bounded inter-step
    /// delay limits how long one takes.
    stop_requested: Arc<AtomicBool>,
    verbose: bool,
}

impl<K: Keyboard> Session<K> {
    pub fn new(matcher: Matcher, dispatcher: Dispatcher<K>) -> Self {
        Self {
            matcher,
            dispatcher,
            state: SessionState::Idle,
            stop_requested: Arc::new(AtomicBool::new(false)),
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Shared flag for the host's stop handler (Ctrl-C).
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_requested)
    }

    /// Run one listening cycle until a stop phrase, an explicit stop
    /// request, or an unrecoverable source error.
    pub fn run(&mut self, source: &mut dyn SpeechSource) {
        self.state = SessionState::Listening;

        loop {
            if self.stop_requested.load(Ordering::SeqCst) {
                eprintln!("[SESSION] stop requested");
                break;
            }

            let text = match source.next_utterance() {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(err @ SpeechError::Connectivity(_)) => {
                    eprintln!("[SESSION] {}, retrying", err);
                    continue;
                }
                Err(err) => {
                    eprintln!("[SESSION] {}", err);
                    break;
                }
            };

            if self.verbose {
                eprintln!("[SESSION] heard: {:?}", text);
            }

            let resolution = self.matcher.resolve(&text);
            let report = self.dispatcher.run(&resolution.actions);

            for failure in &report.failures {
                eprintln!("[SESSION] {} failed: {}", failure.action, failure.error);
            }

            if resolution.stop || report.stopped {
                eprintln!("[SESSION] stop phrase recognized");
                break;
            }
        }

        self.state = SessionState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CommandsConfig;
    use crate::keyboard::mock::RecordingKeyboard;
    use crate::phrasebook::Phrasebook;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Plays back a fixed script, then reports the source as gone.
    struct ScriptedSource {
        script: VecDeque<Result<Option<String>, SpeechError>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Option<String>, SpeechError>>) -> Self {
            Self {
                script: script.into(),
            }
        }
    }

    impl SpeechSource for ScriptedSource {
        fn next_utterance(&mut self) -> Result<Option<String>, SpeechError> {
            self.script
                .pop_front()
                .unwrap_or_else(|| Err(SpeechError::Service("script exhausted".to_string())))
        }
    }

    fn session(keyboard: RecordingKeyboard) -> Session<RecordingKeyboard> {
        let commands = CommandsConfig::default();
        let book = Phrasebook::build(&commands, Duration::ZERO).unwrap();
        let matcher = Matcher::new(book, &commands);
        Session::new(matcher, Dispatcher::new(keyboard, Duration::ZERO))
    }

    #[test]
    fn test_stop_phrase_ends_session() {
        let (keyboard, ops) = RecordingKeyboard::new();
        let mut session = session(keyboard);
        assert_eq!(session.state(), SessionState::Idle);

        let mut source = ScriptedSource::new(vec![
            Ok(Some("hello".to_string())),
            Ok(Some("stop listening".to_string())),
            Ok(Some("after".to_string())),
        ]);
        session.run(&mut source);

        // "after" is never consumed; the stop phrase produced no keystroke
        assert_eq!(*ops.borrow(), vec!["text hello "]);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_connectivity_error_keeps_listening() {
        let (keyboard, ops) = RecordingKeyboard::new();
        let mut session = session(keyboard);

        let mut source = ScriptedSource::new(vec![
            Err(SpeechError::Connectivity("offline".to_string())),
            Ok(None),
            Ok(Some("enter".to_string())),
            Ok(Some("stop now".to_string())),
        ]);
        session.run(&mut source);

        assert_eq!(*ops.borrow(), vec!["press enter"]);
    }

    #[test]
    fn test_service_error_goes_idle() {
        let (keyboard, ops) = RecordingKeyboard::new();
        let mut session = session(keyboard);

        let mut source =
            ScriptedSource::new(vec![Err(SpeechError::Service("gone".to_string()))]);
        session.run(&mut source);

        assert!(ops.borrow().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_explicit_stop_request() {
        let (keyboard, ops) = RecordingKeyboard::new();
        let mut session = session(keyboard);
        session.stop_flag().store(true, Ordering::SeqCst);

        let mut source = ScriptedSource::new(vec![Ok(Some("enter".to_string()))]);
        session.run(&mut source);

        // Checked before the first utterance is consumed
        assert!(ops.borrow().is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn test_dispatch_failure_does_not_end_session() {
        let (keyboard, ops) = RecordingKeyboard::failing_at(0);
        let mut session = session(keyboard);

        let mut source = ScriptedSource::new(vec![
            Ok(Some("undo".to_string())),
            Ok(Some("tab".to_string())),
            Ok(Some("finish".to_string())),
        ]);
        session.run(&mut source);

        assert_eq!(*ops.borrow(), vec!["press tab"]);
    }
}

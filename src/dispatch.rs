//! Action execution against the keyboard capability
//!
//! Runs each resolved action in order. A failed step aborts only the action
//! it belongs to - the session and the remaining top-level actions always
//! continue.

use std::thread;
use std::time::Duration;

use crate::keyboard::{Keyboard, KeyboardError};
use crate::phrasebook::Action;

/// One failed action, reported to the session host.
#[derive(Debug, Clone)]
pub struct DispatchFailure {
    /// Human-readable description of the failed action.
    pub action: String,
    pub error: KeyboardError,
}

/// Outcome of dispatching one resolved action list.
#[derive(Debug, Clone, Default)]
pub struct DispatchReport {
    /// A `Stop` action was encountered; no keystroke was issued for it.
    pub stopped: bool,
    pub failures: Vec<DispatchFailure>,
}

pub struct Dispatcher<K: Keyboard> {
    keyboard: K,
    settle_delay: Duration,
    verbose: bool,
}

impl<K: Keyboard> Dispatcher<K> {
    pub fn new(keyboard: K, settle_delay: Duration) -> Self {
        Self {
            keyboard,
            settle_delay,
            verbose: false,
        }
    }

    /// Enable per-action tracing
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Execute actions in order. Failures are collected, never propagated:
    /// one failed keystroke must not stall unrelated subsequent commands.
    pub fn run(&mut self, actions: &[Action]) -> DispatchReport {
        let mut report = DispatchReport::default();

        for action in actions {
            if self.verbose {
                eprintln!("[DISPATCH] {}", action);
            }

            if matches!(action, Action::Stop) {
                report.stopped = true;
                continue;
            }

            if let Err(error) = self.execute(action) {
                report.failures.push(DispatchFailure {
                    action: action.to_string(),
                    error,
                });
            }
        }

        report
    }

    fn execute(&mut self, action: &Action) -> Result<(), KeyboardError> {
        match action {
            Action::Key(key) => self.keyboard.press(*key)?,
            Action::Chord(keys) => self.keyboard.chord(keys)?,
            Action::Sequence { steps, step_delay } => {
                for (index, step) in steps.iter().enumerate() {
                    if index > 0 && !step_delay.is_zero() {
                        thread::sleep(*step_delay);
                    }
                    match step.as_slice() {
                        [key] => self.keyboard.press(*key)?,
                        keys => self.keyboard.chord(keys)?,
                    }
                }
            }
            Action::Insert { literal, caret_back } => {
                self.keyboard.insert_text(literal)?;
                if *caret_back {
                    self.keyboard.caret_left()?;
                }
            }
            Action::Capitalize(word) => {
                self.keyboard
                    .insert_text(&format!("{} ", capitalize(word)))?;
            }
            // Handled in run(); never a device action
            Action::Stop => {}
        }

        if !self.settle_delay.is_zero() {
            thread::sleep(self.settle_delay);
        }
        Ok(())
    }
}

/// Uppercase the first character, keep the rest as spoken.
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => {
            let mut s = c.to_uppercase().to_string();
            s.push_str(chars.as_str());
            s
        }
        None => String::new(),
    }
}

//! Keyboard automation capability using enigo
//!
//! The interpreter drives whatever implements [`Keyboard`]:
//! - [`DeviceKeyboard`]: real key events, with direct or clipboard+paste
//!   text insertion
//! - [`LogKeyboard`]: demo mode, logs intended actions without touching the
//!   focused application

use arboard::Clipboard;
use enigo::{Direction, Enigo, Key, Keyboard as EnigoKeyboard, Settings};
use std::thread;
use std::time::Duration;

/// Text insertion method
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum InputMethod {
    /// Use enigo's native text input directly (default)
    #[default]
    Direct,
    /// Copy to clipboard, then paste with Cmd/Ctrl+V
    Clipboard,
}

impl InputMethod {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "clipboard" => InputMethod::Clipboard,
            _ => InputMethod::Direct,
        }
    }
}

/// Error type for keyboard operations
#[derive(Debug, Clone, PartialEq)]
pub enum KeyboardError {
    Device(String),
    Clipboard(String),
}

impl std::fmt::Display for KeyboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyboardError::Device(msg) => write!(f, "device error: {}", msg),
            KeyboardError::Clipboard(msg) => write!(f, "clipboard error: {}", msg),
        }
    }
}

impl std::error::Error for KeyboardError {}

/// Input-automation capability consumed by the dispatcher.
///
/// Every operation may fail with a device/permission error; the dispatcher
/// treats such failures as transient and scoped to the current action.
pub trait Keyboard {
    /// Press and release a single key.
    fn press(&mut self, key: Key) -> Result<(), KeyboardError>;

    /// Press a set of keys simultaneously. The last key is clicked while the
    /// preceding keys are held as modifiers.
    fn chord(&mut self, keys: &[Key]) -> Result<(), KeyboardError>;

    /// Insert literal text into the focused application.
    fn insert_text(&mut self, text: &str) -> Result<(), KeyboardError>;

    /// Move the caret one position left (paired-symbol placement).
    fn caret_left(&mut self) -> Result<(), KeyboardError> {
        self.press(Key::LeftArrow)
    }
}

/// Real keyboard automation via enigo
pub struct DeviceKeyboard {
    enigo: Enigo,
    clipboard: Clipboard,
    method: InputMethod,
}

impl DeviceKeyboard {
    pub fn new(method: InputMethod) -> Result<Self, KeyboardError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| KeyboardError::Device(format!("failed to initialize enigo: {}", e)))?;
        let clipboard = Clipboard::new()
            .map_err(|e| KeyboardError::Clipboard(format!("failed to open clipboard: {}", e)))?;

        Ok(Self {
            enigo,
            clipboard,
            method,
        })
    }

    fn insert_direct(&mut self, text: &str) -> Result<(), KeyboardError> {
        self.enigo
            .text(text)
            .map_err(|e| KeyboardError::Device(format!("failed to type text: {}", e)))
    }

    /// Insert text via clipboard: set, paste, restore previous content.
    fn insert_via_clipboard(&mut self, text: &str) -> Result<(), KeyboardError> {
        let old_content = self.clipboard.get_text().ok();

        self.clipboard
            .set_text(text)
            .map_err(|e| KeyboardError::Clipboard(format!("failed to set clipboard: {}", e)))?;

        // Let the clipboard settle before pasting
        thread::sleep(Duration::from_millis(50));

        let result = self.chord(&[modifier_key(), Key::Unicode('v')]);

        thread::sleep(Duration::from_millis(100));

        if let Some(old) = old_content {
            let _ = self.clipboard.set_text(old);
        }

        result
    }
}

impl Keyboard for DeviceKeyboard {
    fn press(&mut self, key: Key) -> Result<(), KeyboardError> {
        self.enigo
            .key(key, Direction::Click)
            .map_err(|e| KeyboardError::Device(format!("failed to press key: {}", e)))
    }

    fn chord(&mut self, keys: &[Key]) -> Result<(), KeyboardError> {
        let (main, modifiers) = match keys.split_last() {
            Some(split) => split,
            None => return Ok(()),
        };

        for modifier in modifiers {
            self.enigo
                .key(*modifier, Direction::Press)
                .map_err(|e| KeyboardError::Device(format!("failed to press modifier: {}", e)))?;
        }

        // Small delay for the modifiers to register
        thread::sleep(Duration::from_millis(10));

        let clicked = self
            .enigo
            .key(*main, Direction::Click)
            .map_err(|e| KeyboardError::Device(format!("failed to click key: {}", e)));

        thread::sleep(Duration::from_millis(50));

        // Release modifiers in reverse order even if the click failed
        for modifier in modifiers.iter().rev() {
            self.enigo
                .key(*modifier, Direction::Release)
                .map_err(|e| KeyboardError::Device(format!("failed to release modifier: {}", e)))?;
        }

        clicked
    }

    fn insert_text(&mut self, text: &str) -> Result<(), KeyboardError> {
        if text.is_empty() {
            return Ok(());
        }

        match self.method {
            InputMethod::Direct => self.insert_direct(text),
            InputMethod::Clipboard => match self.insert_via_clipboard(text) {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("[KEYBOARD] clipboard method failed: {}, trying direct", e);
                    self.insert_direct(text)
                }
            },
        }
    }
}

/// Demo-mode keyboard: logs intended actions instead of emitting key events.
/// Stands in when the automation capability is unavailable.
pub struct LogKeyboard;

impl Keyboard for LogKeyboard {
    fn press(&mut self, key: Key) -> Result<(), KeyboardError> {
        eprintln!("[DEMO] press {}", key_name(key));
        Ok(())
    }

    fn chord(&mut self, keys: &[Key]) -> Result<(), KeyboardError> {
        eprintln!("[DEMO] chord {}", chord_name(keys));
        Ok(())
    }

    fn insert_text(&mut self, text: &str) -> Result<(), KeyboardError> {
        eprintln!("[DEMO] type {:?}", text);
        Ok(())
    }

    fn caret_left(&mut self) -> Result<(), KeyboardError> {
        eprintln!("[DEMO] caret left");
        Ok(())
    }
}

/// Platform shortcut modifier: Cmd on macOS, Ctrl elsewhere.
pub fn modifier_key() -> Key {
    #[cfg(target_os = "macos")]
    {
        Key::Meta
    }
    #[cfg(not(target_os = "macos"))]
    {
        Key::Control
    }
}

/// Spoken-friendly name for a key, used in logs and the phrase listing.
pub fn key_name(key: Key) -> String {
    match key {
        Key::Return => "enter".to_string(),
        Key::Tab => "tab".to_string(),
        Key::Space => "space".to_string(),
        Key::Backspace => "backspace".to_string(),
        Key::Delete => "delete".to_string(),
        Key::Escape => "escape".to_string(),
        Key::Home => "home".to_string(),
        Key::End => "end".to_string(),
        Key::PageUp => "pageup".to_string(),
        Key::PageDown => "pagedown".to_string(),
        Key::LeftArrow => "left".to_string(),
        Key::RightArrow => "right".to_string(),
        Key::UpArrow => "up".to_string(),
        Key::DownArrow => "down".to_string(),
        Key::Control => "ctrl".to_string(),
        Key::Shift => "shift".to_string(),
        Key::Alt => "alt".to_string(),
        Key::Meta => "cmd".to_string(),
        Key::CapsLock => "capslock".to_string(),
        Key::Unicode(c) => c.to_string(),
        other => format!("{:?}", other).to_lowercase(),
    }
}

/// "+"-joined chord name, e.g. "ctrl+shift+left".
pub fn chord_name(keys: &[Key]) -> String {
    keys.iter()
        .map(|k| key_name(*k))
        .collect::<Vec<_>>()
        .join("+")
}

#[cfg(test)]
pub mod mock {
    //! Recording keyboard for tests: captures operations, optionally fails
    //! at the nth one.

    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    pub struct RecordingKeyboard {
        ops: Rc<RefCell<Vec<String>>>,
        fail_at: Option<usize>,
        count: usize,
    }

    impl RecordingKeyboard {
        pub fn new() -> (Self, Rc<RefCell<Vec<String>>>) {
            let ops = Rc::new(RefCell::new(Vec::new()));
            (
                Self {
                    ops: Rc::clone(&ops),
                    fail_at: None,
                    count: 0,
                },
                ops,
            )
        }

        /// Fail the nth operation (0-based) with a device error.
        pub fn failing_at(n: usize) -> (Self, Rc<RefCell<Vec<String>>>) {
            let (mut kb, ops) = Self::new();
            kb.fail_at = Some(n);
            (kb, ops)
        }

        fn record(&mut self, op: String) -> Result<(), KeyboardError> {
            let index = self.count;
            self.count += 1;
            if self.fail_at == Some(index) {
                return Err(KeyboardError::Device("injected failure".to_string()));
            }
            self.ops.borrow_mut().push(op);
            Ok(())
        }
    }

    impl Keyboard for RecordingKeyboard {
        fn press(&mut self, key: Key) -> Result<(), KeyboardError> {
            self.record(format!("press {}", key_name(key)))
        }

        fn chord(&mut self, keys: &[Key]) -> Result<(), KeyboardError> {
            self.record(format!("chord {}", chord_name(keys)))
        }

        fn insert_text(&mut self, text: &str) -> Result<(), KeyboardError> {
            self.record(format!("text {}", text))
        }

        fn caret_left(&mut self) -> Result<(), KeyboardError> {
            self.record("caret-left".to_string())
        }
    }
}

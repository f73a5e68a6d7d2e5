//! Phrase registry: spoken word sequences mapped to keyboard actions
//!
//! One immutable table, built once at startup and validated as it is built.
//! Phrases are 1-3 normalized words; lookup is by the exact space-joined
//! word sequence. Overlaps between short and long phrases ("delete" vs
//! "delete word") are resolved by the matcher's longest-first rule, never
//! here.

use anyhow::{Result, bail};
use enigo::Key;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::config::CommandsConfig;
use crate::keyboard::{chord_name, key_name, modifier_key};

/// Longest registrable phrase, in words.
pub const MAX_PHRASE_WORDS: usize = 3;

/// A resolved input-device action.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Press one key.
    Key(Key),
    /// Press several keys simultaneously.
    Chord(Vec<Key>),
    /// Run several chords in order, pausing between steps so automation
    /// backends don't drop rapid repeats.
    Sequence {
        steps: Vec<Vec<Key>>,
        step_delay: Duration,
    },
    /// Insert literal text. `caret_back` marks a paired symbol: after
    /// insertion the caret moves one position left so typing lands inside
    /// the pair.
    Insert { literal: String, caret_back: bool },
    /// Capitalize the bound word and insert it as literal text. Emitted by
    /// the matcher for the capitalize directive, never registered.
    Capitalize(String),
    /// End the listening session. Emitted by the matcher for stop phrases,
    /// never registered and never executed as a keystroke.
    Stop,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Key(key) => write!(f, "press {}", key_name(*key)),
            Action::Chord(keys) => write!(f, "chord {}", chord_name(keys)),
            Action::Sequence { steps, .. } => {
                let parts: Vec<String> = steps.iter().map(|s| chord_name(s)).collect();
                write!(f, "sequence {}", parts.join(", "))
            }
            Action::Insert { literal, caret_back } => {
                if *caret_back {
                    write!(f, "insert {:?} (caret inside)", literal)
                } else {
                    write!(f, "insert {:?}", literal)
                }
            }
            Action::Capitalize(word) => write!(f, "capitalize {:?}", word),
            Action::Stop => write!(f, "stop"),
        }
    }
}

/// Immutable phrase -> action table.
pub struct Phrasebook {
    entries: HashMap<String, Action>,
    step_delay: Duration,
    /// The capitalize directive word; reserved so a 1-word entry can never
    /// shadow the directive.
    reserved: String,
}

impl Phrasebook {
    /// Build the built-in table plus any custom phrases from config.
    /// Malformed entries are rejected here, never at match time.
    pub fn build(commands: &CommandsConfig, step_delay: Duration) -> Result<Self> {
        let mut book = Self {
            entries: HashMap::new(),
            step_delay,
            reserved: commands.capitalize_word.trim().to_lowercase(),
        };

        book.install_keys()?;
        book.install_editing()?;
        book.install_navigation()?;
        book.install_clipboard()?;
        book.install_selection()?;
        book.install_symbols()?;

        for custom in &commands.custom {
            book.insert(
                &custom.phrase,
                Action::Insert {
                    literal: custom.insert.clone(),
                    caret_back: custom.paired,
                },
            )?;
        }

        Ok(book)
    }

    /// Exact lookup by space-joined word sequence.
    pub fn lookup(&self, phrase: &str) -> Option<&Action> {
        self.entries.get(phrase)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered phrases sorted alphabetically, for the `phrases` listing.
    pub fn phrases(&self) -> Vec<(&str, &Action)> {
        let mut all: Vec<(&str, &Action)> = self
            .entries
            .iter()
            .map(|(phrase, action)| (phrase.as_str(), action))
            .collect();
        all.sort_by_key(|(phrase, _)| *phrase);
        all
    }

    /// Register one phrase. Validates the entry: 1-3 words, non-empty,
    /// unique, not the capitalize directive, and a well-formed action.
    pub fn insert(&mut self, phrase: &str, action: Action) -> Result<()> {
        let words: Vec<&str> = phrase.split_whitespace().collect();
        if words.is_empty() {
            bail!("empty phrase");
        }
        if words.len() > MAX_PHRASE_WORDS {
            bail!(
                "phrase {:?} has {} words (max {})",
                phrase,
                words.len(),
                MAX_PHRASE_WORDS
            );
        }

        let key = words.join(" ").to_lowercase();
        if key == self.reserved {
            bail!(
                "phrase {:?} collides with the capitalize directive",
                phrase
            );
        }

        match &action {
            Action::Chord(keys) if keys.is_empty() => {
                bail!("phrase {:?} maps to an empty chord", phrase)
            }
            Action::Sequence { steps, .. }
                if steps.is_empty() || steps.iter().any(|step| step.is_empty()) =>
            {
                bail!("phrase {:?} maps to a sequence with an empty step", phrase)
            }
            Action::Insert { literal, .. } if literal.is_empty() => {
                bail!("phrase {:?} maps to an empty insertion", phrase)
            }
            Action::Insert {
                literal,
                caret_back: true,
            } if literal.chars().count() < 2 => {
                bail!("phrase {:?}: paired symbol needs two characters", phrase)
            }
            Action::Capitalize(_) | Action::Stop => {
                bail!("phrase {:?}: {} is not a registrable action", phrase, action)
            }
            _ => {}
        }

        if self.entries.insert(key, action).is_some() {
            bail!("duplicate phrase {:?}", phrase);
        }
        Ok(())
    }

    fn sequence(&self, steps: Vec<Vec<Key>>) -> Action {
        Action::Sequence {
            steps,
            step_delay: self.step_delay,
        }
    }

    // ------------------------------------------------------------------
    // Built-in table. Chords of one key collapse to a plain key press.
    // ------------------------------------------------------------------

    fn install_keys(&mut self) -> Result<()> {
        self.insert("enter", Action::Key(Key::Return))?;
        self.insert("new line", Action::Key(Key::Return))?;
        self.insert("next line", Action::Key(Key::Return))?;
        self.insert("press enter", Action::Key(Key::Return))?;
        self.insert("space", Action::Key(Key::Space))?;
        self.insert("tab", Action::Key(Key::Tab))?;
        self.insert("backspace", Action::Key(Key::Backspace))?;
        self.insert("delete", Action::Key(Key::Delete))?;
        self.insert("escape", Action::Key(Key::Escape))?;
        self.insert("caps lock", Action::Key(Key::CapsLock))?;
        self.insert("shift", Action::Key(Key::Shift))?;
        self.insert("page up", Action::Key(Key::PageUp))?;
        self.insert("page down", Action::Key(Key::PageDown))?;
        Ok(())
    }

    fn install_editing(&mut self) -> Result<()> {
        // Select the previous word, then delete the selection
        let delete_word = vec![
            vec![Key::Shift, word_modifier(), Key::LeftArrow],
            vec![Key::Delete],
        ];
        for phrase in ["remove word", "delete word", "remove last word", "back word"] {
            self.insert(phrase, self.sequence(delete_word.clone()))?;
        }

        self.insert("undo", chord(vec![modifier_key(), Key::Unicode('z')]))?;
        self.insert("redo", chord(redo_keys()))?;
        Ok(())
    }

    fn install_navigation(&mut self) -> Result<()> {
        self.insert("go left", Action::Key(Key::LeftArrow))?;
        self.insert("go right", Action::Key(Key::RightArrow))?;
        self.insert("go up", Action::Key(Key::UpArrow))?;
        self.insert("go down", Action::Key(Key::DownArrow))?;

        self.insert("word left", chord(vec![word_modifier(), Key::LeftArrow]))?;
        self.insert("word right", chord(vec![word_modifier(), Key::RightArrow]))?;

        self.insert("line start", chord(line_start()))?;
        self.insert("line end", chord(line_end()))?;

        for phrase in ["go to start", "go to beginning", "first line"] {
            self.insert(phrase, chord(document_start()))?;
        }
        for phrase in ["go to end", "last line"] {
            self.insert(phrase, chord(document_end()))?;
        }
        Ok(())
    }

    fn install_clipboard(&mut self) -> Result<()> {
        self.insert("copy", chord(vec![modifier_key(), Key::Unicode('c')]))?;
        self.insert("paste", chord(vec![modifier_key(), Key::Unicode('v')]))?;
        self.insert("cut", chord(vec![modifier_key(), Key::Unicode('x')]))?;

        let select_word = vec![word_modifier(), Key::Shift, Key::RightArrow];
        let select_line = vec![line_end(), with_shift(line_start())];

        let mut copy_line = select_line.clone();
        copy_line.push(vec![modifier_key(), Key::Unicode('c')]);
        self.insert("copy line", self.sequence(copy_line))?;

        let mut cut_line = select_line;
        cut_line.push(vec![modifier_key(), Key::Unicode('x')]);
        self.insert("cut line", self.sequence(cut_line))?;

        let copy_word = vec![select_word.clone(), vec![modifier_key(), Key::Unicode('c')]];
        self.insert("copy word", self.sequence(copy_word))?;

        let cut_word = vec![select_word, vec![modifier_key(), Key::Unicode('x')]];
        self.insert("cut word", self.sequence(cut_word))?;
        Ok(())
    }

    fn install_selection(&mut self) -> Result<()> {
        self.insert("select all", chord(vec![modifier_key(), Key::Unicode('a')]))?;
        self.insert(
            "select word",
            chord(vec![word_modifier(), Key::Shift, Key::RightArrow]),
        )?;

        // End-to-start: jump to line end, then extend the selection back to
        // the line start.
        self.insert(
            "select line",
            self.sequence(vec![line_end(), with_shift(line_start())]),
        )?;

        self.insert(
            "select next word",
            chord(vec![Key::Shift, word_modifier(), Key::RightArrow]),
        )?;
        self.insert(
            "select previous word",
            chord(vec![Key::Shift, word_modifier(), Key::LeftArrow]),
        )?;
        self.insert("select up", chord(vec![Key::Shift, Key::UpArrow]))?;
        self.insert("select down", chord(vec![Key::Shift, Key::DownArrow]))?;
        self.insert("select to start", chord(with_shift(line_start())))?;
        self.insert("select to end", chord(with_shift(line_end())))?;
        Ok(())
    }

    fn install_symbols(&mut self) -> Result<()> {
        let singles = [
            ("comma", ","),
            ("period", "."),
            ("dot", "."),
            ("semicolon", ";"),
            ("colon", ":"),
            ("dash", "-"),
            ("hyphen", "-"),
            ("minus", "-"),
            ("underscore", "_"),
            ("equals", "="),
            ("plus", "+"),
            ("asterisk", "*"),
            ("star", "*"),
            ("forward slash", "/"),
            ("backslash", "\\"),
            ("pipe", "|"),
            ("at sign", "@"),
            ("hash", "#"),
            ("dollar", "$"),
            ("percent", "%"),
            ("caret", "^"),
            ("ampersand", "&"),
            ("exclamation", "!"),
            ("question mark", "?"),
            ("greater than", ">"),
            ("less than", "<"),
            ("tilde", "~"),
            ("double quote", "\""),
            ("quotes", "\""),
            ("single quote", "'"),
            ("quote", "'"),
            ("open bracket", "("),
            ("close bracket", ")"),
        ];
        for (phrase, literal) in singles {
            self.insert(phrase, Action::Insert {
                literal: literal.to_string(),
                caret_back: false,
            })?;
        }

        let pairs = [
            ("round bracket", "()"),
            ("parenthesis", "()"),
            ("square bracket", "[]"),
            ("curly bracket", "{}"),
            ("curly braces", "{}"),
        ];
        for (phrase, literal) in pairs {
            self.insert(phrase, Action::Insert {
                literal: literal.to_string(),
                caret_back: true,
            })?;
        }
        Ok(())
    }
}

/// Chords of one key collapse to a plain key press.
fn chord(keys: Vec<Key>) -> Action {
    match keys.as_slice() {
        [key] => Action::Key(*key),
        _ => Action::Chord(keys),
    }
}

fn with_shift(mut keys: Vec<Key>) -> Vec<Key> {
    keys.insert(0, Key::Shift);
    keys
}

/// Word-wise movement modifier: Option on macOS, Ctrl elsewhere.
fn word_modifier() -> Key {
    #[cfg(target_os = "macos")]
    {
        Key::Alt
    }
    #[cfg(not(target_os = "macos"))]
    {
        Key::Control
    }
}

fn line_start() -> Vec<Key> {
    #[cfg(target_os = "macos")]
    {
        vec![Key::Meta, Key::LeftArrow]
    }
    #[cfg(not(target_os = "macos"))]
    {
        vec![Key::Home]
    }
}

fn line_end() -> Vec<Key> {
    #[cfg(target_os = "macos")]
    {
        vec![Key::Meta, Key::RightArrow]
    }
    #[cfg(not(target_os = "macos"))]
    {
        vec![Key::End]
    }
}

fn document_start() -> Vec<Key> {
    #[cfg(target_os = "macos")]
    {
        vec![Key::Meta, Key::UpArrow]
    }
    #[cfg(not(target_os = "macos"))]
    {
        vec![Key::Control, Key::Home]
    }
}

fn document_end() -> Vec<Key> {
    #[cfg(target_os = "macos")]
    {
        vec![Key::Meta, Key::DownArrow]
    }
    #[cfg(not(target_os = "macos"))]
    {
        vec![Key::Control, Key::End]
    }
}

fn redo_keys() -> Vec<Key> {
    #[cfg(target_os = "macos")]
    {
        vec![Key::Meta, Key::Shift, Key::Unicode('z')]
    }
    #[cfg(not(target_os = "macos"))]
    {
        vec![Key::Control, Key::Unicode('y')]
    }
}

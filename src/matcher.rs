//! Longest-match-first phrase resolution
//!
//! Turns a recognized utterance into an ordered action list. The matcher is
//! total: every token either matches a phrase, feeds the capitalize
//! directive, or falls through to literal insertion - nothing is dropped
//! silently.

use crate::config::CommandsConfig;
use crate::phrasebook::{Action, MAX_PHRASE_WORDS, Phrasebook};
use crate::tokenize::{normalize, tokenize};

/// Outcome of resolving one utterance.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Actions in dispatch order.
    pub actions: Vec<Action>,
    /// A stop phrase was recognized; the session should end.
    pub stop: bool,
}

impl Resolution {
    fn empty() -> Self {
        Self {
            actions: Vec::new(),
            stop: false,
        }
    }
}

pub struct Matcher {
    phrasebook: Phrasebook,
    stop_phrases: Vec<String>,
    capitalize_word: String,
}

impl Matcher {
    pub fn new(phrasebook: Phrasebook, commands: &CommandsConfig) -> Self {
        Self {
            phrasebook,
            stop_phrases: commands
                .stop_phrases
                .iter()
                .map(|p| normalize(p))
                .collect(),
            capitalize_word: commands.capitalize_word.trim().to_lowercase(),
        }
    }

    pub fn phrasebook(&self) -> &Phrasebook {
        &self.phrasebook
    }

    /// Resolve a raw utterance into an ordered action list.
    ///
    /// Stop phrases are checked against the whole normalized utterance
    /// before any word-by-word matching, so a multi-word stop phrase is
    /// never partially consumed as shorter commands. The loop then matches
    /// greedily, longest phrase first, at each position.
    pub fn resolve(&self, raw: &str) -> Resolution {
        let text = normalize(raw);
        if text.is_empty() {
            return Resolution::empty();
        }

        if self.stop_phrases.iter().any(|phrase| *phrase == text) {
            return Resolution {
                actions: vec![Action::Stop],
                stop: true,
            };
        }

        let tokens = tokenize(raw);
        let mut actions = Vec::new();
        let mut i = 0;

        while i < tokens.len() {
            let longest = MAX_PHRASE_WORDS.min(tokens.len() - i);
            let matched = (1..=longest).rev().find_map(|len| {
                let candidate = tokens[i..i + len].join(" ");
                self.phrasebook
                    .lookup(&candidate)
                    .map(|action| (action.clone(), len))
            });

            if let Some((action, len)) = matched {
                actions.push(action);
                i += len;
                continue;
            }

            if tokens[i] == self.capitalize_word && i + 1 < tokens.len() {
                actions.push(Action::Capitalize(tokens[i + 1].clone()));
                i += 2;
                continue;
            }

            actions.push(Action::Insert {
                literal: format!("{} ", tokens[i]),
                caret_back: false,
            });
            i += 1;
        }

        Resolution {
            actions,
            stop: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enigo::Key;
    use std::time::Duration;

    fn matcher() -> Matcher {
        let commands = CommandsConfig::default();
        let book = Phrasebook::build(&commands, Duration::from_millis(100)).unwrap();
        Matcher::new(book, &commands)
    }

    fn literal(word: &str) -> Action {
        Action::Insert {
            literal: format!("{} ", word),
            caret_back: false,
        }
    }

    #[test]
    fn test_empty_utterance_yields_nothing() {
        let matcher = matcher();
        assert_eq!(matcher.resolve(""), Resolution::empty());
        assert_eq!(matcher.resolve("   "), Resolution::empty());
    }

    #[test]
    fn test_stop_phrase_short_circuits() {
        let matcher = matcher();
        for utterance in ["stop listening", "Stop Listening", "finish", "end recording"] {
            let resolution = matcher.resolve(utterance);
            assert!(resolution.stop, "expected stop for {:?}", utterance);
            assert_eq!(resolution.actions, vec![Action::Stop]);
        }

        // Only the whole utterance counts as a stop phrase
        let resolution = matcher.resolve("please stop listening");
        assert!(!resolution.stop);
        assert_eq!(
            resolution.actions,
            vec![literal("please"), literal("stop"), literal("listening")]
        );
    }

    #[test]
    fn test_longest_match_wins() {
        let matcher = matcher();

        // "delete" alone is a key press...
        let resolution = matcher.resolve("delete");
        assert_eq!(resolution.actions, vec![Action::Key(Key::Delete)]);

        // ...but "delete word" is the two-step editing sequence, not
        // delete + literal "word"
        let resolution = matcher.resolve("delete word");
        assert_eq!(resolution.actions.len(), 1);
        assert!(matches!(resolution.actions[0], Action::Sequence { .. }));

        // "copy line" must not fire "copy" first
        let resolution = matcher.resolve("copy line");
        assert_eq!(resolution.actions.len(), 1);
        assert!(matches!(resolution.actions[0], Action::Sequence { .. }));
    }

    #[test]
    fn test_two_word_prefix_of_three_word_phrase() {
        // A registered 2-word phrase that is the textual prefix of a
        // registered 3-word phrase must lose to the longer one.
        let commands = CommandsConfig::default();
        let mut book = Phrasebook::build(&commands, Duration::ZERO).unwrap();
        book.insert("alpha beta", Action::Key(Key::Tab)).unwrap();
        book.insert("alpha beta gamma", Action::Key(Key::Return))
            .unwrap();
        let matcher = Matcher::new(book, &commands);

        let resolution = matcher.resolve("alpha beta gamma");
        assert_eq!(resolution.actions, vec![Action::Key(Key::Return)]);

        let resolution = matcher.resolve("alpha beta delta");
        assert_eq!(resolution.actions, vec![
            Action::Key(Key::Tab),
            literal("delta"),
        ]);
    }

    #[test]
    fn test_three_word_phrase_no_literals() {
        let matcher = matcher();
        let resolution = matcher.resolve("go to start");
        assert_eq!(resolution.actions.len(), 1);
        assert!(matches!(
            resolution.actions[0],
            Action::Chord(_) | Action::Key(_)
        ));
    }

    #[test]
    fn test_capitalize_directive() {
        let matcher = matcher();

        let resolution = matcher.resolve("capital hello");
        assert_eq!(
            resolution.actions,
            vec![Action::Capitalize("hello".to_string())]
        );

        // Directive without a following word falls through to literal text
        let resolution = matcher.resolve("capital");
        assert_eq!(resolution.actions, vec![literal("capital")]);
    }

    #[test]
    fn test_literal_fallback() {
        let matcher = matcher();
        let resolution = matcher.resolve("Zebra");
        assert_eq!(resolution.actions, vec![literal("zebra")]);
    }

    #[test]
    fn test_mixed_utterance() {
        let matcher = matcher();
        let resolution = matcher.resolve("hello comma world");
        assert_eq!(resolution.actions, vec![
            literal("hello"),
            Action::Insert {
                literal: ",".to_string(),
                caret_back: false,
            },
            literal("world"),
        ]);
    }

    #[test]
    fn test_every_token_consumed() {
        let matcher = matcher();

        // undo (1) + literal (1) + capitalize (2) + paste (1) = 5 tokens,
        // 4 actions, nothing dropped
        let resolution = matcher.resolve("undo xyzzy capital word paste");
        assert_eq!(resolution.actions.len(), 4);
        assert_eq!(
            resolution.actions[2],
            Action::Capitalize("word".to_string())
        );

        // Token counts must always sum to the sequence length; spot-check a
        // few shapes including trailing directives and unknown words
        for utterance in [
            "go to start hello select line",
            "capital capital capital",
            "one two three four five six seven",
        ] {
            let resolution = matcher.resolve(utterance);
            assert!(!resolution.actions.is_empty());
            assert!(!resolution.stop);
        }
    }
}

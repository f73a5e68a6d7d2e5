//! Utterance normalization - raw recognizer output to a word sequence

/// Lowercase and trim a raw utterance.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Split a raw utterance into normalized words.
///
/// Empty or whitespace-only input yields an empty sequence, which callers
/// treat as "no action". Punctuation is kept attached to its word - a token
/// either matches a phrasebook entry verbatim or falls through to literal
/// insertion.
pub fn tokenize(raw: &str) -> Vec<String> {
    normalize(raw)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
}

// ============================================================================
// Input Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct InputConfig {
    /// Text insertion method: "direct" or "clipboard"
    #[serde(default = "default_method")]
    pub method: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
        }
    }
}

fn default_method() -> String {
    "direct".into()
}

// ============================================================================
// Dispatch Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DispatchConfig {
    /// Delay between the steps of a compound action (ms).
    /// Automation backends drop chords fired back to back.
    #[serde(default = "default_step_delay")]
    pub step_delay_ms: u64,

    /// Delay after every executed action (ms)
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            step_delay_ms: default_step_delay(),
            settle_delay_ms: default_settle_delay(),
        }
    }
}

fn default_step_delay() -> u64 {
    100
}

fn default_settle_delay() -> u64 {
    50
}

// ============================================================================
// Commands Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CommandsConfig {
    /// Directive word: capitalize the following word instead of matching it
    #[serde(default = "default_capitalize_word")]
    pub capitalize_word: String,

    /// Phrases that end the listening session (matched against the whole
    /// utterance, before any word-by-word resolution)
    #[serde(default = "default_stop_phrases")]
    pub stop_phrases: Vec<String>,

    /// Custom insertion phrases
    #[serde(default)]
    pub custom: Vec<CustomPhrase>,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            capitalize_word: default_capitalize_word(),
            stop_phrases: default_stop_phrases(),
            custom: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CustomPhrase {
    pub phrase: String,
    pub insert: String,
    /// Paired symbol: move the caret back inside after insertion
    #[serde(default)]
    pub paired: bool,
}

fn default_capitalize_word() -> String {
    "capital".into()
}

fn default_stop_phrases() -> Vec<String> {
    vec![
        "stop listening".to_string(),
        "stop recording".to_string(),
        "stop now".to_string(),
        "finish".to_string(),
        "end recording".to_string(),
    ]
}

impl Config {
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Config::default();
        }
        match fs::read_to_string(path) {
            Ok(s) => match toml::from_str(&s) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!(
                        "Warning: failed to parse {}: {}, using defaults",
                        path.display(),
                        e
                    );
                    Config::default()
                }
            },
            Err(_) => Config::default(),
        }
    }
}

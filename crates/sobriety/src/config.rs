//! Sobriety challenge configuration

use serde::{Deserialize, Serialize};

/// Words the prompt is drawn from
pub const DEFAULT_VOCABULARY: [&str; 10] = [
    "apple", "banana", "computer", "elephant", "freedom", "guitar", "hospital", "internet",
    "jacket", "kitchen",
];

/// Sobriety challenge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SobrietyConfig {
    /// Gas reading (ADC counts, 0-1023) above which a challenge starts
    pub alcohol_threshold: f64,
    /// Distinct words per prompt
    pub prompt_words: usize,
    /// Fraction of prompt words that must be heard to pass
    pub pass_ratio: f64,
    /// Ambient noise sampling before listening
    pub ambient_calibration_secs: u64,
    /// How long to wait for speech to start
    pub listen_timeout_secs: u64,
    /// Longest phrase accepted once speech starts
    pub phrase_limit_secs: u64,
    pub vocabulary: Vec<String>,
}

impl Default for SobrietyConfig {
    fn default() -> Self {
        Self {
            alcohol_threshold: 500.0,
            prompt_words: 4,
            pass_ratio: 0.75,
            ambient_calibration_secs: 1,
            listen_timeout_secs: 10,
            phrase_limit_secs: 15,
            vocabulary: DEFAULT_VOCABULARY.iter().map(|w| w.to_string()).collect(),
        }
    }
}

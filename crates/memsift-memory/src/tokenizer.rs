// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stop-word filtered keyword sets, the secondary clustering signal.
//!
//! Text is lowercased, every character that is neither a letter, a digit nor
//! whitespace acts as a separator, and the remaining words are kept when
//! they are long enough and not stop words. Output is a set: frequency is
//! discarded.

use std::collections::HashSet;
use std::path::Path;

use memsift_config::model::ClusteringConfig;
use memsift_core::MemsiftError;

/// Stop words shipped with the crate (Russian, Ukrainian, English).
pub const BUNDLED_STOP_WORDS: &str = include_str!("../data/stopwords.txt");

/// Default minimum token length in characters (tokens must be longer than 3).
pub const DEFAULT_MIN_TOKEN_CHARS: usize = 4;

/// Parse a stop-word list: one word per line, `#` starts a comment line.
pub fn parse_stop_words(content: &str) -> HashSet<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_lowercase)
        .collect()
}

/// The bundled multilingual stop-word set.
pub fn bundled_stop_words() -> HashSet<String> {
    parse_stop_words(BUNDLED_STOP_WORDS)
}

/// Lowercase `text`, turn non-alphanumeric characters into separators and
/// collapse whitespace runs into single spaces.
pub fn normalize(text: &str) -> String {
    let lowered: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Jaccard index `|A ∩ B| / |A ∪ B|`, zero if either set is empty.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Keyword extractor with an injected stop-word set.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    stop_words: HashSet<String>,
    min_chars: usize,
}

impl Tokenizer {
    pub fn new(stop_words: HashSet<String>, min_chars: usize) -> Self {
        Self {
            stop_words,
            min_chars,
        }
    }

    /// Tokenizer using the bundled stop words and default length floor.
    pub fn with_bundled_stop_words() -> Self {
        Self::new(bundled_stop_words(), DEFAULT_MIN_TOKEN_CHARS)
    }

    /// Build from clustering configuration, reading `stop_words_file` if set.
    pub fn from_config(config: &ClusteringConfig) -> Result<Self, MemsiftError> {
        let stop_words = match &config.stop_words_file {
            Some(path) => load_stop_words(Path::new(path))?,
            None => bundled_stop_words(),
        };
        Ok(Self::new(stop_words, config.min_token_chars))
    }

    pub fn stop_words(&self) -> &HashSet<String> {
        &self.stop_words
    }

    /// Extract the keyword set of `text`.
    pub fn tokenize(&self, text: &str) -> HashSet<String> {
        normalize(text)
            .split(' ')
            .filter(|token| token.chars().count() >= self.min_chars)
            .filter(|token| !self.stop_words.contains(*token))
            .map(str::to_string)
            .collect()
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::with_bundled_stop_words()
    }
}

/// Read a stop-word file from disk.
pub fn load_stop_words(path: &Path) -> Result<HashSet<String>, MemsiftError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        MemsiftError::Config(format!(
            "failed to read stop words from {}: {e}",
            path.display()
        ))
    })?;
    Ok(parse_stop_words(&content))
}

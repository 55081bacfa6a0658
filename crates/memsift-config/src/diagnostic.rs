// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Figment errors as miette diagnostics.
//!
//! Every config field has a default, so deserialization can only fail on an
//! unrecognized key or a value of the wrong type. Unknown keys get a source
//! span and a Jaro-Winkler "did you mean" hint.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use figment::error::Kind;
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Minimum Jaro-Winkler similarity for a key to be offered as a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A TOML source a config was read from: `(display name, content)`.
pub type TomlSource = (String, String);

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(code(memsift::config::unknown_key), help("{hint}"))]
    UnknownKey {
        key: String,
        suggestion: Option<String>,
        hint: String,
        #[label("not a memsift setting")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("`{key}` should be {expected}, found {found}")]
    #[diagnostic(code(memsift::config::invalid_type))]
    InvalidType {
        key: String,
        found: String,
        expected: String,
    },

    /// Semantic check failed after deserialization.
    #[error("validation error: {message}")]
    #[diagnostic(code(memsift::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(memsift::config::other))]
    Other(String),
}

impl ConfigError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ConfigError::Validation {
            message: message.into(),
        }
    }

    fn unknown_key(error: &figment::Error, key: &str, expected: &[&str], sources: &[TomlSource]) -> Self {
        let suggestion = closest_key(key, expected).map(str::to_string);
        let hint = match &suggestion {
            Some(s) => format!("did you mean `{s}`? valid keys: {}", expected.join(", ")),
            None => format!("valid keys: {}", expected.join(", ")),
        };
        let (span, src) = match locate_key(error, key, sources) {
            Some((span, src)) => (Some(span), Some(src)),
            None => (None, None),
        };
        ConfigError::UnknownKey {
            key: key.to_string(),
            suggestion,
            hint,
            span,
            src,
        }
    }
}

/// Flatten a figment error (which may carry several) into diagnostics.
pub fn figment_to_config_errors(err: figment::Error, sources: &[TomlSource]) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| match &error.kind {
            Kind::UnknownField(field, expected) => {
                ConfigError::unknown_key(&error, field, expected, sources)
            }
            Kind::InvalidType(found, expected) => ConfigError::InvalidType {
                key: dotted_path(&error),
                found: found.to_string(),
                expected: expected.clone(),
            },
            _ => ConfigError::Other(error.to_string()),
        })
        .collect()
}

fn dotted_path(error: &figment::Error) -> String {
    error.path.join(".")
}

/// Span of `key` inside the TOML source the error came from.
fn locate_key(
    error: &figment::Error,
    key: &str,
    sources: &[TomlSource],
) -> Option<(SourceSpan, NamedSource<String>)> {
    let file = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let (name, content) = match file {
        Some(path) => sources.iter().find(|(name, _)| *name == path)?,
        // Inline strings carry no file metadata.
        None if sources.len() == 1 => sources.first()?,
        None => return None,
    };

    let offset = find_key_offset(content, error.path.first().map(String::as_str), key)?;
    Some((
        SourceSpan::new(offset.into(), key.len()),
        NamedSource::new(name, content.clone()),
    ))
}

/// Byte offset of `key` as an assignment, searched after the `[section]`
/// header when one is given.
pub fn find_key_offset(content: &str, section: Option<&str>, key: &str) -> Option<usize> {
    let start = match section {
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header)? + header.len()
        }
        None => 0,
    };

    let mut line_start = start;
    for line in content[start..].split_inclusive('\n') {
        let indent = line.len() - line.trim_start().len();
        let rest = &line[indent..];
        let is_assignment = rest
            .strip_prefix(key)
            .is_some_and(|after| after.trim_start().starts_with('='));
        if is_assignment {
            return Some(line_start + indent);
        }
        line_start += line.len();
    }
    None
}

/// Best candidate above the similarity threshold.
pub fn closest_key<'a>(unknown: &str, candidates: &[&'a str]) -> Option<&'a str> {
    candidates
        .iter()
        .map(|&key| (key, strsim::jaro_winkler(unknown, key)))
        .filter(|(_, score)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(key, _)| key)
}

/// Print diagnostics to stderr with miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = miette::GraphicalReportHandler::new();
    for error in errors {
        let mut rendered = String::new();
        match handler.render_report(&mut rendered, error as &dyn Diagnostic) {
            Ok(()) => eprint!("{rendered}"),
            Err(_) => eprintln!("Error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_key_catches_typo() {
        let keys = [
            "min_cluster_size",
            "max_cluster_size",
            "similarity_threshold",
            "keyword_boost",
        ];
        assert_eq!(
            closest_key("similarity_treshold", &keys),
            Some("similarity_threshold")
        );
        assert_eq!(closest_key("zzzzzz", &["top_k", "min_age_days"]), None);
    }

    #[test]
    fn key_offset_within_section() {
        let content = "[general]\nlog_level = \"info\"\n\n[clustering]\ntreshold = 0.5\n";
        let o = find_key_offset(content, Some("clustering"), "treshold").unwrap();
        assert_eq!(&content[o..o + 8], "treshold");
    }

    #[test]
    fn key_offset_skips_prefix_matches_and_handles_crlf() {
        let content = "[retrieval]\r\n  top_k_extra = 1\r\n  top_k = 3\r\n";
        let o = find_key_offset(content, Some("retrieval"), "top_k").unwrap();
        assert_eq!(&content[o..o + 9], "top_k = 3");
    }

    #[test]
    fn key_offset_needs_the_section() {
        let content = "[general]\nlog_level = \"info\"\n";
        assert!(find_key_offset(content, Some("storage"), "wal_mode").is_none());
    }

    #[test]
    fn unknown_key_hint_lists_valid_keys() {
        let errors = crate::load_and_validate_str("[retrieval]\ntopk = 3\n").unwrap_err();
        match &errors[0] {
            ConfigError::UnknownKey {
                suggestion, hint, ..
            } => {
                assert_eq!(suggestion.as_deref(), Some("top_k"));
                assert!(hint.contains("min_age_days"), "{hint}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

// SPDX-FileCopyrightText: 2026 Memsift Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as ordered size ranges and bounded thresholds.

use crate::diagnostic::ConfigError;
use crate::model::MemsiftConfig;

/// Log levels accepted by `general.log_level`.
pub const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &MemsiftConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let level = config.general.log_level.trim().to_ascii_lowercase();
    if !LOG_LEVELS.contains(&level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "general.log_level `{}` is not one of {}",
            config.general.log_level,
            LOG_LEVELS.join(", ")
        )));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    let clustering = &config.clustering;
    if clustering.min_cluster_size < 1 {
        errors.push(ConfigError::validation(
            "clustering.min_cluster_size must be at least 1",
        ));
    }

    if clustering.min_cluster_size > clustering.max_cluster_size {
        errors.push(ConfigError::validation(format!(
            "clustering.min_cluster_size ({}) must not exceed clustering.max_cluster_size ({})",
            clustering.min_cluster_size, clustering.max_cluster_size
        )));
    }

    if !(0.0..=1.0).contains(&clustering.similarity_threshold) {
        errors.push(ConfigError::validation(format!(
            "clustering.similarity_threshold must be within 0.0..=1.0, got {}",
            clustering.similarity_threshold
        )));
    }

    if !clustering.keyword_boost.is_finite() || clustering.keyword_boost < 0.0 {
        errors.push(ConfigError::validation(format!(
            "clustering.keyword_boost must be a non-negative number, got {}",
            clustering.keyword_boost
        )));
    }

    if clustering.min_token_chars < 1 {
        errors.push(ConfigError::validation(
            "clustering.min_token_chars must be at least 1",
        ));
    }

    if let Some(path) = &clustering.stop_words_file
        && path.trim().is_empty()
    {
        errors.push(ConfigError::validation(
            "clustering.stop_words_file must not be empty when set",
        ));
    }

    if config.retrieval.top_k < 1 {
        errors.push(ConfigError::validation("retrieval.top_k must be at least 1"));
    }

    if config.retrieval.min_age_days < 0 {
        errors.push(ConfigError::validation(format!(
            "retrieval.min_age_days must be non-negative, got {}",
            config.retrieval.min_age_days
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = MemsiftConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn inverted_size_range_fails_validation() {
        let mut config = MemsiftConfig::default();
        config.clustering.min_cluster_size = 12;
        config.clustering.max_cluster_size = 4;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "must not exceed"));
    }

    #[test]
    fn out_of_range_threshold_fails_validation() {
        let mut config = MemsiftConfig::default();
        config.clustering.similarity_threshold = 1.5;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "similarity_threshold"));
    }

    #[test]
    fn boundary_thresholds_are_valid() {
        let mut config = MemsiftConfig::default();
        config.clustering.similarity_threshold = 0.0;
        assert!(validate_config(&config).is_ok());
        config.clustering.similarity_threshold = 1.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn errors_are_collected_not_fail_fast() {
        let mut config = MemsiftConfig::default();
        config.general.log_level = "loud".to_string();
        config.storage.database_path = " ".to_string();
        config.retrieval.top_k = 0;
        config.clustering.keyword_boost = -0.1;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(has_message(&errors, "log_level"));
        assert!(has_message(&errors, "database_path"));
        assert!(has_message(&errors, "top_k"));
        assert!(has_message(&errors, "keyword_boost"));
    }

    #[test]
    fn zero_min_size_fails_validation() {
        let mut config = MemsiftConfig::default();
        config.clustering.min_cluster_size = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "min_cluster_size must be at least 1"));
    }

    #[test]
    fn negative_min_age_fails_validation() {
        let mut config = MemsiftConfig::default();
        config.retrieval.min_age_days = -3;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "min_age_days"));
    }
}

use crate::error::{Result, RetrievalError};
use crate::language::DEFAULT_LANGUAGE_THRESHOLD;
use crate::snippet::SnippetConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_K: usize = 3;
pub const MAX_K: usize = 100;
pub const ALLOWED_FILE_EXTENSION: &str = ".txt";

pub const ENV_DEFAULT_K: &str = "DOCQA_DEFAULT_K";
pub const ENV_MAX_K: &str = "DOCQA_MAX_K";
pub const ENV_SNIPPET_MAX_CHARS: &str = "DOCQA_SNIPPET_MAX_CHARS";
pub const ENV_SNIPPET_WORD_BOUNDARY: &str = "DOCQA_SNIPPET_WORD_BOUNDARY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub default_k: usize,
    pub max_k: usize,
    pub snippet: SnippetConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_k: DEFAULT_K,
            max_k: MAX_K,
            snippet: SnippetConfig::default(),
        }
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_k == 0 {
            return Err(RetrievalError::InvalidConfig(
                "max_k must be at least 1".to_string(),
            ));
        }
        if self.default_k == 0 || self.default_k > self.max_k {
            return Err(RetrievalError::InvalidConfig(format!(
                "default_k must be between 1 and max_k ({}), got {}",
                self.max_k, self.default_k
            )));
        }
        if self.snippet.max_chars == 0 {
            return Err(RetrievalError::InvalidConfig(
                "snippet.max_chars must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.snippet.word_boundary_threshold) {
            return Err(RetrievalError::InvalidConfig(format!(
                "snippet.word_boundary_threshold must be in [0, 1], got {}",
                self.snippet.word_boundary_threshold
            )));
        }
        Ok(())
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup(ENV_DEFAULT_K) {
            self.default_k = parse_env(ENV_DEFAULT_K, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_K) {
            self.max_k = parse_env(ENV_MAX_K, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SNIPPET_MAX_CHARS) {
            self.snippet.max_chars = parse_env(ENV_SNIPPET_MAX_CHARS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SNIPPET_WORD_BOUNDARY) {
            self.snippet.word_boundary_threshold = parse_env(ENV_SNIPPET_WORD_BOUNDARY, &raw)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Required file name suffix, matched case-sensitively
    pub allowed_extension: String,
    pub language_threshold: f32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            allowed_extension: ALLOWED_FILE_EXTENSION.to_string(),
            language_threshold: DEFAULT_LANGUAGE_THRESHOLD,
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| RetrievalError::InvalidConfig(format!("{key}: cannot parse '{raw}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_valid() {
        let config = RetrievalConfig::default();
        assert_eq!(config.default_k, 3);
        assert_eq!(config.max_k, 100);
        assert_eq!(config.snippet.max_chars, 160);
        assert!(config.validate().is_ok());
        assert_eq!(IngestConfig::default().allowed_extension, ".txt");
    }

    #[test]
    fn overrides_are_parsed_then_validated() {
        let mut config = RetrievalConfig::default();
        config
            .apply_overrides(|key| match key {
                ENV_MAX_K => Some("10".to_string()),
                ENV_SNIPPET_WORD_BOUNDARY => Some("0.5".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.max_k, 10);
        assert!((config.snippet.word_boundary_threshold - 0.5).abs() < f32::EPSILON);

        config.default_k = 11;
        assert!(config.validate().is_err());

        let err = config
            .apply_overrides(|key| (key == ENV_DEFAULT_K).then(|| "three".to_string()))
            .unwrap_err();
        assert!(matches!(err, RetrievalError::InvalidConfig(_)));
    }
}
